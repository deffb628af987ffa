//! Custom-field value extraction
//!
//! Jira stores custom-field values in wildly different shapes depending on
//! the field type: bare scalars, `{"value": ...}` wrappers, arrays of
//! either. This module shapes them into plain export values. User-picker
//! fields are the exception — their values are identities and are resolved
//! by the mapper through the identity resolver instead.

use crate::adapters::jira::models::FieldSchema;
use serde_json::Value;
use std::collections::HashMap;

pub const TYPE_DATETIME: &str = "com.atlassian.jira.plugin.system.customfieldtypes:datetime";
pub const TYPE_USERPICKER: &str = "com.atlassian.jira.plugin.system.customfieldtypes:userpicker";
pub const TYPE_MULTIUSERPICKER: &str =
    "com.atlassian.jira.plugin.system.customfieldtypes:multiuserpicker";

/// Custom-field types carried over into the export.
pub const ALLOWED_CUSTOM_FIELD_TYPES: &[&str] = &[
    "com.atlassian.jira.plugin.system.customfieldtypes:textfield",
    "com.atlassian.jira.plugin.system.customfieldtypes:textarea",
    "com.atlassian.jira.plugin.system.customfieldtypes:datepicker",
    TYPE_DATETIME,
    "com.atlassian.jira.plugin.system.customfieldtypes:float",
    "com.atlassian.jira.plugin.system.customfieldtypes:select",
    "com.atlassian.jira.plugin.system.customfieldtypes:radiobuttons",
    "com.atlassian.jira.plugin.system.customfieldtypes:project",
    "com.atlassian.jira.plugin.system.customfieldtypes:multiversion",
    "com.atlassian.jira.plugin.system.customfieldtypes:version",
    TYPE_USERPICKER,
    "com.atlassian.jira.plugin.system.customfieldtypes:url",
    "com.atlassian.jira.plugin.system.customfieldtypes:multiselect",
    "com.atlassian.jira.plugin.system.customfieldtypes:multicheckboxes",
    TYPE_MULTIUSERPICKER,
    "com.atlassian.jira.plugin.system.customfieldtypes:multigrouppicker",
    "com.atlassian.jira.plugin.system.customfieldtypes:grouppicker",
    "com.atlassian.jira.plugin.system.customfieldtypes:cascadingselect",
    "com.atlassian.jira.plugin.system.customfieldtypes:readonlyfield",
    "com.atlassian.jira.plugin.system.customfieldtypes:labels",
    "com.pyxis.greenhopper.jira:gh-sprint",
];

/// Name and type of one exportable custom field.
#[derive(Debug, Clone)]
pub struct CustomFieldInfo {
    pub name: String,
    pub field_type: String,
}

/// Filter the field-schema listing down to exportable custom fields,
/// keyed by field id (`customfield_NNNNN`).
pub fn allowed_custom_fields(fields: &[FieldSchema]) -> HashMap<String, CustomFieldInfo> {
    fields
        .iter()
        .filter_map(|field| {
            let custom = field.schema.as_ref()?.custom.as_deref()?;
            if !ALLOWED_CUSTOM_FIELD_TYPES.contains(&custom) {
                return None;
            }
            Some((
                field.id.clone(),
                CustomFieldInfo {
                    name: field.name.clone(),
                    field_type: custom.to_string(),
                },
            ))
        })
        .collect()
}

/// Shape a raw custom-field value for export.
///
/// `{"value": x}` objects unwrap to `x`; arrays unwrap element-wise;
/// datetime values are reformatted. User-picker types must not be passed
/// here — the mapper resolves those.
pub fn extract_value(raw: &Value, field_type: &str) -> Value {
    let value = unwrap_value(raw);

    if field_type == TYPE_DATETIME {
        if let Value::String(s) = &value {
            return Value::String(format_datetime(s));
        }
    }

    value
}

/// Unwrap Jira's option wrappers without touching scalars.
fn unwrap_value(raw: &Value) -> Value {
    match raw {
        Value::Object(map) => map.get("value").cloned().unwrap_or_else(|| raw.clone()),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| match item {
                    Value::Object(map) => {
                        map.get("value").cloned().unwrap_or_else(|| item.clone())
                    }
                    other => other.clone(),
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Reformat a Jira timestamp ("2024-01-15T10:30:00.000+0000") into the
/// import format's "15/Jan/24 10:30 AM". Unparsable input passes through
/// unchanged.
pub fn format_datetime(value: &str) -> String {
    match chrono::DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.3f%z") {
        Ok(parsed) => parsed.format("%d/%b/%y %I:%M %p").to_string(),
        Err(e) => {
            tracing::error!(value, error = %e, "Error formatting date");
            value.to_string()
        }
    }
}

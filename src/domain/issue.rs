//! Mapped issue model
//!
//! This module defines the normalized export shape of a single issue, as it
//! appears inside an output bundle. Field names follow the bulk-import JSON
//! format, hence the camelCase renames.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One exported issue in the bulk-import format.
///
/// A `MappedIssue` is created exactly once per issue key during a run. It is
/// mutated only by the mapping call that creates it; afterwards it is
/// immutable and owned by the dispatcher until handed to the batch writer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MappedIssue {
    /// Natural key in the source system (e.g. "PROJ-42")
    pub key: String,

    /// Sequential identifier assigned by the pipeline, stringified for the
    /// import format. Link edges reference these identifiers.
    pub external_id: String,

    pub priority: Option<String>,

    #[serde(default)]
    pub description: String,

    pub status: String,

    pub reporter: String,

    #[serde(default)]
    pub labels: Vec<String>,

    pub issue_type: String,

    pub resolution: Option<String>,

    pub created: Option<String>,

    pub updated: Option<String>,

    #[serde(rename = "resolutiondate")]
    pub resolution_date: Option<String>,

    #[serde(rename = "duedate")]
    pub due_date: Option<String>,

    #[serde(default)]
    pub affected_versions: Vec<String>,

    #[serde(default)]
    pub summary: String,

    pub assignee: String,

    #[serde(default)]
    pub fixed_versions: Vec<String>,

    #[serde(default)]
    pub components: Vec<String>,

    #[serde(default)]
    pub custom_field_values: Vec<CustomFieldValue>,

    #[serde(default)]
    pub attachments: Vec<MappedAttachment>,

    #[serde(default)]
    pub comments: Vec<MappedComment>,

    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

/// A single custom-field entry on an exported issue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomFieldValue {
    pub field_name: String,
    pub field_type: String,
    pub value: Value,
}

/// An attachment reference with its author identity resolved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MappedAttachment {
    pub name: String,
    pub attacher: String,
    pub created: Option<String>,
    pub uri: String,
    #[serde(default)]
    pub description: String,
}

/// A comment with its author identity resolved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MappedComment {
    pub body: String,
    pub author: String,
    pub created: Option<String>,
}

/// One changelog history entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub author: String,
    pub created: Option<String>,
    pub items: Vec<HistoryItem>,
}

/// One changed field inside a history entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub field_type: Option<String>,
    pub field: Option<String>,
    #[serde(rename = "from")]
    pub from_value: Option<String>,
    pub from_string: Option<String>,
    #[serde(rename = "to")]
    pub to_value: Option<String>,
    pub to_string: Option<String>,
}

//! Serde models for the Jira REST API
//!
//! These are read-only views over the payloads the exporter consumes. Only
//! the fields the pipeline touches are typed; everything else on an issue
//! lands in the flattened `custom` map (which is also where the
//! `customfield_*` entries come from).

use serde::Deserialize;
use serde_json::{Map, Value};

/// Any `{"name": ...}` entity (status, priority, version, component, ...)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct NamedEntity {
    #[serde(default)]
    pub name: String,
}

/// A user reference as it appears on issues, comments and changelogs.
///
/// Cloud identifies users by `accountId`; Data Center by `name`.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email_address: Option<String>,
}

/// A user payload returned with `expand=groups`
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserWithGroups {
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub groups: GroupPage,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct GroupPage {
    #[serde(default)]
    pub items: Vec<NamedEntity>,
}

/// One raw issue as fetched from the server
#[derive(Debug, Clone, Deserialize)]
pub struct RawIssue {
    pub key: String,
    #[serde(default)]
    pub fields: RawFields,
    #[serde(default)]
    pub changelog: Option<RawChangelog>,
}

/// The `fields` object of a raw issue.
///
/// `custom` absorbs every key not typed here, including all `customfield_*`
/// entries the custom-field extraction iterates over.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawFields {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<NamedEntity>,
    #[serde(default)]
    pub priority: Option<NamedEntity>,
    #[serde(default)]
    pub resolution: Option<NamedEntity>,
    #[serde(default, rename = "issuetype")]
    pub issue_type: Option<NamedEntity>,
    #[serde(default)]
    pub reporter: Option<UserRef>,
    #[serde(default)]
    pub assignee: Option<UserRef>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(default, rename = "resolutiondate")]
    pub resolution_date: Option<String>,
    #[serde(default, rename = "duedate")]
    pub due_date: Option<String>,
    #[serde(default)]
    pub versions: Vec<NamedEntity>,
    #[serde(default, rename = "fixVersions")]
    pub fix_versions: Vec<NamedEntity>,
    #[serde(default)]
    pub components: Vec<NamedEntity>,
    #[serde(default)]
    pub attachment: Vec<RawAttachment>,
    #[serde(default)]
    pub comment: Option<RawCommentPage>,
    #[serde(default, rename = "issuelinks")]
    pub issue_links: Vec<RawIssueLink>,
    #[serde(flatten)]
    pub custom: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAttachment {
    pub filename: String,
    #[serde(default)]
    pub author: Option<UserRef>,
    #[serde(default)]
    pub created: Option<String>,
    /// Download URI
    pub content: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawCommentPage {
    #[serde(default)]
    pub comments: Vec<RawComment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawComment {
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub author: Option<UserRef>,
    #[serde(default)]
    pub created: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawChangelog {
    #[serde(default)]
    pub histories: Vec<RawHistory>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawHistory {
    #[serde(default)]
    pub author: Option<UserRef>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub items: Vec<RawHistoryItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawHistoryItem {
    #[serde(default, rename = "fieldtype")]
    pub field_type: Option<String>,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default, rename = "from")]
    pub from_value: Option<String>,
    #[serde(default, rename = "fromString")]
    pub from_string: Option<String>,
    #[serde(default, rename = "to")]
    pub to_value: Option<String>,
    #[serde(default, rename = "toString")]
    pub to_string: Option<String>,
}

/// A link descriptor on a raw issue. Exactly one of `inward_issue` /
/// `outward_issue` is present for a well-formed descriptor.
#[derive(Debug, Clone, Deserialize)]
pub struct RawIssueLink {
    #[serde(rename = "type")]
    pub link_type: NamedEntity,
    #[serde(default, rename = "inwardIssue")]
    pub inward_issue: Option<LinkedIssueRef>,
    #[serde(default, rename = "outwardIssue")]
    pub outward_issue: Option<LinkedIssueRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinkedIssueRef {
    pub key: String,
}

/// One page of a JQL search result
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    #[serde(default)]
    pub issues: Vec<SearchHit>,
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub start_at: usize,
    #[serde(default)]
    pub max_results: usize,
}

/// A search hit; only the key is needed, the full issue is fetched separately
#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    pub key: String,
}

/// One entry of the field-schema listing (`/rest/api/2/field`)
#[derive(Debug, Clone, Deserialize)]
pub struct FieldSchema {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub schema: Option<FieldSchemaType>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct FieldSchemaType {
    #[serde(default)]
    pub custom: Option<String>,
}

/// Project metadata as embedded into every output bundle
#[derive(Debug, Clone, serde::Serialize, Deserialize, PartialEq)]
pub struct ProjectDetails {
    pub name: String,
    pub key: String,
    #[serde(default)]
    pub versions: Vec<ProjectVersion>,
    #[serde(default)]
    pub components: Vec<String>,
}

#[derive(Debug, Clone, serde::Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectVersion {
    pub name: String,
    #[serde(default)]
    pub released: bool,
    pub release_date: Option<String>,
}

/// Raw project payload, mapped into [`ProjectDetails`] by the client
#[derive(Debug, Clone, Deserialize)]
pub struct RawProject {
    pub name: String,
    pub key: String,
    #[serde(default)]
    pub versions: Vec<RawVersion>,
    #[serde(default)]
    pub components: Vec<NamedEntity>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawVersion {
    pub name: String,
    #[serde(default)]
    pub released: bool,
    #[serde(default)]
    pub release_date: Option<String>,
}

impl From<RawProject> for ProjectDetails {
    fn from(raw: RawProject) -> Self {
        ProjectDetails {
            name: raw.name,
            key: raw.key,
            versions: raw
                .versions
                .into_iter()
                .map(|v| ProjectVersion {
                    name: v.name,
                    released: v.released,
                    release_date: v.release_date,
                })
                .collect(),
            components: raw.components.into_iter().map(|c| c.name).collect(),
        }
    }
}

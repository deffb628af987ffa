//! Issue mapping
//!
//! Transforms one raw issue into its export shape: normalized core fields,
//! custom fields, attachments, comments and history with resolved author
//! identities, plus link resolution. Link targets without an identifier are
//! fetched and mapped from here, recursively, which is how the export pulls
//! in every issue reachable through links even when it was not part of the
//! original search result.

use crate::adapters::jira::models::{RawFields, RawIssue, UserRef};
use crate::adapters::jira::JiraClient;
use crate::core::export::context::{Claim, ExportContext};
use crate::core::fields::{self, CustomFieldInfo};
use crate::core::identity::IdentityResolver;
use crate::domain::{
    CustomFieldValue, HistoryEntry, HistoryItem, LinkDirection, MappedAttachment, MappedComment,
    MappedIssue, Result,
};
use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// What a mapping call did with an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapOutcome {
    /// A MappedIssue was produced and finalized
    Mapped,
    /// The key was already processed or is being mapped elsewhere
    Skipped,
}

pub struct IssueMapper {
    client: Arc<JiraClient>,
    identity: Arc<IdentityResolver>,
    ctx: Arc<ExportContext>,
    custom_fields: HashMap<String, CustomFieldInfo>,
}

impl IssueMapper {
    pub fn new(
        client: Arc<JiraClient>,
        identity: Arc<IdentityResolver>,
        ctx: Arc<ExportContext>,
        custom_fields: HashMap<String, CustomFieldInfo>,
    ) -> Self {
        Self {
            client,
            identity,
            ctx,
            custom_fields,
        }
    }

    /// Map one raw issue, unless its key was already claimed or finalized.
    ///
    /// Exactly one `MappedIssue` is ever produced per key across the
    /// lifetime of the processed log, including across process restarts.
    pub async fn map_issue(&self, raw: &RawIssue) -> Result<MapOutcome> {
        let key = raw.key.as_str();

        let issue_id = match self.ctx.begin(key) {
            Claim::AlreadyProcessed => {
                tracing::debug!(issue_key = key, "Issue already processed, skipping");
                return Ok(MapOutcome::Skipped);
            }
            Claim::InProgress => {
                tracing::debug!(issue_key = key, "Issue already in progress, skipping");
                return Ok(MapOutcome::Skipped);
            }
            Claim::Claimed(id) => id,
        };

        match self.build_mapped(raw, issue_id).await {
            Ok(mapped) => {
                self.ctx.finish(key, mapped)?;
                tracing::info!(issue_key = key, issue_id = issue_id, "Mapped issue");
                Ok(MapOutcome::Mapped)
            }
            Err(e) => {
                self.ctx.abandon(key);
                Err(e)
            }
        }
    }

    async fn build_mapped(&self, raw: &RawIssue, issue_id: u64) -> Result<MappedIssue> {
        let fields = &raw.fields;

        let mut mapped = MappedIssue {
            key: raw.key.clone(),
            external_id: issue_id.to_string(),
            priority: fields.priority.as_ref().map(|p| p.name.clone()),
            description: fields.description.clone().unwrap_or_default(),
            status: fields
                .status
                .as_ref()
                .map(|s| s.name.clone())
                .unwrap_or_default(),
            reporter: self.identity.resolve_author(fields.reporter.as_ref()).await,
            labels: fields.labels.clone(),
            issue_type: fields
                .issue_type
                .as_ref()
                .map(|t| t.name.clone())
                .unwrap_or_default(),
            resolution: fields.resolution.as_ref().map(|r| r.name.clone()),
            created: fields.created.clone(),
            updated: fields.updated.clone(),
            resolution_date: fields.resolution_date.clone(),
            due_date: fields.due_date.clone(),
            affected_versions: fields.versions.iter().map(|v| v.name.clone()).collect(),
            summary: fields.summary.clone().unwrap_or_default(),
            assignee: self.identity.resolve_author(fields.assignee.as_ref()).await,
            fixed_versions: fields.fix_versions.iter().map(|v| v.name.clone()).collect(),
            components: fields.components.iter().map(|c| c.name.clone()).collect(),
            custom_field_values: Vec::new(),
            attachments: Vec::new(),
            comments: Vec::new(),
            history: Vec::new(),
        };

        self.collect_custom_fields(fields, &mut mapped).await;
        self.resolve_links(raw, issue_id).await;

        for attachment in &fields.attachment {
            mapped.attachments.push(MappedAttachment {
                name: attachment.filename.clone(),
                attacher: self.identity.resolve_author(attachment.author.as_ref()).await,
                created: attachment.created.clone(),
                uri: attachment.content.clone(),
                description: attachment.description.clone().unwrap_or_default(),
            });
        }

        if let Some(page) = &fields.comment {
            for comment in &page.comments {
                mapped.comments.push(MappedComment {
                    body: comment.body.clone(),
                    author: self.identity.resolve_author(comment.author.as_ref()).await,
                    created: comment.created.clone(),
                });
            }
        }

        if let Some(changelog) = &raw.changelog {
            for history in &changelog.histories {
                mapped.history.push(HistoryEntry {
                    author: self.identity.resolve_author(history.author.as_ref()).await,
                    created: history.created.clone(),
                    items: history
                        .items
                        .iter()
                        .map(|item| HistoryItem {
                            field_type: item.field_type.clone(),
                            field: item.field.clone(),
                            from_value: item.from_value.clone(),
                            from_string: item.from_string.clone(),
                            to_value: item.to_value.clone(),
                            to_string: item.to_string.clone(),
                        })
                        .collect(),
                });
            }
        }

        Ok(mapped)
    }

    /// Extract exportable custom-field values. User-picker values carry
    /// identities and go through the identity resolver; everything else is
    /// shaped by the field-type rules.
    async fn collect_custom_fields(&self, fields: &RawFields, mapped: &mut MappedIssue) {
        for (field_id, raw_value) in &fields.custom {
            if !field_id.starts_with("customfield_") || raw_value.is_null() {
                continue;
            }
            let Some(info) = self.custom_fields.get(field_id) else {
                continue;
            };

            let value = match info.field_type.as_str() {
                fields::TYPE_USERPICKER => self.resolve_user_value(raw_value).await,
                fields::TYPE_MULTIUSERPICKER => {
                    let mut resolved = Vec::new();
                    if let Value::Array(items) = raw_value {
                        for item in items {
                            if item.is_object() {
                                resolved.push(self.resolve_user_value(item).await);
                            }
                        }
                    }
                    Value::Array(resolved)
                }
                other => fields::extract_value(raw_value, other),
            };

            mapped.custom_field_values.push(CustomFieldValue {
                field_name: info.name.clone(),
                field_type: info.field_type.clone(),
                value,
            });
        }
    }

    /// Resolve a user-picker value: either a user object, or a bare string
    /// treated as an email address.
    async fn resolve_user_value(&self, raw: &Value) -> Value {
        let user = match raw {
            Value::Object(_) => serde_json::from_value::<UserRef>(raw.clone()).ok(),
            Value::String(s) => Some(UserRef {
                account_id: None,
                name: None,
                email_address: Some(s.clone()),
            }),
            _ => None,
        };
        Value::String(self.identity.resolve_author(user.as_ref()).await)
    }

    /// Resolve every link descriptor on the issue.
    ///
    /// Targets without an assigned identifier are fetched and mapped first,
    /// so a single mapping call transitively finalizes its whole reachable
    /// link chain. Cycles terminate because a revisited key claims as
    /// in-progress and skips; already-finalized keys keep their identifier.
    async fn resolve_links(&self, raw: &RawIssue, issue_id: u64) {
        for link in &raw.fields.issue_links {
            let (linked_key, direction) = match (&link.inward_issue, &link.outward_issue) {
                (Some(inward), _) => (inward.key.as_str(), LinkDirection::Inward),
                (None, Some(outward)) => (outward.key.as_str(), LinkDirection::Outward),
                (None, None) => continue,
            };

            if self.ctx.assigned_id(linked_key).is_none() {
                match self.client.fetch_issue(linked_key, Some("changelog")).await {
                    Ok(linked) => {
                        if let Err(e) = self.map_linked(&linked).await {
                            tracing::warn!(
                                issue_key = linked_key,
                                error = %e,
                                "Failed to map linked issue"
                            );
                        }
                    }
                    Err(e) => {
                        tracing::warn!(
                            issue_key = linked_key,
                            error = %e,
                            "Failed to fetch linked issue"
                        );
                    }
                }
            }

            match self.ctx.assigned_id(linked_key) {
                Some(linked_id) => {
                    if self
                        .ctx
                        .record_link(&link.link_type.name, issue_id, linked_id, direction)
                    {
                        tracing::debug!(
                            link_type = %link.link_type.name,
                            source = issue_id,
                            destination = linked_id,
                            "Recorded link edge"
                        );
                    }
                }
                None => {
                    tracing::warn!(
                        issue_key = linked_key,
                        "Link target could not be resolved, dropping edge"
                    );
                }
            }
        }
    }

    /// Recursion seam: boxing keeps the future size finite and puts link
    /// chain depth on the heap instead of the stack.
    fn map_linked<'a>(&'a self, raw: &'a RawIssue) -> BoxFuture<'a, Result<MapOutcome>> {
        Box::pin(self.map_issue(raw))
    }
}

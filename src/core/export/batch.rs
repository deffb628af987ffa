//! Size-bounded batch assembly
//!
//! Mapped issues are partitioned into bundles whose serialized size targets
//! `max_batch_bytes`. Packing is greedy and single-pass: the envelope
//! (project metadata plus the full link list, which every bundle carries)
//! counts toward the budget, then issues accumulate until the next one
//! would overflow. The bound is soft — a bundle never splits an issue, and
//! the shared link list is not partitioned.

use crate::adapters::jira::models::ProjectDetails;
use crate::domain::{LinkEdge, MappedIssue, Result};
use serde::{Deserialize, Serialize};

/// One self-describing output bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub projects: Vec<ProjectDetails>,
    pub issues: Vec<MappedIssue>,
    pub links: Vec<LinkEdge>,
}

/// Serialized JSON size of a value, in bytes.
pub fn serialized_size<T: Serialize>(value: &T) -> Result<usize> {
    Ok(serde_json::to_vec(value)?.len())
}

/// File name of one bundle, encoding project key and 1-based batch index.
pub fn bundle_file_name(project_key: &str, index: usize) -> String {
    format!("jira_export_{project_key}_batch_{index}.json")
}

/// Partition mapped issues into size-bounded bundles.
///
/// Returns no batches for an empty issue set. Every batch repeats the
/// project metadata and the complete link list.
pub fn split_into_batches(
    issues: &[MappedIssue],
    project: &ProjectDetails,
    links: &[LinkEdge],
    max_bytes: usize,
) -> Result<Vec<Batch>> {
    if issues.is_empty() {
        return Ok(Vec::new());
    }

    let make_batch = |issues: Vec<MappedIssue>| Batch {
        projects: vec![project.clone()],
        issues,
        links: links.to_vec(),
    };

    let envelope_size = serialized_size(&make_batch(Vec::new()))?;

    let mut batches = Vec::new();
    let mut current: Vec<MappedIssue> = Vec::new();
    let mut current_size = 0usize;

    for issue in issues {
        let issue_size = serialized_size(issue)?;
        if !current.is_empty() && envelope_size + current_size + issue_size > max_bytes {
            batches.push(make_batch(std::mem::take(&mut current)));
            current_size = 0;
        }
        current.push(issue.clone());
        current_size += issue_size;
    }

    if !current.is_empty() {
        batches.push(make_batch(current));
    }

    tracing::info!(
        issues = issues.len(),
        batches = batches.len(),
        max_bytes = max_bytes,
        "Split issues into batches"
    );

    Ok(batches)
}

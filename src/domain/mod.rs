//! Domain models and types for Porter.
//!
//! This module contains the core domain models shared across the pipeline:
//!
//! - **Export entities** ([`MappedIssue`], [`LinkEdge`])
//! - **Error types** ([`PorterError`], [`JiraError`])
//! - **Result type alias** ([`Result`])
//!
//! All fallible operations in the crate return [`Result<T>`], and errors are
//! converted with the `?` operator.

pub mod errors;
pub mod issue;
pub mod link;
pub mod result;

// Re-export commonly used types for convenience
pub use errors::{JiraError, PorterError};
pub use issue::{CustomFieldValue, HistoryEntry, HistoryItem, MappedAttachment, MappedComment, MappedIssue};
pub use link::{LinkDirection, LinkEdge};
pub use result::Result;

//! External system adapters
//!
//! Integrations with systems outside the export pipeline.

pub mod jira;

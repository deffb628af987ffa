//! Jira REST adapter
//!
//! Client and payload models for the source tracking system.

pub mod client;
pub mod models;

pub use client::JiraClient;

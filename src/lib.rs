// Porter - Jira project export tool
// Copyright (c) 2025 Porter Contributors
// Licensed under the MIT License

//! # Porter - Jira project export
//!
//! Porter exports a Jira project - issues, links, attachments metadata,
//! comments and change history - into self-contained JSON bundles suitable
//! for bulk import into another tracker.
//!
//! ## Overview
//!
//! The export pipeline is:
//! - **Incremental and resumable**: a durable processed-issue log means an
//!   interrupted run picks up where it stopped when re-invoked.
//! - **Transitive**: issues reachable through links are pulled into the
//!   export even when the project search did not return them, and every
//!   link becomes exactly one deduplicated edge between the sequential
//!   identifiers Porter assigns.
//! - **Anonymizing**: author identities are replaced with a placeholder
//!   account unless the user belongs to a configured exemption group, with
//!   durable caches so repeated runs don't re-query the server.
//! - **Size-bounded**: output is split into bundles targeting a configurable
//!   serialized size (7 MiB by default).
//!
//! ## Architecture
//!
//! Porter follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (export pipeline, identity, state)
//! - [`adapters`] - External integrations (Jira REST)
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use porter::config::load_config;
//! use porter::core::export::ExportCoordinator;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("porter.toml")?;
//!     let coordinator = ExportCoordinator::new(config)?;
//!     let summary = coordinator.execute_export().await?;
//!
//!     println!("Mapped {} issues into {} bundles", summary.mapped_issues, summary.batches_written);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;

//! Export pipeline
//!
//! The dispatcher, mapper, shared context, batch writer and summary types.

pub mod batch;
pub mod context;
pub mod coordinator;
pub mod mapper;
pub mod summary;

pub use batch::{split_into_batches, Batch};
pub use context::{Claim, ExportContext};
pub use coordinator::ExportCoordinator;
pub use mapper::{IssueMapper, MapOutcome};
pub use summary::ExportSummary;

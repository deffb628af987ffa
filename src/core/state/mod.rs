//! Durable run state
//!
//! The pipeline's only cross-run state: the processed-issue log and the
//! identity cache files. These are what make an interrupted export safe to
//! re-invoke.

pub mod cache;
pub mod processed;

pub use cache::CacheFile;
pub use processed::ProcessedLog;

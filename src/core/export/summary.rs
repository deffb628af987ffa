//! Export summary and reporting
//!
//! Structures for tracking and reporting export results.

use std::time::Duration;

/// Categories of errors recorded during an export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportErrorType {
    /// Configuration problems
    Configuration,
    /// Remote-call failures the pipeline degraded around
    Remote,
    /// A single issue failed to map
    Mapping,
    /// Bundle or state file write failures
    Storage,
    /// Anything else
    Unknown,
}

/// One recorded error with optional context
#[derive(Debug, Clone)]
pub struct ExportError {
    pub error_type: ExportErrorType,
    pub message: String,
    pub context: Option<String>,
}

impl ExportError {
    pub fn new(error_type: ExportErrorType, message: impl Into<String>) -> Self {
        Self {
            error_type,
            message: message.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Summary of an export operation
#[derive(Debug, Clone)]
pub struct ExportSummary {
    /// Raw issues submitted to the worker pool
    pub total_issues: usize,

    /// Issues mapped this run, including ones discovered through links
    pub mapped_issues: usize,

    /// Submitted issues skipped as already processed or in progress
    pub skipped_issues: usize,

    /// Submitted issues whose mapping failed
    pub failed_issues: usize,

    /// Deduplicated link edges recorded
    pub link_edges: usize,

    /// Bundle files assembled (and written, unless dry-run)
    pub batches_written: usize,

    /// Duration of the export
    pub duration: Duration,

    /// Errors encountered during export
    pub errors: Vec<ExportError>,
}

impl ExportSummary {
    /// Create a new empty export summary
    pub fn new() -> Self {
        Self {
            total_issues: 0,
            mapped_issues: 0,
            skipped_issues: 0,
            failed_issues: 0,
            link_edges: 0,
            batches_written: 0,
            duration: Duration::from_secs(0),
            errors: Vec::new(),
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Add an error
    pub fn add_error(&mut self, error: ExportError) {
        self.errors.push(error);
    }

    /// Check if the export completed without failures
    pub fn is_successful(&self) -> bool {
        self.failed_issues == 0 && self.errors.is_empty()
    }

    /// Share of submitted issues that mapped or were legitimately skipped
    pub fn success_rate(&self) -> f64 {
        if self.total_issues == 0 {
            return 100.0;
        }
        ((self.total_issues - self.failed_issues) as f64 / self.total_issues as f64) * 100.0
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            total_issues = self.total_issues,
            mapped = self.mapped_issues,
            skipped = self.skipped_issues,
            failed = self.failed_issues,
            link_edges = self.link_edges,
            batches = self.batches_written,
            duration_secs = self.duration.as_secs(),
            success_rate = format!("{:.2}%", self.success_rate()),
            "Export completed"
        );

        if !self.errors.is_empty() {
            tracing::warn!(
                error_count = self.errors.len(),
                "Export completed with errors"
            );
        }
    }
}

impl Default for ExportSummary {
    fn default() -> Self {
        Self::new()
    }
}

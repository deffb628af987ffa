//! Export coordinator - main orchestrator for the export process
//!
//! Fetches the project, the custom-field schema and the raw issue set, runs
//! the mapper over a bounded worker pool, then assembles and writes the
//! output bundles. One mapping failure never aborts sibling tasks; the only
//! fatal condition is total loss of the remote side before any issue is
//! fetched.

use crate::adapters::jira::models::RawIssue;
use crate::adapters::jira::JiraClient;
use crate::config::{Deployment, PorterConfig};
use crate::core::export::batch::{bundle_file_name, split_into_batches};
use crate::core::export::context::ExportContext;
use crate::core::export::mapper::{IssueMapper, MapOutcome};
use crate::core::export::summary::{ExportError, ExportErrorType, ExportSummary};
use crate::core::fields;
use crate::core::identity::IdentityResolver;
use crate::core::state::{CacheFile, ProcessedLog};
use crate::domain::{PorterError, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Export coordinator
pub struct ExportCoordinator {
    config: PorterConfig,
    client: Arc<JiraClient>,
    identity: Arc<IdentityResolver>,
    ctx: Arc<ExportContext>,
}

impl ExportCoordinator {
    /// Create a new export coordinator
    ///
    /// Opens the durable state files and builds the clients. For a Data
    /// Center source with a configured directory, a second client handles
    /// the Cloud-side account lookups.
    pub fn new(config: PorterConfig) -> Result<Self> {
        let client = Arc::new(JiraClient::new(&config.jira)?);

        let directory = match (config.jira.deployment, &config.directory) {
            (Deployment::Datacenter, Some(directory_config)) => {
                Some(Arc::new(JiraClient::for_directory(directory_config)?))
            }
            _ => None,
        };

        let processed = ProcessedLog::open(config.state.processed_path())?;
        let exemptions = CacheFile::open(config.state.identity_cache_path())?;
        let accounts = CacheFile::open(config.state.account_ids_path())?;

        let identity = Arc::new(IdentityResolver::new(
            client.clone(),
            directory,
            config.jira.deployment,
            config.export.exempt_groups.clone(),
            config.export.placeholder_account_id.clone(),
            exemptions,
            accounts,
        ));

        let ctx = Arc::new(ExportContext::new(processed));

        Ok(Self {
            config,
            client,
            identity,
            ctx,
        })
    }

    /// Execute the export
    ///
    /// 1. Fetch project metadata (fatal if unavailable)
    /// 2. Fetch the custom-field schema (degrades to none)
    /// 3. Fetch the raw issue set via paginated search
    /// 4. Map everything over the worker pool
    /// 5. Assemble batches and write bundle files
    pub async fn execute_export(&self) -> Result<ExportSummary> {
        let start_time = Instant::now();
        let mut summary = ExportSummary::new();
        let project_key = self.config.export.project_key.clone();

        tracing::info!(project_key = %project_key, "Starting export process");

        let project = self
            .client
            .fetch_project(&project_key)
            .await
            .map_err(|e| {
                PorterError::Export(format!(
                    "Unable to fetch project details for {project_key}: {e}"
                ))
            })?;

        let custom_fields = match self.client.fetch_custom_fields().await {
            Ok(schemas) => {
                let allowed = fields::allowed_custom_fields(&schemas);
                tracing::info!(count = allowed.len(), "Allowed custom field types found");
                allowed
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch custom field schema, exporting without custom fields");
                summary.add_error(ExportError::new(
                    ExportErrorType::Remote,
                    format!("Custom field schema fetch failed: {e}"),
                ));
                HashMap::new()
            }
        };

        let issues = self.fetch_issues(&mut summary).await?;
        if issues.is_empty() {
            tracing::info!("No issues found");
            return Ok(summary.with_duration(start_time.elapsed()));
        }
        summary.total_issues = issues.len();

        tracing::info!(
            total = issues.len(),
            workers = self.config.export.workers,
            "Dispatching issues to worker pool"
        );

        let mapper = Arc::new(IssueMapper::new(
            self.client.clone(),
            self.identity.clone(),
            self.ctx.clone(),
            custom_fields,
        ));

        let semaphore = Arc::new(Semaphore::new(self.config.export.workers));
        let mut tasks = JoinSet::new();

        for raw in issues {
            let mapper = mapper.clone();
            let semaphore = semaphore.clone();
            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("semaphore closed while tasks pending");
                let key = raw.key.clone();
                let outcome = mapper.map_issue(&raw).await;
                (key, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(MapOutcome::Mapped))) => {}
                Ok((_, Ok(MapOutcome::Skipped))) => summary.skipped_issues += 1,
                Ok((key, Err(e))) => {
                    tracing::error!(issue_key = %key, error = %e, "Failed to map issue");
                    summary.failed_issues += 1;
                    summary.add_error(
                        ExportError::new(ExportErrorType::Mapping, e.to_string())
                            .with_context(format!("issue_key={key}")),
                    );
                }
                Err(join_error) => {
                    tracing::error!(error = %join_error, "Mapping task aborted");
                    summary.failed_issues += 1;
                    summary.add_error(ExportError::new(
                        ExportErrorType::Unknown,
                        format!("Mapping task aborted: {join_error}"),
                    ));
                }
            }
        }

        let (mapped, links) = self.ctx.take_results();
        summary.mapped_issues = mapped.len();
        summary.link_edges = links.len();

        let batches = split_into_batches(
            &mapped,
            &project,
            &links,
            self.config.export.max_batch_bytes,
        )?;
        summary.batches_written = batches.len();

        if self.config.application.dry_run {
            tracing::info!(
                batches = batches.len(),
                "Dry run - skipping bundle file writes"
            );
        } else {
            self.write_batches(&project_key, &batches, &mut summary)?;
        }

        let summary = summary.with_duration(start_time.elapsed());
        summary.log_summary();

        Ok(summary)
    }

    /// Fetch the full raw issue set for the configured project.
    ///
    /// Search hits carry only the key; each is re-fetched in full with the
    /// changelog expanded. Individual fetch failures are skipped; a search
    /// failure before anything was fetched is fatal.
    async fn fetch_issues(&self, summary: &mut ExportSummary) -> Result<Vec<RawIssue>> {
        let jql = self.config.export.jql.clone().unwrap_or_else(|| {
            format!(
                "project={} order by key desc",
                self.config.export.project_key
            )
        });
        let page_size = self.config.export.page_size;

        let mut issues = Vec::new();
        let mut start_at = 0;
        let mut total: Option<usize> = None;

        loop {
            let page = match self.client.search_issues(&jql, start_at, page_size).await {
                Ok(page) => page,
                Err(e) => {
                    if start_at == 0 {
                        return Err(PorterError::Export(format!(
                            "Issue search failed, nothing fetched: {e}"
                        )));
                    }
                    tracing::warn!(start_at, error = %e, "Search page failed, continuing with fetched issues");
                    summary.add_error(ExportError::new(
                        ExportErrorType::Remote,
                        format!("Search page at {start_at} failed: {e}"),
                    ));
                    break;
                }
            };

            let expected = *total.get_or_insert(page.total);
            if page.issues.is_empty() {
                break;
            }

            for hit in page.issues {
                match self.client.fetch_issue(&hit.key, Some("changelog")).await {
                    Ok(full) => issues.push(full),
                    Err(e) => {
                        tracing::warn!(issue_key = %hit.key, error = %e, "Failed to fetch issue, skipping");
                        summary.add_error(
                            ExportError::new(ExportErrorType::Remote, e.to_string())
                                .with_context(format!("issue_key={}", hit.key)),
                        );
                    }
                }
            }

            start_at += page_size;
            if issues.len() >= expected || start_at >= expected {
                break;
            }
        }

        tracing::info!(
            fetched = issues.len(),
            total = total.unwrap_or(0),
            "Fetched issues from search"
        );

        Ok(issues)
    }

    /// Write one pretty-printed JSON file per batch into the output dir.
    fn write_batches(
        &self,
        project_key: &str,
        batches: &[crate::core::export::batch::Batch],
        summary: &mut ExportSummary,
    ) -> Result<()> {
        let output_dir = Path::new(&self.config.export.output_dir);
        std::fs::create_dir_all(output_dir).map_err(|e| {
            PorterError::Io(format!(
                "Failed to create output directory {}: {e}",
                output_dir.display()
            ))
        })?;

        for (index, batch) in batches.iter().enumerate() {
            let file_name = bundle_file_name(project_key, index + 1);
            let path = output_dir.join(&file_name);
            match serde_json::to_string_pretty(batch) {
                Ok(json) => {
                    if let Err(e) = std::fs::write(&path, json) {
                        tracing::error!(path = %path.display(), error = %e, "Failed to write bundle");
                        summary.add_error(ExportError::new(
                            ExportErrorType::Storage,
                            format!("Failed to write {file_name}: {e}"),
                        ));
                    } else {
                        tracing::info!(path = %path.display(), issues = batch.issues.len(), "Bundle written");
                    }
                }
                Err(e) => {
                    summary.add_error(ExportError::new(
                        ExportErrorType::Storage,
                        format!("Failed to serialize {file_name}: {e}"),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Number of issue keys recorded in the processed log.
    pub fn processed_count(&self) -> usize {
        self.ctx.processed_count()
    }
}

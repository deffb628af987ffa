//! Export command implementation

use crate::config::load_config;
use crate::core::export::ExportCoordinator;
use clap::Args;

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Dry run mode - map everything, write no bundle files
    #[arg(long)]
    pub dry_run: bool,

    /// Override the project key to export
    #[arg(long)]
    pub project: Option<String>,

    /// Override the JQL used to select issues
    #[arg(long)]
    pub jql: Option<String>,

    /// Override the worker pool size
    #[arg(long)]
    pub workers: Option<usize>,
}

impl ExportArgs {
    /// Execute the export command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Starting export command");

        let mut config = load_config(config_path)?;

        // Apply CLI overrides
        if let Some(project) = &self.project {
            tracing::info!(project_key = %project, "Overriding project key from CLI");
            config.export.project_key = project.clone();
        }
        if let Some(jql) = &self.jql {
            tracing::info!(jql = %jql, "Overriding JQL from CLI");
            config.export.jql = Some(jql.clone());
        }
        if let Some(workers) = self.workers {
            tracing::info!(workers, "Overriding worker count from CLI");
            config.export.workers = workers;
        }
        if self.dry_run {
            tracing::info!("Enabling dry-run mode from CLI");
            config.application.dry_run = true;
        }

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(2); // Configuration error exit code
        }

        if config.application.dry_run {
            println!("DRY RUN - no bundle files will be written");
            println!();
        }

        // Confirmation prompt (unless --yes or dry-run)
        if !self.yes && !config.application.dry_run {
            println!("Export Configuration:");
            println!("  Project: {}", config.export.project_key);
            println!(
                "  JQL: {}",
                config.export.jql.as_deref().unwrap_or("(project default)")
            );
            println!("  Workers: {}", config.export.workers);
            println!("  Batch size: {} bytes", config.export.max_batch_bytes);
            println!("  Output dir: {}", config.export.output_dir);
            println!();
            print!("Proceed with export? [y/N]: ");
            use std::io::{self, Write};
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().read_line(&mut input)?;

            if !input.trim().eq_ignore_ascii_case("y") {
                println!("Export cancelled.");
                return Ok(0);
            }
        }

        tracing::info!("Creating export coordinator");
        let coordinator = match ExportCoordinator::new(config) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create export coordinator");
                eprintln!("Failed to initialize export: {e}");
                return Ok(4); // Connection error exit code
            }
        };

        println!("Starting export...");
        println!();

        let summary = match coordinator.execute_export().await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Export failed");
                eprintln!("Export failed: {e}");
                return Ok(5); // Fatal error exit code
            }
        };

        println!();
        println!("Export Summary:");
        println!("  Issues submitted: {}", summary.total_issues);
        println!("  Issues mapped: {}", summary.mapped_issues);
        println!("  Skipped (already processed): {}", summary.skipped_issues);
        println!("  Failed: {}", summary.failed_issues);
        println!("  Link edges: {}", summary.link_edges);
        println!("  Bundles: {}", summary.batches_written);
        println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
        println!("  Success rate: {:.2}%", summary.success_rate());
        println!();

        if !summary.errors.is_empty() {
            println!("Errors encountered:");
            for error in &summary.errors {
                println!("  - {:?}: {}", error.error_type, error.message);
                if let Some(context) = &error.context {
                    println!("    Context: {context}");
                }
            }
            println!();
        }

        let exit_code = if summary.is_successful() {
            println!("Export completed successfully.");
            0
        } else if summary.failed_issues > 0 {
            println!("Export completed with failures. Re-run to retry the failed issues.");
            1 // Partial success
        } else {
            println!("Export completed.");
            0
        };

        Ok(exit_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_args_defaults() {
        let args = ExportArgs {
            yes: false,
            dry_run: false,
            project: None,
            jql: None,
            workers: None,
        };

        assert!(!args.yes);
        assert!(!args.dry_run);
        assert!(args.project.is_none());
        assert!(args.jql.is_none());
        assert!(args.workers.is_none());
    }

    #[test]
    fn test_export_args_with_overrides() {
        let args = ExportArgs {
            yes: true,
            dry_run: true,
            project: Some("PROJ".to_string()),
            jql: Some("project=PROJ and status=Done".to_string()),
            workers: Some(4),
        };

        assert!(args.yes);
        assert!(args.dry_run);
        assert_eq!(args.project.as_deref(), Some("PROJ"));
        assert_eq!(args.workers, Some(4));
    }
}

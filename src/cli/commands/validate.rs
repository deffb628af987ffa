//! Validate-config command implementation

use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path, "Validating configuration");

        match load_config(config_path) {
            Ok(config) => {
                println!("Configuration is valid.");
                println!("  Jira: {} ({:?})", config.jira.base_url, config.jira.deployment);
                println!("  Project: {}", config.export.project_key);
                println!("  State dir: {}", config.state.dir);
                println!("  Output dir: {}", config.export.output_dir);
                Ok(0)
            }
            Err(e) => {
                tracing::error!(error = %e, "Configuration validation failed");
                eprintln!("Configuration invalid: {e}");
                Ok(2)
            }
        }
    }
}

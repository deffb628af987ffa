//! Configuration schema types
//!
//! This module defines the configuration structure for Porter. The structure
//! maps 1:1 onto `porter.toml`.

use crate::config::SecretString;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Jira deployment flavor
///
/// Cloud and Data Center differ in authentication (email + API token vs
/// username + password) and in the user-lookup endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Deployment {
    /// Jira Cloud (*.atlassian.net)
    Cloud,
    /// Jira Data Center / Server
    Datacenter,
}

/// Main Porter configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Serialize, Deserialize)]
pub struct PorterConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Source Jira connection
    pub jira: JiraConfig,

    /// Jira Cloud directory used for cross-system account-id lookups.
    /// Only meaningful (and only consulted) when the source deployment is
    /// Data Center; a Cloud source is its own directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<DirectoryConfig>,

    /// Export settings
    pub export: ExportConfig,

    /// Persisted state location
    #[serde(default)]
    pub state: StateConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl PorterConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.jira.validate()?;
        if let Some(ref directory) = self.directory {
            directory.validate()?;
        }
        self.export.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Dry run mode (map everything, write no bundle files)
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            dry_run: false,
        }
    }
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

/// Retry configuration for remote calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Backoff multiplier
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

/// Source Jira connection configuration
#[derive(Debug, Serialize, Deserialize)]
pub struct JiraConfig {
    /// Base URL of the Jira server (e.g. "https://acme.atlassian.net")
    pub base_url: String,

    /// Deployment flavor; decides auth scheme and user-lookup endpoints
    pub deployment: Deployment,

    /// Account email, required for Cloud
    #[serde(default)]
    pub email: Option<String>,

    /// API token, required for Cloud.
    /// Stored securely in memory and zeroized on drop.
    #[serde(default)]
    pub api_token: Option<SecretString>,

    /// Username, required for Data Center
    #[serde(default)]
    pub username: Option<String>,

    /// Password, required for Data Center
    #[serde(default)]
    pub password: Option<SecretString>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Retry configuration
    #[serde(default)]
    pub retry: RetryConfig,
}

impl JiraConfig {
    fn validate(&self) -> Result<(), String> {
        validate_base_url("jira.base_url", &self.base_url)?;

        match self.deployment {
            Deployment::Cloud => {
                if self.email.as_deref().map_or(true, str::is_empty) {
                    return Err("jira.email is required when deployment = 'cloud'".to_string());
                }
                if self
                    .api_token
                    .as_ref()
                    .map_or(true, |t| t.expose_secret().is_empty())
                {
                    return Err("jira.api_token is required when deployment = 'cloud'".to_string());
                }
            }
            Deployment::Datacenter => {
                if self.username.as_deref().map_or(true, str::is_empty) {
                    return Err(
                        "jira.username is required when deployment = 'datacenter'".to_string()
                    );
                }
                if self
                    .password
                    .as_ref()
                    .map_or(true, |p| p.expose_secret().is_empty())
                {
                    return Err(
                        "jira.password is required when deployment = 'datacenter'".to_string()
                    );
                }
            }
        }

        if self.timeout_seconds == 0 {
            return Err("jira.timeout_seconds must be greater than 0".to_string());
        }

        Ok(())
    }
}

/// Jira Cloud directory configuration for account-id lookups
#[derive(Debug, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Base URL of the Jira Cloud site
    pub base_url: String,

    /// Account email
    pub email: String,

    /// API token
    pub api_token: SecretString,
}

impl DirectoryConfig {
    fn validate(&self) -> Result<(), String> {
        validate_base_url("directory.base_url", &self.base_url)?;
        if self.email.is_empty() {
            return Err("directory.email cannot be empty".to_string());
        }
        if self.api_token.expose_secret().is_empty() {
            return Err("directory.api_token cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Export settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Project key to export (e.g. "PROJ")
    pub project_key: String,

    /// JQL override; defaults to all issues of the project, newest key first
    #[serde(default)]
    pub jql: Option<String>,

    /// Search page size (1-1000)
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Bounded worker pool size for concurrent mapping
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Target uncompressed size per output bundle, in bytes
    #[serde(default = "default_max_batch_bytes")]
    pub max_batch_bytes: usize,

    /// Directory bundle files are written into
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Identity every anonymized author is replaced with
    pub placeholder_account_id: String,

    /// User groups whose members keep their identity on export
    #[serde(default = "default_exempt_groups")]
    pub exempt_groups: Vec<String>,
}

impl ExportConfig {
    fn validate(&self) -> Result<(), String> {
        if self.project_key.is_empty() {
            return Err("export.project_key cannot be empty".to_string());
        }
        if self.page_size == 0 || self.page_size > 1000 {
            return Err("export.page_size must be between 1 and 1000".to_string());
        }
        if self.workers == 0 || self.workers > 64 {
            return Err("export.workers must be between 1 and 64".to_string());
        }
        if self.max_batch_bytes < 1024 {
            return Err("export.max_batch_bytes must be at least 1024".to_string());
        }
        if self.placeholder_account_id.is_empty() {
            return Err("export.placeholder_account_id cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Persisted state location
///
/// Three flat files live under `dir`: the processed-issue log, the identity
/// exemption cache and the account-id cache. They are what make a run
/// resumable, so point this somewhere that survives between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    /// Directory holding the state files
    #[serde(default = "default_state_dir")]
    pub dir: String,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            dir: default_state_dir(),
        }
    }
}

impl StateConfig {
    /// Path of the append-only processed-issue log
    pub fn processed_path(&self) -> PathBuf {
        PathBuf::from(&self.dir).join("processed_issues.txt")
    }

    /// Path of the identity exemption cache
    pub fn identity_cache_path(&self) -> PathBuf {
        PathBuf::from(&self.dir).join("identity_cache.txt")
    }

    /// Path of the email -> accountId cache
    pub fn account_ids_path(&self) -> PathBuf {
        PathBuf::from(&self.dir).join("account_ids.txt")
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Write JSON logs to a rolling file in addition to the console
    #[serde(default)]
    pub local_enabled: bool,

    /// Directory the rolling log files are written into
    #[serde(default = "default_log_path")]
    pub local_path: String,

    /// Rotation interval ("daily" or "hourly")
    #[serde(default = "default_log_rotation")]
    pub local_rotation: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_log_path(),
            local_rotation: default_log_rotation(),
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        if self.local_enabled && !["daily", "hourly"].contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be 'daily' or 'hourly'",
                self.local_rotation
            ));
        }
        Ok(())
    }
}

fn validate_base_url(field: &str, value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err(format!("{field} cannot be empty"));
    }
    if !value.starts_with("http://") && !value.starts_with("https://") {
        return Err(format!("{field} must start with http:// or https://"));
    }
    Ok(())
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_retries() -> usize {
    3
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    10_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_page_size() -> usize {
    100
}

fn default_workers() -> usize {
    15
}

fn default_max_batch_bytes() -> usize {
    7 * 1024 * 1024
}

fn default_output_dir() -> String {
    ".".to_string()
}

fn default_exempt_groups() -> Vec<String> {
    vec!["jira-administrators".to_string()]
}

fn default_state_dir() -> String {
    ".porter".to_string()
}

fn default_log_path() -> String {
    "logs".to_string()
}

fn default_log_rotation() -> String {
    "daily".to_string()
}

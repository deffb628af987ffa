//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::PorterConfig;
use crate::config::secret_string;
use crate::domain::errors::PorterError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into PorterConfig
/// 4. Applies environment variable overrides (PORTER_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsing fails, a referenced
/// environment variable is missing, or validation fails.
pub fn load_config(path: impl AsRef<Path>) -> Result<PorterConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(PorterError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        PorterError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: PorterConfig = toml::from_str(&contents)
        .map_err(|e| PorterError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        PorterError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched. Referencing an unset variable is an
/// error so a missing credential fails at startup, not mid-export.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("static regex");
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    for line in input.lines() {
        let trimmed = line.trim_start();

        if trimmed.starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{var_name}}}");
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(PorterError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using the PORTER_* prefix
///
/// Variables follow the pattern PORTER_<SECTION>_<KEY>, for example
/// PORTER_JIRA_BASE_URL or PORTER_EXPORT_PROJECT_KEY.
fn apply_env_overrides(config: &mut PorterConfig) {
    if let Ok(val) = std::env::var("PORTER_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Ok(val) = std::env::var("PORTER_APPLICATION_DRY_RUN") {
        config.application.dry_run = val.parse().unwrap_or(false);
    }

    if let Ok(val) = std::env::var("PORTER_JIRA_BASE_URL") {
        config.jira.base_url = val;
    }
    if let Ok(val) = std::env::var("PORTER_JIRA_EMAIL") {
        config.jira.email = Some(val);
    }
    if let Ok(val) = std::env::var("PORTER_JIRA_API_TOKEN") {
        config.jira.api_token = Some(secret_string(val));
    }
    if let Ok(val) = std::env::var("PORTER_JIRA_USERNAME") {
        config.jira.username = Some(val);
    }
    if let Ok(val) = std::env::var("PORTER_JIRA_PASSWORD") {
        config.jira.password = Some(secret_string(val));
    }

    if let Ok(val) = std::env::var("PORTER_EXPORT_PROJECT_KEY") {
        config.export.project_key = val;
    }
    if let Ok(val) = std::env::var("PORTER_EXPORT_OUTPUT_DIR") {
        config.export.output_dir = val;
    }
    if let Ok(val) = std::env::var("PORTER_EXPORT_WORKERS") {
        if let Ok(workers) = val.parse() {
            config.export.workers = workers;
        }
    }
    if let Ok(val) = std::env::var("PORTER_EXPORT_MAX_BATCH_BYTES") {
        if let Ok(bytes) = val.parse() {
            config.export.max_batch_bytes = bytes;
        }
    }

    if let Ok(val) = std::env::var("PORTER_STATE_DIR") {
        config.state.dir = val;
    }

    if let Ok(val) = std::env::var("PORTER_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("PORTER_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}

//! Configuration management for Porter.
//!
//! Porter is configured through a TOML file (`porter.toml` by default) with
//! support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `PORTER_*` environment variable overrides
//! - Default values for optional settings
//! - Validation on load
//!
//! # Example Configuration
//!
//! ```toml
//! [jira]
//! base_url = "https://acme.atlassian.net"
//! deployment = "cloud"
//! email = "bot@acme.example"
//! api_token = "${PORTER_JIRA_API_TOKEN}"
//!
//! [export]
//! project_key = "PROJ"
//! placeholder_account_id = "712020:00000000-0000-0000-0000-000000000000"
//! exempt_groups = ["jira-administrators"]
//!
//! [state]
//! dir = ".porter"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::load_config;
pub use schema::{
    ApplicationConfig, Deployment, DirectoryConfig, ExportConfig, JiraConfig, LoggingConfig,
    PorterConfig, RetryConfig, StateConfig,
};
pub use secret::{secret_string, secret_string_opt, SecretString, SecretValue};

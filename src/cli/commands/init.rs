//! Init command implementation
//!
//! Writes a commented starter configuration file.

use clap::Args;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Output path for the configuration file
    #[arg(short, long, default_value = "porter.toml")]
    pub output: String,

    /// Overwrite an existing file
    #[arg(short, long)]
    pub force: bool,
}

const CONFIG_TEMPLATE: &str = r#"# Porter configuration
# Credentials can reference environment variables with ${VAR_NAME} syntax.

[application]
log_level = "info"

[jira]
# "cloud" (email + api_token) or "datacenter" (username + password)
deployment = "cloud"
base_url = "https://your-site.atlassian.net"
email = "bot@example.com"
api_token = "${PORTER_JIRA_API_TOKEN}"
# username = "admin"
# password = "${PORTER_JIRA_PASSWORD}"

# Jira Cloud side for account-id lookups; only needed when the source
# deployment is "datacenter" and exempted identities must map to Cloud
# account ids.
# [directory]
# base_url = "https://your-site.atlassian.net"
# email = "bot@example.com"
# api_token = "${PORTER_DIRECTORY_API_TOKEN}"

[export]
project_key = "PROJ"
# jql = "project=PROJ order by key desc"
workers = 15
max_batch_bytes = 7340032          # 7 MiB per bundle
output_dir = "export"
# Identity written for every anonymized author
placeholder_account_id = "712020:00000000-0000-0000-0000-000000000000"
# Members of these groups keep their identity
exempt_groups = ["jira-administrators"]

[state]
# Processed log and identity caches; keep between runs to resume
dir = ".porter"

[logging]
local_enabled = false
local_path = "logs"
local_rotation = "daily"
"#;

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        let path = Path::new(&self.output);

        if path.exists() && !self.force {
            eprintln!(
                "{} already exists. Use --force to overwrite.",
                path.display()
            );
            return Ok(2);
        }

        std::fs::write(path, CONFIG_TEMPLATE)?;
        println!("Wrote {}", path.display());
        println!("Edit the [jira] and [export] sections, then run: porter export");
        Ok(0)
    }
}

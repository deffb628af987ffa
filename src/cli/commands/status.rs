//! Status command implementation
//!
//! Reports the durable run state: how many issues the processed log has
//! finalized and how large the identity caches are. Useful before resuming
//! an interrupted export or before wiping state for a fresh one.

use crate::config::load_config;
use crate::core::state::{CacheFile, ProcessedLog};
use clap::Args;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = load_config(config_path)?;

        println!("Porter state ({})", config.state.dir);
        println!();

        match ProcessedLog::open(config.state.processed_path()) {
            Ok(log) => {
                println!("  Processed issues: {}", log.len());
                if log.is_empty() {
                    println!("    (next export starts from scratch)");
                } else {
                    println!("    (these keys will be skipped on the next run)");
                }
            }
            Err(e) => println!("  Processed issues: unreadable ({e})"),
        }

        match CacheFile::open(config.state.identity_cache_path()) {
            Ok(cache) => println!("  Identity cache entries: {}", cache.len()),
            Err(e) => println!("  Identity cache: unreadable ({e})"),
        }

        match CacheFile::open(config.state.account_ids_path()) {
            Ok(cache) => println!("  Account-id cache entries: {}", cache.len()),
            Err(e) => println!("  Account-id cache: unreadable ({e})"),
        }

        Ok(0)
    }
}

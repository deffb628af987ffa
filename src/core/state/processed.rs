//! Durable processed-issue log
//!
//! An append-only file with one issue key per line. Keys recorded here are
//! final: they are never mapped or emitted again, in this run or any later
//! one. Each write is flushed and synced before the mapping call returns, so
//! an interrupted run never loses a completed issue.

use crate::domain::{PorterError, Result};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Append-only record of finalized issue keys.
pub struct ProcessedLog {
    path: PathBuf,
    entries: Mutex<HashSet<String>>,
    file: Mutex<File>,
}

impl ProcessedLog {
    /// Open (or create) the log, loading all previously recorded keys.
    ///
    /// Blank lines are skipped; there is nothing else to be malformed in a
    /// one-key-per-line file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    PorterError::State(format!(
                        "Failed to create state directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }

        let mut entries = HashSet::new();
        if path.exists() {
            let reader = BufReader::new(File::open(&path).map_err(|e| {
                PorterError::State(format!("Failed to open {}: {e}", path.display()))
            })?);
            for line in reader.lines() {
                let line = line
                    .map_err(|e| PorterError::State(format!("Failed to read {}: {e}", path.display())))?;
                let key = line.trim();
                if !key.is_empty() {
                    entries.insert(key.to_string());
                }
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| PorterError::State(format!("Failed to open {}: {e}", path.display())))?;

        tracing::debug!(
            path = %path.display(),
            entries = entries.len(),
            "Loaded processed-issue log"
        );

        Ok(Self {
            path,
            entries: Mutex::new(entries),
            file: Mutex::new(file),
        })
    }

    /// True if the key has already been finalized.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().expect("processed set poisoned").contains(key)
    }

    /// Record a key as finalized. Durable once this returns.
    pub fn mark(&self, key: &str) -> Result<()> {
        {
            let mut entries = self.entries.lock().expect("processed set poisoned");
            if !entries.insert(key.to_string()) {
                return Ok(());
            }
        }

        let mut file = self.file.lock().expect("processed log poisoned");
        writeln!(file, "{key}")
            .and_then(|_| file.flush())
            .and_then(|_| file.sync_data())
            .map_err(|e| {
                PorterError::State(format!("Failed to append to {}: {e}", self.path.display()))
            })
    }

    /// Number of finalized keys.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("processed set poisoned").len()
    }

    /// True if no key has been finalized yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

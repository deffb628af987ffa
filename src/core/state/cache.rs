//! Persisted key/value cache files
//!
//! The identity caches are small flat files with one `key,value` record per
//! line. Updates rewrite the file wholesale, but always through a temp file
//! and an atomic rename so a crash can't leave a half-written cache, and
//! always merged over whatever is currently on disk so a concurrent writer's
//! entries are not thrown away.

use crate::domain::{PorterError, Result};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A durable string-to-string cache backed by one flat file.
pub struct CacheFile {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl CacheFile {
    /// Open the cache, loading existing entries. Lines without a comma are
    /// skipped, not errors.
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

        let entries = load_entries(&path)?;

        tracing::debug!(
            path = %path.display(),
            entries = entries.len(),
            "Loaded cache file"
        );

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Look up a value.
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .expect("cache poisoned")
            .get(key)
            .cloned()
    }

    /// Insert a value and persist the whole cache.
    ///
    /// The in-memory map is merged over the current on-disk contents before
    /// the rewrite, then written to a temp file and renamed into place.
    pub fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().expect("cache poisoned");
        entries.insert(key.to_string(), value.to_string());

        let mut merged = load_entries(&self.path).unwrap_or_default();
        for (k, v) in entries.iter() {
            merged.insert(k.clone(), v.clone());
        }
        *entries = merged;

        let tmp_path = self.path.with_extension("tmp");
        let mut tmp = std::fs::File::create(&tmp_path).map_err(|e| {
            PorterError::State(format!("Failed to create {}: {e}", tmp_path.display()))
        })?;
        for (k, v) in entries.iter() {
            writeln!(tmp, "{k},{v}").map_err(|e| {
                PorterError::State(format!("Failed to write {}: {e}", tmp_path.display()))
            })?;
        }
        tmp.sync_data().map_err(|e| {
            PorterError::State(format!("Failed to sync {}: {e}", tmp_path.display()))
        })?;
        drop(tmp);

        std::fs::rename(&tmp_path, &self.path).map_err(|e| {
            PorterError::State(format!(
                "Failed to rename {} -> {}: {e}",
                tmp_path.display(),
                self.path.display()
            ))
        })
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache poisoned").len()
    }

    /// True if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn load_entries(path: &Path) -> Result<HashMap<String, String>> {
    let mut entries = HashMap::new();
    if !path.exists() {
        return Ok(entries);
    }

    let contents = std::fs::read_to_string(path)
        .map_err(|e| PorterError::State(format!("Failed to read {}: {e}", path.display())))?;

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line.split_once(',') {
            Some((key, value)) if !key.is_empty() => {
                entries.insert(key.to_string(), value.to_string());
            }
            _ => {
                tracing::warn!(path = %path.display(), line, "Skipping malformed cache line");
            }
        }
    }

    Ok(entries)
}

//! Shared pipeline state
//!
//! One `ExportContext` is constructed per run and shared by every worker. It
//! owns all mutable state the workers coordinate through: the identifier
//! registry (counter + identifier map + in-progress set behind one lock, so
//! claiming a key and assigning its identifier is a single atomic step), the
//! deduplicated link list, the completed-issue list and the durable
//! processed log. No lock is ever held across an await point.

use crate::core::state::ProcessedLog;
use crate::domain::{LinkDirection, LinkEdge, MappedIssue, Result};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Outcome of trying to claim an issue key for mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// The caller owns the key and must map it under this identifier
    Claimed(u64),
    /// Another mapping call (possibly higher up the same link chain) owns it
    InProgress,
    /// The key was finalized by this or an earlier run
    AlreadyProcessed,
}

struct Registry {
    next_id: u64,
    ids: HashMap<String, u64>,
    in_progress: HashSet<String>,
}

pub struct ExportContext {
    registry: Mutex<Registry>,
    links: Mutex<Vec<LinkEdge>>,
    completed: Mutex<Vec<MappedIssue>>,
    processed: ProcessedLog,
}

impl ExportContext {
    pub fn new(processed: ProcessedLog) -> Self {
        Self {
            registry: Mutex::new(Registry {
                next_id: 1,
                ids: HashMap::new(),
                in_progress: HashSet::new(),
            }),
            links: Mutex::new(Vec::new()),
            completed: Mutex::new(Vec::new()),
            processed,
        }
    }

    /// Try to claim a key for mapping.
    ///
    /// A successful claim assigns the key's identifier (or reuses the one
    /// from an earlier failed attempt) in the same critical section, so a
    /// concurrent observer that loses the claim race can still resolve the
    /// key's identifier immediately.
    pub fn begin(&self, key: &str) -> Claim {
        if self.processed.contains(key) {
            return Claim::AlreadyProcessed;
        }

        let mut registry = self.registry.lock().expect("registry poisoned");
        if !registry.in_progress.insert(key.to_string()) {
            return Claim::InProgress;
        }

        let id = if let Some(&id) = registry.ids.get(key) {
            id
        } else {
            let id = registry.next_id;
            registry.next_id += 1;
            registry.ids.insert(key.to_string(), id);
            id
        };

        Claim::Claimed(id)
    }

    /// Finalize a claimed key: record it durably, release the in-progress
    /// entry and hand the mapped issue over.
    ///
    /// The durable write happens first; if it fails the claim is released
    /// and nothing is handed over, so a retry can map the key again.
    pub fn finish(&self, key: &str, issue: MappedIssue) -> Result<()> {
        let marked = self.processed.mark(key);

        self.registry
            .lock()
            .expect("registry poisoned")
            .in_progress
            .remove(key);

        marked?;
        self.completed.lock().expect("completed poisoned").push(issue);
        Ok(())
    }

    /// Release a claimed key without finalizing it (mapping failed).
    pub fn abandon(&self, key: &str) {
        self.registry
            .lock()
            .expect("registry poisoned")
            .in_progress
            .remove(key);
    }

    /// Identifier assigned to a key, if any claim has happened for it.
    pub fn assigned_id(&self, key: &str) -> Option<u64> {
        self.registry
            .lock()
            .expect("registry poisoned")
            .ids
            .get(key)
            .copied()
    }

    /// Insert a canonical edge unless the same (pair, type) relationship is
    /// already recorded. Returns whether the edge was inserted.
    pub fn record_link(
        &self,
        name: &str,
        a: u64,
        b: u64,
        discovered_from: LinkDirection,
    ) -> bool {
        let edge = LinkEdge::canonical(name, a, b, discovered_from);
        let mut links = self.links.lock().expect("links poisoned");
        if links.iter().any(|existing| existing.same_relationship(&edge)) {
            return false;
        }
        links.push(edge);
        true
    }

    /// Number of keys finalized so far (including earlier runs).
    pub fn processed_count(&self) -> usize {
        self.processed.len()
    }

    /// Drain the completed issues and link edges accumulated by the workers.
    pub fn take_results(&self) -> (Vec<MappedIssue>, Vec<LinkEdge>) {
        let issues = std::mem::take(&mut *self.completed.lock().expect("completed poisoned"));
        let links = std::mem::take(&mut *self.links.lock().expect("links poisoned"));
        (issues, links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn context(dir: &TempDir) -> ExportContext {
        ExportContext::new(ProcessedLog::open(dir.path().join("processed.txt")).unwrap())
    }

    fn dummy_issue(key: &str, id: u64) -> MappedIssue {
        MappedIssue {
            key: key.to_string(),
            external_id: id.to_string(),
            priority: None,
            description: String::new(),
            status: "Open".to_string(),
            reporter: "r".to_string(),
            labels: vec![],
            issue_type: "Bug".to_string(),
            resolution: None,
            created: None,
            updated: None,
            resolution_date: None,
            due_date: None,
            affected_versions: vec![],
            summary: String::new(),
            assignee: "a".to_string(),
            fixed_versions: vec![],
            components: vec![],
            custom_field_values: vec![],
            attachments: vec![],
            comments: vec![],
            history: vec![],
        }
    }

    #[test]
    fn test_claim_assigns_sequential_ids() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);

        assert_eq!(ctx.begin("P-1"), Claim::Claimed(1));
        assert_eq!(ctx.begin("P-2"), Claim::Claimed(2));
        assert_eq!(ctx.assigned_id("P-1"), Some(1));
        assert_eq!(ctx.assigned_id("P-3"), None);
    }

    #[test]
    fn test_second_claim_sees_in_progress() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);

        assert_eq!(ctx.begin("P-1"), Claim::Claimed(1));
        assert_eq!(ctx.begin("P-1"), Claim::InProgress);
        // The loser of the race can still resolve the identifier
        assert_eq!(ctx.assigned_id("P-1"), Some(1));
    }

    #[test]
    fn test_finished_key_is_processed() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);

        assert_eq!(ctx.begin("P-1"), Claim::Claimed(1));
        ctx.finish("P-1", dummy_issue("P-1", 1)).unwrap();
        assert_eq!(ctx.begin("P-1"), Claim::AlreadyProcessed);
    }

    #[test]
    fn test_abandon_allows_retry_with_same_id() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);

        assert_eq!(ctx.begin("P-1"), Claim::Claimed(1));
        ctx.abandon("P-1");
        // Identifier assignment is write-once per key
        assert_eq!(ctx.begin("P-1"), Claim::Claimed(1));
        assert_eq!(ctx.begin("P-2"), Claim::Claimed(2));
    }

    #[test]
    fn test_processed_keys_from_earlier_run_skipped() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("processed.txt"), "P-1\n").unwrap();

        let ctx = context(&dir);
        assert_eq!(ctx.begin("P-1"), Claim::AlreadyProcessed);
        assert_eq!(ctx.begin("P-2"), Claim::Claimed(1));
    }

    #[test]
    fn test_record_link_dedups_symmetrically() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);

        assert!(ctx.record_link("Blocks", 1, 2, LinkDirection::Outward));
        assert!(!ctx.record_link("Blocks", 2, 1, LinkDirection::Inward));
        // Same pair, different type is a distinct relationship
        assert!(ctx.record_link("Relates", 2, 1, LinkDirection::Outward));

        let (_, links) = ctx.take_results();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].source_id, "1");
        assert_eq!(links[0].destination_id, "2");
    }

    #[test]
    fn test_concurrent_claims_are_exclusive() {
        let dir = TempDir::new().unwrap();
        let ctx = Arc::new(context(&dir));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let ctx = ctx.clone();
                std::thread::spawn(move || matches!(ctx.begin("P-1"), Claim::Claimed(_)))
            })
            .collect();

        let claims = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&claimed| claimed)
            .count();
        assert_eq!(claims, 1);
    }

    #[test]
    fn test_take_results_drains() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);

        ctx.begin("P-1");
        ctx.finish("P-1", dummy_issue("P-1", 1)).unwrap();
        ctx.record_link("Blocks", 1, 2, LinkDirection::Outward);

        let (issues, links) = ctx.take_results();
        assert_eq!(issues.len(), 1);
        assert_eq!(links.len(), 1);

        let (issues, links) = ctx.take_results();
        assert!(issues.is_empty());
        assert!(links.is_empty());
    }
}

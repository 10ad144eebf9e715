//! The compliance store: three independent bounded logs
//!
//! Each log lives behind its own mutex and flushes synchronously to its
//! own JSON document after every mutation. No lock spans two logs, so
//! audit writes never serialize against pending-action writes.
//!
//! Store I/O never fails the caller's output path: a missing or corrupt
//! document reads as empty, and a failed write is logged and reported via
//! a sentinel id.

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

use claimguard_core::{ConfirmationMethod, Error, Result};

use crate::audit::AuditLogEntry;
use crate::bypass::BypassAttempt;
use crate::pending::{ClearOutcome, PendingAction, PendingStatus};
use crate::stats::ComplianceStats;

/// Sentinel id returned when an audit write fails
pub const AUDIT_ERROR_ID: &str = "audit_error";

/// Store tuning. The caps default to the documented 1000/100/50.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory for the persisted documents; `None` keeps everything in
    /// memory (tests, ephemeral hosts)
    pub data_dir: Option<PathBuf>,

    /// Audit log cap
    pub audit_cap: usize,

    /// Bypass log cap
    pub bypass_cap: usize,

    /// Pending-action queue cap
    pub pending_cap: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            audit_cap: 1000,
            bypass_cap: 100,
            pending_cap: 50,
        }
    }
}

impl StoreConfig {
    /// Persist documents under the given directory
    pub fn persistent(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(data_dir.into()),
            ..Self::default()
        }
    }
}

/// Append-only log with FIFO eviction at a fixed cap
struct BoundedLog<T> {
    entries: VecDeque<T>,
    cap: usize,
    path: Option<PathBuf>,
}

impl<T: Clone> BoundedLog<T> {
    fn new(cap: usize, path: Option<PathBuf>, existing: Vec<T>) -> Self {
        let mut entries = VecDeque::from(existing);
        while entries.len() > cap {
            entries.pop_front();
        }
        Self { entries, cap, path }
    }

    fn push(&mut self, entry: T) {
        self.entries.push_back(entry);
        while self.entries.len() > self.cap {
            self.entries.pop_front();
        }
    }

    fn to_vec(&self) -> Vec<T> {
        self.entries.iter().cloned().collect()
    }
}

/// The audit, bypass, and pending-action stores behind one handle
pub struct ComplianceStore {
    audit: Mutex<BoundedLog<AuditLogEntry>>,
    bypass: Mutex<BoundedLog<BypassAttempt>>,
    pending: Mutex<BoundedLog<PendingAction>>,
}

// Persisted document shapes
#[derive(Serialize, serde::Deserialize, Default)]
struct AuditDocument {
    entries: Vec<AuditLogEntry>,
}

#[derive(Serialize, serde::Deserialize, Default)]
struct BypassDocument {
    bypass_attempts: Vec<BypassAttempt>,
}

#[derive(Serialize, serde::Deserialize, Default)]
struct PendingDocument {
    pending_actions: Vec<PendingAction>,
}

impl ComplianceStore {
    /// Open the store, loading any existing documents. Missing or corrupt
    /// documents are treated as empty.
    pub fn open(config: StoreConfig) -> Self {
        if let Some(dir) = &config.data_dir {
            if let Err(e) = std::fs::create_dir_all(dir) {
                warn!(dir = %dir.display(), error = %e, "could not create store directory");
            }
        }

        let audit_path = config.data_dir.as_ref().map(|d| d.join("compliance_audit.json"));
        let bypass_path = config
            .data_dir
            .as_ref()
            .map(|d| d.join("compliance_bypasses.json"));
        let pending_path = config.data_dir.as_ref().map(|d| d.join("pending_actions.json"));

        let audit_doc: AuditDocument = load_document(audit_path.as_deref());
        let bypass_doc: BypassDocument = load_document(bypass_path.as_deref());
        let pending_doc: PendingDocument = load_document(pending_path.as_deref());

        Self {
            audit: Mutex::new(BoundedLog::new(
                config.audit_cap,
                audit_path,
                audit_doc.entries,
            )),
            bypass: Mutex::new(BoundedLog::new(
                config.bypass_cap,
                bypass_path,
                bypass_doc.bypass_attempts,
            )),
            pending: Mutex::new(BoundedLog::new(
                config.pending_cap,
                pending_path,
                pending_doc.pending_actions,
            )),
        }
    }

    /// An in-memory store with default caps
    pub fn in_memory() -> Self {
        Self::open(StoreConfig::default())
    }

    /// Append an audit entry, returning its id, or [`AUDIT_ERROR_ID`] when
    /// the write fails.
    pub fn record_audit(&self, entry: AuditLogEntry) -> String {
        let id = entry.id.clone();
        let mut log = self.audit.lock();
        log.push(entry);

        let doc = AuditDocument {
            entries: log.to_vec(),
        };
        if !persist(log.path.as_deref(), &doc) {
            return AUDIT_ERROR_ID.to_string();
        }
        id
    }

    /// Append a bypass attempt. Failures are logged, never raised.
    pub fn record_bypass(&self, attempt: BypassAttempt) {
        let mut log = self.bypass.lock();
        debug!(channel = %attempt.channel, source = %attempt.source, "recording bypass attempt");
        log.push(attempt);

        let doc = BypassDocument {
            bypass_attempts: log.to_vec(),
        };
        persist(log.path.as_deref(), &doc);
    }

    /// Enqueue a pending action created by a blocked decision, returning
    /// its id
    pub fn push_pending(&self, action: PendingAction) -> String {
        let id = action.id.clone();
        let mut log = self.pending.lock();
        log.push(action);

        let doc = PendingDocument {
            pending_actions: log.to_vec(),
        };
        persist(log.path.as_deref(), &doc);
        id
    }

    /// Confirm a pending action in place. Clearing an already-confirmed
    /// action reports [`ClearOutcome::AlreadyConfirmed`] and changes
    /// nothing; an unknown id is an error.
    pub fn clear_pending(
        &self,
        id: &str,
        method: ConfirmationMethod,
        operator: &str,
    ) -> Result<ClearOutcome> {
        let mut log = self.pending.lock();

        let action = log
            .entries
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| Error::store(format!("unknown pending action: {id}")))?;

        if action.status == PendingStatus::Confirmed {
            return Ok(ClearOutcome::AlreadyConfirmed);
        }

        action.confirm(method, operator);

        let doc = PendingDocument {
            pending_actions: log.to_vec(),
        };
        persist(log.path.as_deref(), &doc);
        Ok(ClearOutcome::Confirmed)
    }

    /// Snapshot of the audit log, oldest first
    pub fn audit_entries(&self) -> Vec<AuditLogEntry> {
        self.audit.lock().to_vec()
    }

    /// Snapshot of the bypass log, oldest first
    pub fn bypass_attempts(&self) -> Vec<BypassAttempt> {
        self.bypass.lock().to_vec()
    }

    /// Snapshot of the pending-action queue, oldest first
    pub fn pending_actions(&self) -> Vec<PendingAction> {
        self.pending.lock().to_vec()
    }

    /// Compute the statistics view over the current audit and bypass logs
    pub fn stats(&self) -> ComplianceStats {
        let entries = self.audit_entries();
        let bypass_count = self.bypass.lock().entries.len();
        ComplianceStats::compute(&entries, bypass_count)
    }
}

/// Read a persisted document; missing or malformed reads as the default
fn load_document<T: DeserializeOwned + Default>(path: Option<&Path>) -> T {
    let Some(path) = path else {
        return T::default();
    };

    match std::fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "malformed store document, starting empty");
                T::default()
            }
        },
        Err(_) => T::default(),
    }
}

/// Write a document; a failure is logged and reported as `false`
fn persist<T: Serialize>(path: Option<&Path>, value: &T) -> bool {
    let Some(path) = path else {
        return true;
    };

    let json = match serde_json::to_vec_pretty(value) {
        Ok(json) => json,
        Err(e) => {
            error!(path = %path.display(), error = %e, "could not serialize store document");
            return false;
        }
    };

    if let Err(e) = std::fs::write(path, json) {
        error!(path = %path.display(), error = %e, "could not write store document");
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use claimguard_core::{output_source, OutputChannel, OutputContext};
    use tempfile::TempDir;

    fn context() -> OutputContext {
        OutputContext::new(OutputChannel::ApiResponse, output_source!("test"))
    }

    fn entry(i: usize) -> AuditLogEntry {
        AuditLogEntry::from_decision(&format!("content {i}"), &context(), &[], &[], false)
    }

    #[test]
    fn test_audit_cap_evicts_oldest() {
        let store = ComplianceStore::in_memory();

        let mut first_ids = Vec::new();
        for i in 0..1005 {
            let id = store.record_audit(entry(i));
            if i < 5 {
                first_ids.push(id);
            }
        }

        let entries = store.audit_entries();
        assert_eq!(entries.len(), 1000);
        assert_eq!(entries[0].content_snippet, "content 5");
        for id in first_ids {
            assert!(!entries.iter().any(|e| e.id == id));
        }
    }

    #[test]
    fn test_pending_clear_is_idempotent_safe() {
        let store = ComplianceStore::in_memory();
        let id = store.push_pending(PendingAction::new(&[], "deployed", &context()));

        let first = store
            .clear_pending(&id, ConfirmationMethod::HumanConfirmation, "ops")
            .unwrap();
        assert_eq!(first, ClearOutcome::Confirmed);

        let second = store
            .clear_pending(&id, ConfirmationMethod::HumanConfirmation, "ops")
            .unwrap();
        assert_eq!(second, ClearOutcome::AlreadyConfirmed);

        // queue intact, entry still present and confirmed
        let actions = store.pending_actions();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].status, PendingStatus::Confirmed);
    }

    #[test]
    fn test_clear_unknown_pending_is_an_error() {
        let store = ComplianceStore::in_memory();
        let result = store.clear_pending("act_missing", ConfirmationMethod::HumanConfirmation, "ops");
        assert!(result.is_err());
    }

    #[test]
    fn test_pending_cap_drops_oldest_even_if_unconfirmed() {
        let store = ComplianceStore::in_memory();

        let first = store.push_pending(PendingAction::new(&[], "first", &context()));
        for i in 0..50 {
            store.push_pending(PendingAction::new(&[], &format!("later {i}"), &context()));
        }

        let actions = store.pending_actions();
        assert_eq!(actions.len(), 50);
        assert!(!actions.iter().any(|a| a.id == first));
    }

    #[test]
    fn test_persistence_round_trip() {
        let dir = TempDir::new().unwrap();
        let config = StoreConfig::persistent(dir.path());

        let pending_id;
        {
            let store = ComplianceStore::open(config.clone());
            store.record_audit(entry(1));
            pending_id = store.push_pending(PendingAction::new(&[], "deployed", &context()));
        }

        let reopened = ComplianceStore::open(config);
        assert_eq!(reopened.audit_entries().len(), 1);
        assert_eq!(reopened.pending_actions()[0].id, pending_id);
    }

    #[test]
    fn test_corrupt_document_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("compliance_audit.json"), "not json {").unwrap();

        let store = ComplianceStore::open(StoreConfig::persistent(dir.path()));
        assert!(store.audit_entries().is_empty());

        // and the store remains writable
        let id = store.record_audit(entry(1));
        assert!(id.starts_with("evt_"));
    }

    #[test]
    fn test_concurrent_appends_lose_nothing() {
        let store = std::sync::Arc::new(ComplianceStore::in_memory());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        store.record_audit(entry(i));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.audit_entries().len(), 400);
    }
}

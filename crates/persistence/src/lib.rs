#![deny(warnings)]

//! Persistence layer: key-value store collaborators and the bounded history
//! ledger of past valuation results.
//!
//! The ledger snapshots itself to a [`KeyValueStore`] after every mutation.
//! Store failures are logged and swallowed; the in-memory entries stay
//! authoritative for the rest of the session.

use directories::ProjectDirs;
use garden_core::{ValuationId, ValuationResult};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

const APP_QUALIFIER: &str = "com";
const APP_ORG: &str = "GardenCalc";
const APP_NAME: &str = "GardenCalc";

/// Fixed key the history snapshot lives under.
pub const HISTORY_KEY: &str = "valuation_history";

/// Default number of entries the ledger retains.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Errors produced by key-value store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No usable storage directory on this platform.
    #[error("storage directory unavailable")]
    Unavailable,
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// External key-value collaborator the ledger snapshots through.
///
/// Implementations store opaque strings under fixed keys; the ledger owns the
/// JSON encoding on top.
pub trait KeyValueStore {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write `value` under `key`, replacing any previous value.
    fn put(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// File-backed store: one `<key>.json` file per key under a root directory.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    /// Store under the platform config directory for this app.
    pub fn open() -> Result<Self, StoreError> {
        let dirs =
            ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME).ok_or(StoreError::Unavailable)?;
        Ok(Self {
            root: dirs.config_dir().to_path_buf(),
        })
    }

    /// Store under an explicit root directory.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.key_path(key)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root)?;
        fs::write(self.key_path(key), value)?;
        Ok(())
    }
}

/// Bounded log of past valuation results, newest first.
///
/// Capacity is fixed at construction; recording beyond it evicts the oldest
/// entries. Every mutation synchronously writes the full entry list as a JSON
/// array under [`HISTORY_KEY`].
#[derive(Debug)]
pub struct HistoryLedger<S: KeyValueStore> {
    store: S,
    entries: Vec<ValuationResult>,
    capacity: usize,
}

impl<S: KeyValueStore> HistoryLedger<S> {
    /// Open with the default capacity, restoring any previous snapshot.
    pub fn open(store: S) -> Self {
        Self::with_capacity(store, DEFAULT_HISTORY_CAPACITY)
    }

    /// Open with an explicit capacity, restoring any previous snapshot.
    ///
    /// A missing snapshot starts an empty ledger. A corrupt or unreadable one
    /// is logged and discarded rather than failing construction.
    pub fn with_capacity(store: S, capacity: usize) -> Self {
        let mut entries = Vec::new();
        match store.get(HISTORY_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<ValuationResult>>(&raw) {
                Ok(mut restored) => {
                    restored.truncate(capacity);
                    entries = restored;
                }
                Err(e) => warn!(error = %e, "discarding corrupt history snapshot"),
            },
            Ok(None) => {}
            Err(e) => warn!(error = %e, "history snapshot unreadable, starting empty"),
        }
        Self {
            store,
            entries,
            capacity,
        }
    }

    /// Prepend a result, evicting the oldest entries beyond capacity.
    pub fn record(&mut self, result: ValuationResult) {
        self.entries.insert(0, result);
        if self.entries.len() > self.capacity {
            self.entries.truncate(self.capacity);
        }
        self.persist();
    }

    /// Newest-first slice of up to `limit` entries (all when `None`).
    pub fn list(&self, limit: Option<usize>) -> &[ValuationResult] {
        let n = limit.unwrap_or(self.entries.len()).min(self.entries.len());
        &self.entries[..n]
    }

    /// Find an entry by its valuation id.
    pub fn get_by_id(&self, id: ValuationId) -> Option<&ValuationResult> {
        self.entries.iter().find(|r| r.id == id)
    }

    /// Remove an entry by id; persists immediately when something was removed.
    pub fn remove_by_id(&mut self, id: ValuationId) -> Option<ValuationResult> {
        let pos = self.entries.iter().position(|r| r.id == id)?;
        let removed = self.entries.remove(pos);
        self.persist();
        Some(removed)
    }

    /// Drop all entries and persist the empty snapshot.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.persist();
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is retained.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of retained entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The underlying store collaborator.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn persist(&mut self) {
        let json = match serde_json::to_string(&self.entries) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "history snapshot serialization failed");
                return;
            }
        };
        if let Err(e) = self.store.put(HISTORY_KEY, &json) {
            warn!(error = %e, "history snapshot write failed, keeping in-memory only");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use garden_core::{ItemId, ModifierSelection, ValuationResult};
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    fn result(seq: i64) -> ValuationResult {
        ValuationResult {
            id: ValuationId::new(),
            item_id: ItemId("carrot".to_string()),
            quantity: 1,
            selection: ModifierSelection::normal(),
            base_value: Decimal::new(100, 0),
            base_cost: Decimal::new(10, 0),
            total_multiplier: Decimal::ONE,
            total_bonus: Decimal::ZERO,
            final_value: Decimal::new(100, 0),
            total_cost: Decimal::new(10, 0),
            total_profit: Decimal::new(90, 0),
            roi: Decimal::new(900, 0),
            breakdown: vec![],
            timestamp_ms: seq,
        }
    }

    /// Store whose writes always fail, for the swallowed-error contract.
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Ok(None)
        }

        fn put(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable)
        }
    }

    #[test]
    fn record_keeps_newest_first_and_evicts_oldest() {
        let mut ledger = HistoryLedger::with_capacity(MemoryStore::new(), 3);
        for seq in 0..5 {
            ledger.record(result(seq));
        }
        assert_eq!(ledger.len(), 3);
        let stamps: Vec<i64> = ledger.list(None).iter().map(|r| r.timestamp_ms).collect();
        assert_eq!(stamps, vec![4, 3, 2]);
    }

    #[test]
    fn list_honors_limit() {
        let mut ledger = HistoryLedger::with_capacity(MemoryStore::new(), 10);
        for seq in 0..4 {
            ledger.record(result(seq));
        }
        assert_eq!(ledger.list(Some(2)).len(), 2);
        assert_eq!(ledger.list(Some(99)).len(), 4);
        assert_eq!(ledger.list(None).len(), 4);
    }

    #[test]
    fn get_and_remove_by_id() {
        let mut ledger = HistoryLedger::with_capacity(MemoryStore::new(), 10);
        let kept = result(1);
        let removed = result(2);
        let removed_id = removed.id;
        ledger.record(kept.clone());
        ledger.record(removed);
        assert!(ledger.get_by_id(kept.id).is_some());
        assert_eq!(ledger.remove_by_id(removed_id).unwrap().timestamp_ms, 2);
        assert!(ledger.get_by_id(removed_id).is_none());
        assert_eq!(ledger.len(), 1);
        assert!(ledger.remove_by_id(removed_id).is_none());
    }

    #[test]
    fn clear_persists_an_empty_snapshot() {
        let mut ledger = HistoryLedger::with_capacity(MemoryStore::new(), 10);
        ledger.record(result(1));
        ledger.clear();
        assert!(ledger.is_empty());
        let raw = ledger.store().get(HISTORY_KEY).unwrap().unwrap();
        assert_eq!(raw, "[]");
    }

    #[test]
    fn snapshot_restores_on_open() {
        let mut ledger = HistoryLedger::with_capacity(MemoryStore::new(), 5);
        for seq in 0..3 {
            ledger.record(result(seq));
        }
        let reopened = HistoryLedger::with_capacity(ledger.store().clone(), 5);
        assert_eq!(reopened.len(), 3);
        assert_eq!(reopened.list(None)[0].timestamp_ms, 2);
    }

    #[test]
    fn open_truncates_snapshots_beyond_capacity() {
        let mut ledger = HistoryLedger::with_capacity(MemoryStore::new(), 10);
        for seq in 0..6 {
            ledger.record(result(seq));
        }
        let reopened = HistoryLedger::with_capacity(ledger.store().clone(), 2);
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.list(None)[0].timestamp_ms, 5);
    }

    #[test]
    fn corrupt_snapshot_starts_empty() {
        let mut store = MemoryStore::new();
        store.put(HISTORY_KEY, "not json at all").unwrap();
        let ledger = HistoryLedger::with_capacity(store, 5);
        assert!(ledger.is_empty());
    }

    #[test]
    fn failed_writes_leave_memory_authoritative() {
        let mut ledger = HistoryLedger::with_capacity(BrokenStore, 5);
        ledger.record(result(1));
        ledger.record(result(2));
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.list(None)[0].timestamp_ms, 2);
    }

    #[test]
    fn file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::with_root(dir.path());
        assert!(store.get("missing").unwrap().is_none());
        store.put("sample", "{\"ok\":true}").unwrap();
        assert_eq!(store.get("sample").unwrap().unwrap(), "{\"ok\":true}");
    }

    #[test]
    fn ledger_survives_reopen_through_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut ledger = HistoryLedger::with_capacity(JsonFileStore::with_root(dir.path()), 4);
        for seq in 0..3 {
            ledger.record(result(seq));
        }
        drop(ledger);
        let reopened = HistoryLedger::with_capacity(JsonFileStore::with_root(dir.path()), 4);
        assert_eq!(reopened.len(), 3);
        assert_eq!(reopened.list(None)[0].timestamp_ms, 2);
    }

    proptest! {
        #[test]
        fn eviction_caps_length(capacity in 1usize..10, extra in 1usize..20) {
            let mut ledger = HistoryLedger::with_capacity(MemoryStore::new(), capacity);
            for seq in 0..(capacity + extra) {
                ledger.record(result(seq as i64));
            }
            prop_assert_eq!(ledger.len(), capacity);
            prop_assert_eq!(
                ledger.list(None)[0].timestamp_ms,
                (capacity + extra - 1) as i64
            );
        }
    }
}

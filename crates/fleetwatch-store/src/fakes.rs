//! In-memory fakes for `LogStore` (testing only)
//!
//! Provides `MemoryLogStore`, `UnavailableLogStore` and `DelayedLogStore`
//! that satisfy the trait contract without any external dependencies.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::schema::{FleetId, LogEntry};
use crate::storage_traits::*;

// ---------------------------------------------------------------------------
// MemoryLogStore
// ---------------------------------------------------------------------------

/// In-memory log collection backed by a `Vec<LogEntry>`.
///
/// Returns entries in reverse insertion order so callers cannot rely on
/// the store for chronological ordering.
#[derive(Debug, Default)]
pub struct MemoryLogStore {
    entries: Mutex<Vec<LogEntry>>,
    fetches: AtomicUsize,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-loaded with `entries`.
    pub fn with_entries(entries: impl IntoIterator<Item = LogEntry>) -> Self {
        let store = Self::new();
        for entry in entries {
            store.insert(entry);
        }
        store
    }

    /// Add a document, assigning a random key when it has none.
    pub fn insert(&self, mut entry: LogEntry) -> String {
        let id = entry
            .id
            .get_or_insert_with(|| uuid::Uuid::new_v4().to_string())
            .clone();
        self.entries.lock().unwrap().push(entry);
        id
    }

    /// Number of `fetch_logs` calls served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LogStore for MemoryLogStore {
    async fn fetch_logs(&self, fleet_id: &FleetId) -> StoreResult<Vec<LogEntry>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let entries = self.entries.lock().unwrap();
        Ok(entries
            .iter()
            .rev()
            .filter(|e| e.belongs_to(fleet_id))
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// UnavailableLogStore
// ---------------------------------------------------------------------------

/// A store whose transport is always down.
#[derive(Debug, Clone)]
pub struct UnavailableLogStore {
    reason: String,
}

impl UnavailableLogStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Default for UnavailableLogStore {
    fn default() -> Self {
        Self::new("connection refused")
    }
}

#[async_trait]
impl LogStore for UnavailableLogStore {
    async fn fetch_logs(&self, _fleet_id: &FleetId) -> StoreResult<Vec<LogEntry>> {
        Err(StoreError::Unavailable(self.reason.clone()))
    }
}

// ---------------------------------------------------------------------------
// DelayedLogStore
// ---------------------------------------------------------------------------

/// Wraps another store and sleeps before every read.
///
/// Pair with `tokio::time::pause` to exercise deadlines deterministically.
#[derive(Debug)]
pub struct DelayedLogStore<S> {
    inner: S,
    delay: Duration,
}

impl<S: LogStore> DelayedLogStore<S> {
    pub fn new(inner: S, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl<S: LogStore> LogStore for DelayedLogStore<S> {
    async fn fetch_logs(&self, fleet_id: &FleetId) -> StoreResult<Vec<LogEntry>> {
        tokio::time::sleep(self.delay).await;
        self.inner.fetch_logs(fleet_id).await
    }
}

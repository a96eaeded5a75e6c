//! Storage trait definitions for the maintenance log
//!
//! `LogStore` is the only read path the analytics kernel uses. It is async
//! and backend-agnostic; an in-memory fake is provided for testing via the
//! `fakes` module.

use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::error::StoreError;
use crate::schema::{FleetId, LogEntry};

/// Result type for storage operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Read-only, fleet-scoped access to stored log entries.
///
/// Guarantees:
/// - `fetch_logs(fleet)` returns every stored entry whose `fleetId` equals
///   `fleet`, and nothing else.
/// - Ordering of the returned entries is unspecified.
/// - No field other than `fleetId` is interpreted.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Fetch all log entries of a fleet.
    async fn fetch_logs(&self, fleet_id: &FleetId) -> StoreResult<Vec<LogEntry>>;
}

#[async_trait]
impl<T: LogStore + ?Sized> LogStore for std::sync::Arc<T> {
    async fn fetch_logs(&self, fleet_id: &FleetId) -> StoreResult<Vec<LogEntry>> {
        (**self).fetch_logs(fleet_id).await
    }
}

/// Fetch a fleet's entries under a request-level deadline.
///
/// Expiry surfaces as [`StoreError::Timeout`]; the in-flight read is dropped
/// and nothing partial is returned.
pub async fn fetch_logs_with_deadline<S>(
    store: &S,
    fleet_id: &FleetId,
    deadline: Duration,
) -> StoreResult<Vec<LogEntry>>
where
    S: LogStore + ?Sized,
{
    match tokio::time::timeout(deadline, store.fetch_logs(fleet_id)).await {
        Ok(result) => result,
        Err(_) => {
            warn!(fleet_id = %fleet_id, deadline_ms = deadline.as_millis() as u64, "log fetch timed out");
            Err(StoreError::Timeout(deadline))
        }
    }
}

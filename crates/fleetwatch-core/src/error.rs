//! Error taxonomy for the dashboard kernel.
//!
//! Store failures never cross the presentation boundary as errors; the
//! dashboard turns them into [`crate::Outcome::Unavailable`]. What remains
//! here are construction-time mistakes (bad config, bad session) and the
//! per-entry normalization failure, which is only ever counted.

use fleetwatch_store::StoreError;

use crate::normalize::DropReason;

/// Dashboard construction and request errors.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid session: {0}")]
    InvalidSession(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// A single log record that failed normalization.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed entry {}: {reason}", id.as_deref().unwrap_or("<no id>"))]
pub struct MalformedEntry {
    pub id: Option<String>,
    pub reason: DropReason,
}

/// Result type for dashboard operations.
pub type Result<T> = std::result::Result<T, DashboardError>;

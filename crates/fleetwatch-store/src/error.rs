//! Error types for fleetwatch-store

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while reading the maintenance log.
///
/// Every variant is a flavour of "the store could not be read"; the
/// presentation layer collapses them into a single unavailable state.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Connection or authentication failure
    #[error("Log store unavailable: {0}")]
    Unavailable(String),

    /// The request-level deadline expired before the store answered
    #[error("Log store did not answer within {0:?}")]
    Timeout(Duration),

    /// The credentials secret could not be read or parsed
    #[error("Invalid store credentials: {0}")]
    Credentials(String),

    /// Schema setup error
    #[error("Schema setup failed: {0}")]
    Schema(String),

    /// Query error reported by the backend
    #[error("Log store query failed: {0}")]
    Backend(String),

    /// A stored document could not be decoded as a log entry
    #[error("Failed to decode log document: {0}")]
    Decode(String),
}

impl StoreError {
    /// Short machine-readable label, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::Unavailable(_) => "unavailable",
            StoreError::Timeout(_) => "timeout",
            StoreError::Credentials(_) => "credentials",
            StoreError::Schema(_) => "schema",
            StoreError::Backend(_) => "backend",
            StoreError::Decode(_) => "decode",
        }
    }
}

impl From<surrealdb::Error> for StoreError {
    fn from(err: surrealdb::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_distinct() {
        let errors = [
            StoreError::Unavailable("refused".into()),
            StoreError::Timeout(Duration::from_secs(3)),
            StoreError::Credentials("bad json".into()),
            StoreError::Schema("define failed".into()),
            StoreError::Backend("parse error".into()),
            StoreError::Decode("expected object".into()),
        ];
        let kinds: std::collections::BTreeSet<_> = errors.iter().map(StoreError::kind).collect();
        assert_eq!(kinds.len(), errors.len());
    }

    #[test]
    fn serde_errors_become_decode_failures() {
        let err: StoreError = serde_json::from_str::<u32>("\"x\"").unwrap_err().into();
        assert!(matches!(err, StoreError::Decode(_)));
    }

    #[test]
    fn timeout_display_mentions_deadline() {
        let err = StoreError::Timeout(Duration::from_millis(250));
        assert!(err.to_string().contains("250ms"));
    }
}

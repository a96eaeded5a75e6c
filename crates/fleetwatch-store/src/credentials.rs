//! Store credentials
//!
//! Credentials are delivered out-of-band as an opaque JSON secret holding a
//! service-account key. The only environment variable the system reads is
//! the one carrying that secret.

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Environment variable carrying the credentials secret.
pub const SECRET_ENV_VAR: &str = "FLEETWATCH_STORE_SECRET";

/// Service-account key for the log store.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreCredentials {
    /// Where the log store listens, `ws://` or `wss://`.
    pub endpoint: String,
    pub username: String,
    pub password: String,
    /// Overrides the `artifacts` namespace of the collection path.
    #[serde(default)]
    pub namespace: Option<String>,
    /// Overrides the database, which otherwise is the deployment's app id.
    #[serde(default)]
    pub database: Option<String>,
    /// The account signs in at root level instead of into one database.
    #[serde(default)]
    pub root: bool,
}

impl std::fmt::Debug for StoreCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreCredentials")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("namespace", &self.namespace)
            .field("database", &self.database)
            .field("root", &self.root)
            .finish()
    }
}

impl StoreCredentials {
    /// Database-level service account.
    pub fn new(
        endpoint: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            username: username.into(),
            password: password.into(),
            namespace: None,
            database: None,
            root: false,
        }
    }

    pub fn with_root(mut self, root: bool) -> Self {
        self.root = root;
        self
    }

    /// Parse the opaque JSON secret.
    pub fn from_secret(secret: &str) -> Result<Self, StoreError> {
        let creds: StoreCredentials = serde_json::from_str(secret)
            .map_err(|e| StoreError::Credentials(format!("malformed secret: {e}")))?;
        if creds.endpoint.trim().is_empty() {
            return Err(StoreError::Credentials("endpoint is empty".to_string()));
        }
        if creds.username.trim().is_empty() {
            return Err(StoreError::Credentials("username is empty".to_string()));
        }
        Ok(creds)
    }

    /// Read the secret from [`SECRET_ENV_VAR`].
    pub fn from_env() -> Result<Self, StoreError> {
        match std::env::var(SECRET_ENV_VAR) {
            Ok(secret) => Self::from_secret(&secret),
            Err(std::env::VarError::NotPresent) => Err(StoreError::Credentials(format!(
                "{SECRET_ENV_VAR} is not set"
            ))),
            Err(e) => Err(StoreError::Credentials(format!("{SECRET_ENV_VAR}: {e}"))),
        }
    }
}

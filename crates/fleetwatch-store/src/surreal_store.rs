//! SurrealDB-backed LogStore implementation
//!
//! The connection is process-wide and opened at most once: the first caller
//! of [`SurrealLogStore::connection`] wins, and every later caller (including
//! concurrent ones) observes the same handle.

use async_trait::async_trait;
use serde_json::Value as Json;
use surrealdb::engine::any::Any;
use surrealdb::opt::auth::{Database, Root};
use surrealdb::Surreal;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};

use crate::credentials::StoreCredentials;
use crate::error::StoreError;
use crate::migrations;
use crate::schema::{CollectionPath, FleetId, LogEntry, FLEET_FIELD};
use crate::storage_traits::{LogStore, StoreResult};

/// Alias under which the document key is projected out of a record id.
const KEY_ALIAS: &str = "__doc_key";

#[derive(Debug, Clone)]
enum Target {
    Memory,
    Remote(StoreCredentials),
}

impl Target {
    fn endpoint(&self) -> &str {
        match self {
            Target::Memory => "mem://",
            Target::Remote(creds) => &creds.endpoint,
        }
    }
}

/// SurrealDB-backed implementation of [`LogStore`].
pub struct SurrealLogStore {
    target: Target,
    path: CollectionPath,
    db: OnceCell<Surreal<Any>>,
}

impl SurrealLogStore {
    /// Prepare a store for `credentials` without touching the network.
    ///
    /// The connection is opened by the first read.
    pub fn lazy(credentials: StoreCredentials, app_id: impl Into<String>) -> Self {
        Self::with_target(Target::Remote(credentials), app_id)
    }

    /// In-memory engine, opened by the first read. Development and tests only.
    pub fn lazy_in_memory(app_id: impl Into<String>) -> Self {
        Self::with_target(Target::Memory, app_id)
    }

    fn with_target(target: Target, app_id: impl Into<String>) -> Self {
        Self {
            target,
            path: CollectionPath::new(app_id),
            db: OnceCell::new(),
        }
    }

    /// Explicit constructor: open the connection now.
    pub async fn connect(
        credentials: StoreCredentials,
        app_id: impl Into<String>,
    ) -> StoreResult<Self> {
        let store = Self::lazy(credentials, app_id);
        store.connection().await?;
        Ok(store)
    }

    /// Create an in-memory instance for testing.
    pub async fn in_memory(app_id: impl Into<String>) -> StoreResult<Self> {
        let store = Self::lazy_in_memory(app_id);
        store.connection().await?;
        Ok(store)
    }

    /// Create from the credentials secret in the environment.
    ///
    /// Build it once at process start and share it (`Arc`) between
    /// sessions. A missing secret is a [`StoreError::Credentials`].
    pub async fn from_env(app_id: impl Into<String>) -> StoreResult<Self> {
        let credentials = StoreCredentials::from_env()?;
        Self::connect(credentials, app_id).await
    }

    /// The collection this store reads.
    pub fn collection(&self) -> &CollectionPath {
        &self.path
    }

    /// Whether the connection has been opened.
    pub fn is_connected(&self) -> bool {
        self.db.initialized()
    }

    /// Shared connection, opened on first use.
    pub async fn connection(&self) -> StoreResult<&Surreal<Any>> {
        self.db
            .get_or_try_init(|| open(&self.target, &self.path))
            .await
    }

    /// Bulk-load raw documents.
    ///
    /// No validation is applied. Meant for fixtures and back-fills, not for
    /// registering repairs.
    #[instrument(skip(self, entries), fields(collection = %self.path))]
    pub async fn seed(&self, entries: Vec<LogEntry>) -> StoreResult<usize> {
        let db = self.connection().await?;
        let count = entries.len();

        for mut entry in entries {
            let key = entry.id.take();
            let doc = serde_json::to_value(&entry)?;
            let table = self.path.table().to_string();

            let res = match key {
                Some(key) => {
                    db.query("CREATE type::thing($table, $key) CONTENT $doc")
                        .bind(("table", table))
                        .bind(("key", key))
                        .bind(("doc", doc))
                        .await
                }
                None => {
                    db.query("CREATE type::table($table) CONTENT $doc")
                        .bind(("table", table))
                        .bind(("doc", doc))
                        .await
                }
            };
            res.map_err(|e| StoreError::Backend(e.to_string()))?
                .check()
                .map_err(|e| StoreError::Backend(e.to_string()))?;
        }

        debug!(count, "seeded log documents");
        Ok(count)
    }

    /// Turn a raw row into a `LogEntry`, restoring the document key.
    fn row_to_entry(row: Json) -> StoreResult<LogEntry> {
        let Json::Object(mut obj) = row else {
            return Err(StoreError::Decode(format!("expected object, got {row}")));
        };
        obj.remove("id");
        if let Some(key) = obj.remove(KEY_ALIAS) {
            let key = match key {
                Json::String(s) => s,
                other => other.to_string(),
            };
            obj.insert("id".to_string(), Json::String(key));
        }
        Ok(serde_json::from_value(Json::Object(obj))?)
    }
}

async fn open(target: &Target, path: &CollectionPath) -> StoreResult<Surreal<Any>> {
    let endpoint = target.endpoint();
    info!(endpoint = %endpoint, collection = %path, "Connecting to log store");

    let db = surrealdb::engine::any::connect(endpoint)
        .await
        .map_err(|e| StoreError::Unavailable(format!("Failed to connect to {endpoint}: {e}")))?;

    if let Target::Remote(creds) = target {
        let namespace = creds.namespace.as_deref().unwrap_or(path.namespace());
        let database = creds.database.as_deref().unwrap_or(path.database());
        if creds.root {
            db.signin(Root {
                username: &creds.username,
                password: &creds.password,
            })
            .await
            .map_err(|e| StoreError::Unavailable(format!("Root authentication failed: {e}")))?;
        } else {
            db.signin(Database {
                namespace,
                database,
                username: &creds.username,
                password: &creds.password,
            })
            .await
            .map_err(|e| StoreError::Unavailable(format!("Database authentication failed: {e}")))?;
        }
        db.use_ns(namespace)
            .use_db(database)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
    } else {
        db.use_ns(path.namespace())
            .use_db(path.database())
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
    }

    migrations::init_schema(&db, path).await?;
    info!(collection = %path, "Log store connected");
    Ok(db)
}

#[async_trait]
impl LogStore for SurrealLogStore {
    #[instrument(skip(self), fields(collection = %self.path))]
    async fn fetch_logs(&self, fleet_id: &FleetId) -> StoreResult<Vec<LogEntry>> {
        let db = self.connection().await?;

        let sql = format!(
            "SELECT *, meta::id(id) AS {KEY_ALIAS} FROM type::table($table) WHERE {FLEET_FIELD} = $fleet"
        );
        let mut res = db
            .query(sql)
            .bind(("table", self.path.table().to_string()))
            .bind(("fleet", fleet_id.as_str().to_string()))
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let rows: surrealdb::Value = res.take(0)?;
        let rows = match rows.into_inner().into_json() {
            Json::Array(rows) => rows,
            Json::Null => Vec::new(),
            other => return Err(StoreError::Decode(format!("expected row list, got {other}"))),
        };

        let entries = rows
            .into_iter()
            .map(Self::row_to_entry)
            .collect::<StoreResult<Vec<_>>>()?;
        debug!(count = entries.len(), "fetched log documents");
        Ok(entries)
    }
}

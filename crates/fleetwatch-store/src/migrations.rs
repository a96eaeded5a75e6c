//! SurrealDB schema initialization for the log collection
//!
//! The collection is written by the data-entry side of the workshop; this
//! module only makes sure the table and the fleet index exist so the
//! fleet-scoped read is an index lookup.

use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::schema::{CollectionPath, FLEET_FIELD};
use crate::storage_traits::StoreResult;

/// Initialize the collection's table.
///
/// Schema:
/// ```text
/// TABLE logs {
///   fleetId:     STRING (indexed)
///   bus:         ANY    (string or number)
///   category:    ANY
///   km_current:  ANY    (numeric-coercible)
///   km_next:     ANY    (numeric-coercible)
///   date:        ANY    (string or timestamp object)
///   ...          free fields (mechanic, parts, cost)
/// }
/// ```
///
/// Safe to call multiple times (idempotent). Deletes are not permitted:
/// entries are never removed once recorded.
pub async fn init_schema(db: &Surreal<Any>, path: &CollectionPath) -> StoreResult<()> {
    debug!(collection = %path, "Initializing log collection");

    let sql = schema_sql(path.table());
    db.query(sql)
        .await
        .map_err(|e| StoreError::Schema(e.to_string()))?
        .check()
        .map_err(|e| StoreError::Schema(e.to_string()))?;

    info!(collection = %path, "✓ {} table initialized", path.table());
    Ok(())
}

fn schema_sql(table: &str) -> String {
    format!(
        r#"
        DEFINE TABLE IF NOT EXISTS {table}
            SCHEMALESS
            PERMISSIONS
                FOR select FULL
                FOR create FULL
                FOR update NONE
                FOR delete NONE;

        -- Every read is scoped to one fleet
        DEFINE INDEX IF NOT EXISTS idx_{table}_fleet ON TABLE {table} COLUMNS {FLEET_FIELD};

        -- Plan views look up one bus inside a fleet
        DEFINE INDEX IF NOT EXISTS idx_{table}_fleet_bus ON TABLE {table} COLUMNS {FLEET_FIELD}, bus;
    "#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_targets_collection_table() {
        let sql = schema_sql(CollectionPath::new("app").table());
        assert!(sql.contains("DEFINE TABLE IF NOT EXISTS logs\n"));
        assert!(sql.contains("idx_logs_fleet ON TABLE logs COLUMNS fleetId;"));
        assert!(sql.contains("FOR select FULL"));
        assert!(!sql.contains(" AS"));
    }
}

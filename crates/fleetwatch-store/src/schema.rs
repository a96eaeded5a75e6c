//! Document shapes for the maintenance log collection
//!
//! Collection:
//! - `artifacts/<APP_ID>/public/data/logs`: one document per recorded
//!   intervention on one bus for one component category.
//!
//! Documents are written by the data-entry side of the workshop and are not
//! trusted to be well typed. Every interpreted field is therefore kept as a
//! raw JSON value here and coerced later by the normalization pipeline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Name of the field the store filters on.
pub const FLEET_FIELD: &str = "fleetId";

/// Fleet identifier; the unit of authorization.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FleetId(String);

impl FleetId {
    pub fn new(id: impl Into<String>) -> Self {
        FleetId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FleetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FleetId {
    fn from(s: &str) -> Self {
        FleetId(s.to_string())
    }
}

/// A maintenance log document exactly as stored.
///
/// `id` comes from the document key, not the body. Free fields such as
/// mechanic, parts or cost are carried untouched in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "fleetId", default, skip_serializing_if = "Option::is_none")]
    pub fleet_id: Option<String>,

    /// Bus identifier; some writers store it as a number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bus: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<serde_json::Value>,

    /// Odometer reading at the intervention (numeric-coercible).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub km_current: Option<serde_json::Value>,

    /// Odometer reading at which the next intervention is due (numeric-coercible).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub km_next: Option<serde_json::Value>,

    /// Intervention timestamp: a string or a `{seconds, nanoseconds}` object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<serde_json::Value>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl LogEntry {
    /// Build an entry from the fields the analytics kernel reads.
    pub fn new(
        fleet_id: &FleetId,
        bus: impl Into<serde_json::Value>,
        category: impl Into<serde_json::Value>,
        km_current: impl Into<serde_json::Value>,
        km_next: impl Into<serde_json::Value>,
        date: impl Into<serde_json::Value>,
    ) -> Self {
        LogEntry {
            id: None,
            fleet_id: Some(fleet_id.as_str().to_string()),
            bus: Some(bus.into()),
            category: Some(category.into()),
            km_current: Some(km_current.into()),
            km_next: Some(km_next.into()),
            date: Some(date.into()),
            extra: BTreeMap::new(),
        }
    }

    /// Set the document key.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Attach an uninterpreted free field.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// True when the document belongs to `fleet`.
    pub fn belongs_to(&self, fleet: &FleetId) -> bool {
        self.fleet_id.as_deref() == Some(fleet.as_str())
    }
}

/// Location of the log collection for one deployment.
///
/// The document path `artifacts/<APP_ID>/public/data/logs` is mapped onto
/// SurrealDB as namespace `artifacts`, database `<APP_ID>`, table `logs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionPath {
    app_id: String,
}

impl CollectionPath {
    pub const NAMESPACE: &'static str = "artifacts";
    pub const TABLE: &'static str = "logs";

    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        Self::NAMESPACE
    }

    pub fn database(&self) -> &str {
        &self.app_id
    }

    pub fn table(&self) -> &str {
        Self::TABLE
    }
}

impl std::fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/public/data/{}",
            Self::NAMESPACE,
            self.app_id,
            Self::TABLE
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn collection_path_display() {
        let path = CollectionPath::new("taller-central");
        assert_eq!(path.to_string(), "artifacts/taller-central/public/data/logs");
        assert_eq!(path.database(), "taller-central");
    }

    #[test]
    fn log_entry_keeps_free_fields() {
        let doc = json!({
            "fleetId": "f1",
            "bus": 7,
            "category": "brakes",
            "km_current": "10000",
            "km_next": 15000,
            "date": "2024-01-01",
            "mechanic": "Rosa",
            "cost": 120.5
        });
        let entry: LogEntry = serde_json::from_value(doc).unwrap();
        assert_eq!(entry.fleet_id.as_deref(), Some("f1"));
        assert_eq!(entry.bus, Some(json!(7)));
        assert_eq!(entry.extra.get("mechanic"), Some(&json!("Rosa")));
        assert_eq!(entry.extra.len(), 2);
    }

    #[test]
    fn log_entry_tolerates_missing_fields() {
        let entry: LogEntry = serde_json::from_value(json!({"fleetId": "f1"})).unwrap();
        assert!(entry.bus.is_none());
        assert!(entry.km_next.is_none());
        assert!(entry.belongs_to(&FleetId::from("f1")));
        assert!(!entry.belongs_to(&FleetId::from("f2")));
    }

    #[test]
    fn fleet_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&FleetId::new("north")).unwrap();
        assert_eq!(json, "\"north\"");
    }
}

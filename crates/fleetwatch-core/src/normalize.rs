//! Normalization pipeline: raw log documents to typed entries.
//!
//! Rules:
//! - `km_current`, `km_next`: numeric parse, anything else becomes `0`.
//! - `date`: parsed in the fleet's civil time; unparseable drops the entry.
//! - `bus`, `category`: trimmed; empty drops the entry.
//! - `fleetId` different from the session's fleet drops the entry.
//!
//! Nothing here fails. Dropped entries and repaired fields are tallied in
//! [`Diagnostics`] for the UI shell to show if it wants to.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use fleetwatch_store::{FleetId, LogEntry};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::MalformedEntry;

/// Serialization format used when a normalized date is written back out.
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

/// A log entry with guaranteed types.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedEntry {
    pub id: Option<String>,
    #[serde(rename = "fleetId")]
    pub fleet_id: FleetId,
    pub bus: String,
    pub category: String,
    /// Non-negative odometer reading at the intervention.
    pub km_current: f64,
    /// Non-negative odometer reading at which the next change is due.
    pub km_next: f64,
    /// Fleet-local civil time.
    pub date: NaiveDateTime,
    /// Free fields, carried but never interpreted.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

impl From<&NormalizedEntry> for LogEntry {
    fn from(entry: &NormalizedEntry) -> Self {
        LogEntry {
            id: entry.id.clone(),
            fleet_id: Some(entry.fleet_id.as_str().to_string()),
            bus: Some(Value::String(entry.bus.clone())),
            category: Some(Value::String(entry.category.clone())),
            km_current: Some(km_value(entry.km_current)),
            km_next: Some(km_value(entry.km_next)),
            date: Some(Value::String(entry.date.format(DATE_FORMAT).to_string())),
            extra: entry.extra.clone(),
        }
    }
}

fn km_value(km: f64) -> Value {
    serde_json::Number::from_f64(km)
        .map(Value::Number)
        .unwrap_or_else(|| Value::from(0))
}

/// Why an entry was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    FleetMismatch,
    MissingBus,
    MissingCategory,
    InvalidDate,
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DropReason::FleetMismatch => "fleet mismatch",
            DropReason::MissingBus => "missing bus",
            DropReason::MissingCategory => "missing category",
            DropReason::InvalidDate => "unparseable date",
        };
        f.write_str(s)
    }
}

/// Per-request tally of what normalization did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub received: usize,
    pub kept: usize,
    pub dropped: BTreeMap<DropReason, usize>,
    /// km fields that were absent, unparseable or negative and became `0`.
    pub repaired_km_fields: usize,
}

impl Diagnostics {
    pub fn dropped_total(&self) -> usize {
        self.dropped.values().sum()
    }

    pub fn dropped_for(&self, reason: DropReason) -> usize {
        self.dropped.get(&reason).copied().unwrap_or(0)
    }

    fn record_drop(&mut self, reason: DropReason) {
        *self.dropped.entry(reason).or_insert(0) += 1;
    }
}

/// Output of one normalization pass.
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub entries: Vec<NormalizedEntry>,
    pub diagnostics: Diagnostics,
}

/// Normalizes raw entries for one fleet.
#[derive(Debug, Clone)]
pub struct Normalizer {
    fleet_id: FleetId,
    offset: FixedOffset,
}

impl Normalizer {
    pub fn new(fleet_id: FleetId, offset: FixedOffset) -> Self {
        Self { fleet_id, offset }
    }

    /// Normalize a batch. Output order follows input order for kept entries.
    pub fn normalize<I>(&self, raw: I) -> NormalizedBatch
    where
        I: IntoIterator<Item = LogEntry>,
    {
        let mut batch = NormalizedBatch::default();
        for entry in raw {
            batch.diagnostics.received += 1;
            match self.normalize_entry(entry) {
                Ok((normalized, repairs)) => {
                    batch.diagnostics.repaired_km_fields += repairs;
                    batch.entries.push(normalized);
                }
                Err(malformed) => {
                    debug!(error = %malformed, "dropping log entry");
                    batch.diagnostics.record_drop(malformed.reason);
                }
            }
        }
        batch.diagnostics.kept = batch.entries.len();
        batch
    }

    /// Normalize one entry, returning it with the number of repaired km fields.
    pub fn normalize_entry(
        &self,
        entry: LogEntry,
    ) -> std::result::Result<(NormalizedEntry, usize), MalformedEntry> {
        let malformed = |reason| MalformedEntry {
            id: entry.id.clone(),
            reason,
        };

        if !entry.belongs_to(&self.fleet_id) {
            return Err(malformed(DropReason::FleetMismatch));
        }
        let bus = entry
            .bus
            .as_ref()
            .and_then(coerce_label)
            .ok_or_else(|| malformed(DropReason::MissingBus))?;
        let category = entry
            .category
            .as_ref()
            .and_then(coerce_label)
            .ok_or_else(|| malformed(DropReason::MissingCategory))?;
        let date = entry
            .date
            .as_ref()
            .and_then(|d| parse_date(d, &self.offset))
            .ok_or_else(|| malformed(DropReason::InvalidDate))?;

        let km_current = parse_km(entry.km_current.as_ref());
        let km_next = parse_km(entry.km_next.as_ref());
        let repairs = usize::from(km_current.is_none()) + usize::from(km_next.is_none());

        Ok((
            NormalizedEntry {
                id: entry.id,
                fleet_id: self.fleet_id.clone(),
                bus,
                category,
                km_current: km_current.unwrap_or(0.0),
                km_next: km_next.unwrap_or(0.0),
                date,
                extra: entry.extra,
            },
            repairs,
        ))
    }
}

/// Trimmed, non-empty label from a string or number.
///
/// Integral numbers render without a fraction so bus `7` and `"7"` agree.
pub fn coerce_label(value: &Value) -> Option<String> {
    let label = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (_, Some(u), _) => u.to_string(),
            (_, _, Some(f)) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        _ => return None,
    };
    (!label.is_empty()).then_some(label)
}

/// Non-negative finite kilometers, or `None` when the value must be repaired.
pub fn parse_km(value: Option<&Value>) -> Option<f64> {
    let km = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (km.is_finite() && km >= 0.0).then_some(km)
}

/// Parse a timestamp into the fleet's civil time.
///
/// Accepts RFC 3339 (converted to `offset`), naive date-times and dates
/// (taken as local), and document-store timestamp objects
/// `{seconds, nanoseconds}` / `{_seconds, _nanoseconds}`.
pub fn parse_date(value: &Value, offset: &FixedOffset) -> Option<NaiveDateTime> {
    match value {
        Value::String(s) => parse_date_str(s.trim(), offset),
        Value::Object(obj) => {
            let seconds = obj
                .get("seconds")
                .or_else(|| obj.get("_seconds"))
                .and_then(Value::as_i64)?;
            let nanos = obj
                .get("nanoseconds")
                .or_else(|| obj.get("_nanoseconds"))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            let utc = DateTime::from_timestamp(seconds, u32::try_from(nanos).ok()?)?;
            Some(utc.with_timezone(offset).naive_local())
        }
        _ => None,
    }
}

fn parse_date_str(s: &str, offset: &FixedOffset) -> Option<NaiveDateTime> {
    if s.is_empty() {
        return None;
    }
    if let Ok(zoned) = DateTime::parse_from_rfc3339(s) {
        return Some(zoned.with_timezone(offset).naive_local());
    }
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NAIVE_DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fleet() -> FleetId {
        FleetId::new("north")
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn normalizer() -> Normalizer {
        Normalizer::new(fleet(), utc())
    }

    fn at(date: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(date, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_parse_km_variants() {
        assert_eq!(parse_km(Some(&json!(12000))), Some(12000.0));
        assert_eq!(parse_km(Some(&json!(" 12400.5 "))), Some(12400.5));
        assert_eq!(parse_km(Some(&json!("abc"))), None);
        assert_eq!(parse_km(Some(&json!(-5))), None);
        assert_eq!(parse_km(Some(&json!("NaN"))), None);
        assert_eq!(parse_km(Some(&json!(null))), None);
        assert_eq!(parse_km(None), None);
    }

    #[test]
    fn test_coerce_label_variants() {
        assert_eq!(coerce_label(&json!(" 01 ")), Some("01".into()));
        assert_eq!(coerce_label(&json!(7)), Some("7".into()));
        assert_eq!(coerce_label(&json!(7.0)), Some("7".into()));
        assert_eq!(coerce_label(&json!("   ")), None);
        assert_eq!(coerce_label(&json!(true)), None);
    }

    #[test]
    fn test_parse_date_shapes() {
        let off = utc();
        assert_eq!(parse_date(&json!("2024-01-01"), &off), Some(at("2024-01-01 00:00:00")));
        assert_eq!(parse_date(&json!("01/03/2024"), &off), Some(at("2024-03-01 00:00:00")));
        assert_eq!(
            parse_date(&json!("2024-01-01T08:30:00"), &off),
            Some(at("2024-01-01 08:30:00"))
        );
        assert_eq!(
            parse_date(&json!("2024-01-01 08:30:00"), &off),
            Some(at("2024-01-01 08:30:00"))
        );
        assert_eq!(
            parse_date(&json!({"seconds": 1704067200, "nanoseconds": 0}), &off),
            Some(at("2024-01-01 00:00:00"))
        );
        assert_eq!(
            parse_date(&json!({"_seconds": 1704067200}), &off),
            Some(at("2024-01-01 00:00:00"))
        );
        assert_eq!(parse_date(&json!("yesterday"), &off), None);
        assert_eq!(parse_date(&json!(""), &off), None);
        assert_eq!(parse_date(&json!(1704067200), &off), None);
    }

    #[test]
    fn test_zoned_dates_convert_to_fleet_time() {
        let minus_three = FixedOffset::west_opt(3 * 3600).unwrap();
        assert_eq!(
            parse_date(&json!("2024-01-01T12:00:00Z"), &minus_three),
            Some(at("2024-01-01 09:00:00"))
        );
        // Naive values are already local.
        assert_eq!(
            parse_date(&json!("2024-01-01T12:00:00"), &minus_three),
            Some(at("2024-01-01 12:00:00"))
        );
    }

    #[test]
    fn test_normalize_keeps_valid_entry() {
        let raw = LogEntry::new(&fleet(), " 01 ", " brakes ", "10000", 15000, "2024-01-01")
            .with_id("a")
            .with_extra("mechanic", "Rosa");
        let batch = normalizer().normalize(vec![raw]);
        assert_eq!(batch.entries.len(), 1);
        let e = &batch.entries[0];
        assert_eq!(e.bus, "01");
        assert_eq!(e.category, "brakes");
        assert_eq!(e.km_current, 10000.0);
        assert_eq!(e.km_next, 15000.0);
        assert_eq!(e.extra.get("mechanic"), Some(&json!("Rosa")));
        assert_eq!(batch.diagnostics.kept, 1);
        assert_eq!(batch.diagnostics.repaired_km_fields, 0);
    }

    #[test]
    fn test_malformed_km_is_repaired_not_dropped() {
        let raw = LogEntry::new(&fleet(), "01", "oil", "abc", 400, "2024-01-01");
        let batch = normalizer().normalize(vec![raw]);
        assert_eq!(batch.entries[0].km_current, 0.0);
        assert_eq!(batch.entries[0].km_next, 400.0);
        assert_eq!(batch.diagnostics.repaired_km_fields, 1);
        assert_eq!(batch.diagnostics.dropped_total(), 0);
    }

    #[test]
    fn test_drop_reasons_are_counted() {
        let mut other_fleet = LogEntry::new(&fleet(), "01", "oil", 1, 2, "2024-01-01");
        other_fleet.fleet_id = Some("south".into());
        let mut no_fleet = LogEntry::new(&fleet(), "01", "oil", 1, 2, "2024-01-01");
        no_fleet.fleet_id = None;

        let raw = vec![
            other_fleet,
            no_fleet,
            LogEntry::new(&fleet(), "  ", "oil", 1, 2, "2024-01-01"),
            LogEntry::new(&fleet(), "01", "", 1, 2, "2024-01-01"),
            LogEntry::new(&fleet(), "01", "oil", 1, 2, "soon"),
            LogEntry::new(&fleet(), "01", "oil", 1, 2, "2024-01-01"),
        ];
        let batch = normalizer().normalize(raw);
        let d = &batch.diagnostics;
        assert_eq!(d.received, 6);
        assert_eq!(d.kept, 1);
        assert_eq!(d.dropped_total(), 5);
        assert_eq!(d.dropped_for(DropReason::FleetMismatch), 2);
        assert_eq!(d.dropped_for(DropReason::MissingBus), 1);
        assert_eq!(d.dropped_for(DropReason::MissingCategory), 1);
        assert_eq!(d.dropped_for(DropReason::InvalidDate), 1);
    }

    #[test]
    fn test_missing_km_fields_default_to_zero() {
        let raw = LogEntry {
            fleet_id: Some("north".into()),
            bus: Some(json!("01")),
            category: Some(json!("oil")),
            date: Some(json!("2024-01-01")),
            ..Default::default()
        };
        let batch = normalizer().normalize(vec![raw]);
        assert_eq!(batch.entries[0].km_current, 0.0);
        assert_eq!(batch.entries[0].km_next, 0.0);
        assert_eq!(batch.diagnostics.repaired_km_fields, 2);
    }

    #[test]
    fn test_written_back_entry_normalizes_to_itself() {
        let raw = LogEntry::new(&fleet(), 7, "tyres", "1234.5", "abc", "2024-02-29T10:15:30.250Z")
            .with_id("x");
        let first = normalizer().normalize(vec![raw]).entries;
        let again = normalizer()
            .normalize(first.iter().map(LogEntry::from))
            .entries;
        assert_eq!(first, again);
    }
}

//! Durability analysis: kilometers between consecutive interventions.
//!
//! Entries are grouped by `(bus, category)`, each group is sorted by date
//! (stable, so equal dates keep input order), and every entry after the
//! first gets `km_current - previous.km_current`.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::normalize::NormalizedEntry;

/// A normalized entry with its odometer delta from the previous entry of
/// the same `(bus, category)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurabilityRecord {
    #[serde(flatten)]
    pub entry: NormalizedEntry,
    /// Absent for the first entry of a group. Zero or negative values are
    /// data-quality signals and stay in the record set.
    pub durability: Option<f64>,
}

/// Positive durability values per category, across every bus.
pub type DurabilityDistribution = BTreeMap<String, Vec<f64>>;

/// Compute durability for every entry.
///
/// Output is ordered by `(bus, category)` and then chronologically within
/// each group; it has exactly one record per input entry.
pub fn analyze_durability(entries: &[NormalizedEntry]) -> Vec<DurabilityRecord> {
    let mut groups: BTreeMap<(&str, &str), Vec<&NormalizedEntry>> = BTreeMap::new();
    for entry in entries {
        groups
            .entry((entry.bus.as_str(), entry.category.as_str()))
            .or_default()
            .push(entry);
    }

    let mut records = Vec::with_capacity(entries.len());
    for (_, mut group) in groups {
        group.sort_by_key(|e| e.date);
        let mut previous: Option<f64> = None;
        for entry in group {
            records.push(DurabilityRecord {
                entry: entry.clone(),
                durability: previous.map(|prev| entry.km_current - prev),
            });
            previous = Some(entry.km_current);
        }
    }
    records
}

/// Multiset of positive durability values per category.
///
/// Categories without a single positive value are absent.
pub fn durability_distribution(records: &[DurabilityRecord]) -> DurabilityDistribution {
    let mut distribution = DurabilityDistribution::new();
    for record in records {
        if let Some(d) = record.durability.filter(|d| *d > 0.0) {
            distribution
                .entry(record.entry.category.clone())
                .or_default()
                .push(d);
        }
    }
    distribution
}

/// Count of present but non-positive durability values per category.
pub fn non_positive_counts(records: &[DurabilityRecord]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        if record.durability.is_some_and(|d| d <= 0.0) {
            *counts.entry(record.entry.category.clone()).or_insert(0) += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use fleetwatch_store::FleetId;

    fn entry(id: &str, bus: &str, category: &str, km: f64, day: u32) -> NormalizedEntry {
        NormalizedEntry {
            id: Some(id.to_string()),
            fleet_id: FleetId::new("north"),
            bus: bus.to_string(),
            category: category.to_string(),
            km_current: km,
            km_next: km + 5000.0,
            date: NaiveDate::from_ymd_opt(2024, 1, day)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            extra: Default::default(),
        }
    }

    fn durability_of(records: &[DurabilityRecord], id: &str) -> Option<f64> {
        records
            .iter()
            .find(|r| r.entry.id.as_deref() == Some(id))
            .and_then(|r| r.durability)
    }

    #[test]
    fn test_empty_input() {
        assert!(analyze_durability(&[]).is_empty());
        assert!(durability_distribution(&[]).is_empty());
    }

    #[test]
    fn test_single_entry_has_no_durability() {
        let records = analyze_durability(&[entry("a", "01", "oil", 12000.0, 1)]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].durability, None);
        assert!(durability_distribution(&records).is_empty());
    }

    #[test]
    fn test_deltas_follow_date_not_input_order() {
        let input = vec![
            entry("c", "01", "brakes", 40000.0, 20),
            entry("a", "01", "brakes", 10000.0, 1),
            entry("b", "01", "brakes", 25000.0, 10),
        ];
        let records = analyze_durability(&input);
        assert_eq!(durability_of(&records, "a"), None);
        assert_eq!(durability_of(&records, "b"), Some(15000.0));
        assert_eq!(durability_of(&records, "c"), Some(15000.0));
    }

    #[test]
    fn test_groups_do_not_mix() {
        let input = vec![
            entry("a", "01", "brakes", 10000.0, 1),
            entry("b", "02", "brakes", 50000.0, 2),
            entry("c", "01", "oil", 11000.0, 3),
            entry("d", "01", "brakes", 30000.0, 4),
        ];
        let records = analyze_durability(&input);
        assert_eq!(durability_of(&records, "b"), None);
        assert_eq!(durability_of(&records, "c"), None);
        assert_eq!(durability_of(&records, "d"), Some(20000.0));
    }

    #[test]
    fn test_non_increasing_odometer_is_kept_but_not_distributed() {
        let input = vec![
            entry("a", "01", "brakes", 20000.0, 1),
            entry("b", "01", "brakes", 18000.0, 2),
            entry("c", "01", "brakes", 18000.0, 3),
        ];
        let records = analyze_durability(&input);
        assert_eq!(durability_of(&records, "b"), Some(-2000.0));
        assert_eq!(durability_of(&records, "c"), Some(0.0));
        assert!(durability_distribution(&records).get("brakes").is_none());
        assert_eq!(non_positive_counts(&records).get("brakes"), Some(&2));
    }

    #[test]
    fn test_equal_dates_keep_input_order() {
        let input = vec![
            entry("first", "01", "oil", 1000.0, 5),
            entry("second", "01", "oil", 3000.0, 5),
        ];
        let records = analyze_durability(&input);
        assert_eq!(records[0].entry.id.as_deref(), Some("first"));
        assert_eq!(durability_of(&records, "second"), Some(2000.0));
        assert_eq!(analyze_durability(&input), records);
    }

    #[test]
    fn test_distribution_pools_buses() {
        let input = vec![
            entry("a", "01", "brakes", 10000.0, 1),
            entry("b", "01", "brakes", 25000.0, 2),
            entry("c", "02", "brakes", 5000.0, 1),
            entry("d", "02", "brakes", 17000.0, 2),
        ];
        let dist = durability_distribution(&analyze_durability(&input));
        assert_eq!(dist.get("brakes"), Some(&vec![15000.0, 12000.0]));
    }
}

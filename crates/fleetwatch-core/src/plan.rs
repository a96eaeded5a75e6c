//! State projection: the current wear state of each component of a bus.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::normalize::NormalizedEntry;

/// Alert classification of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertLevel {
    Urgent,
    Ok,
}

impl AlertLevel {
    /// URGENT iff `km_remaining <= threshold_km`.
    pub fn classify(km_remaining: f64, threshold_km: f64) -> Self {
        if km_remaining <= threshold_km {
            AlertLevel::Urgent
        } else {
            AlertLevel::Ok
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            AlertLevel::Urgent => "URGENT",
            AlertLevel::Ok => "OK",
        }
    }
}

impl std::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Latest known state of one `(bus, category)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentState {
    pub bus: String,
    pub category: String,
    pub latest: NormalizedEntry,
    /// `km_next - km_current` of the latest entry; negative when overdue.
    pub km_remaining: f64,
    pub alert_level: AlertLevel,
}

impl ComponentState {
    fn from_latest(latest: &NormalizedEntry, threshold_km: f64) -> Self {
        let km_remaining = latest.km_next - latest.km_current;
        Self {
            bus: latest.bus.clone(),
            category: latest.category.clone(),
            latest: latest.clone(),
            km_remaining,
            alert_level: AlertLevel::classify(km_remaining, threshold_km),
        }
    }
}

/// Recency order: date, then odometer. Equal means a full tie.
fn recency(a: &NormalizedEntry, b: &NormalizedEntry) -> Ordering {
    a.date
        .cmp(&b.date)
        .then_with(|| a.km_current.total_cmp(&b.km_current))
}

/// One state per category present in `bus`'s history, ordered by category.
///
/// On a full tie the entry appearing later in `entries` wins. A bus with no
/// history yields an empty plan.
pub fn project_plan(
    entries: &[NormalizedEntry],
    bus: &str,
    threshold_km: f64,
) -> Vec<ComponentState> {
    let bus = bus.trim();
    let mut latest: BTreeMap<&str, &NormalizedEntry> = BTreeMap::new();
    for entry in entries.iter().filter(|e| e.bus == bus) {
        latest
            .entry(entry.category.as_str())
            .and_modify(|current| {
                if recency(entry, *current) != Ordering::Less {
                    *current = entry;
                }
            })
            .or_insert(entry);
    }
    latest
        .into_values()
        .map(|entry| ComponentState::from_latest(entry, threshold_km))
        .collect()
}

/// Every bus with at least one normalized entry.
pub fn buses(entries: &[NormalizedEntry]) -> BTreeSet<String> {
    entries.iter().map(|e| e.bus.clone()).collect()
}

/// Per-bus headline for the fleet view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BusOverview {
    pub bus: String,
    pub components: usize,
    pub urgent: usize,
}

/// Project every bus of the fleet, ordered by bus id.
pub fn fleet_overview(entries: &[NormalizedEntry], threshold_km: f64) -> Vec<BusOverview> {
    buses(entries)
        .into_iter()
        .map(|bus| {
            let plan = project_plan(entries, &bus, threshold_km);
            let urgent = plan
                .iter()
                .filter(|s| s.alert_level == AlertLevel::Urgent)
                .count();
            BusOverview {
                components: plan.len(),
                urgent,
                bus,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use fleetwatch_store::FleetId;

    fn entry(id: &str, bus: &str, category: &str, km: f64, km_next: f64, day: u32) -> NormalizedEntry {
        NormalizedEntry {
            id: Some(id.to_string()),
            fleet_id: FleetId::new("north"),
            bus: bus.to_string(),
            category: category.to_string(),
            km_current: km,
            km_next,
            date: NaiveDate::from_ymd_opt(2024, 3, day)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            extra: Default::default(),
        }
    }

    #[test]
    fn test_classify_boundary() {
        assert_eq!(AlertLevel::classify(500.0, 500.0), AlertLevel::Urgent);
        assert_eq!(AlertLevel::classify(500.5, 500.0), AlertLevel::Ok);
        assert_eq!(AlertLevel::classify(-200.0, 500.0), AlertLevel::Urgent);
        assert_eq!(AlertLevel::classify(5000.0, 500.0), AlertLevel::Ok);
    }

    #[test]
    fn test_alert_level_serializes_upper_case() {
        assert_eq!(serde_json::to_string(&AlertLevel::Urgent).unwrap(), "\"URGENT\"");
        assert_eq!(serde_json::to_string(&AlertLevel::Ok).unwrap(), "\"OK\"");
    }

    #[test]
    fn test_latest_entry_wins() {
        let input = vec![
            entry("new", "01", "brakes", 25000.0, 30000.0, 20),
            entry("old", "01", "brakes", 10000.0, 15000.0, 1),
        ];
        let plan = project_plan(&input, "01", 500.0);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].latest.id.as_deref(), Some("new"));
        assert_eq!(plan[0].km_remaining, 5000.0);
    }

    #[test]
    fn test_same_date_prefers_higher_odometer() {
        let input = vec![
            entry("high", "01", "oil", 12000.0, 12400.0, 5),
            entry("low", "01", "oil", 11000.0, 20000.0, 5),
        ];
        let plan = project_plan(&input, "01", 500.0);
        assert_eq!(plan[0].latest.id.as_deref(), Some("high"));
        assert_eq!(plan[0].alert_level, AlertLevel::Urgent);
    }

    #[test]
    fn test_full_tie_prefers_later_input() {
        let input = vec![
            entry("first", "01", "oil", 12000.0, 13000.0, 5),
            entry("second", "01", "oil", 12000.0, 20000.0, 5),
        ];
        let plan = project_plan(&input, "01", 500.0);
        assert_eq!(plan[0].latest.id.as_deref(), Some("second"));
    }

    #[test]
    fn test_overdue_component_is_urgent() {
        let plan = project_plan(&[entry("a", "03", "tyres", 41000.0, 40000.0, 2)], "03", 500.0);
        assert_eq!(plan[0].km_remaining, -1000.0);
        assert_eq!(plan[0].alert_level, AlertLevel::Urgent);
    }

    #[test]
    fn test_unknown_bus_gives_empty_plan() {
        let input = vec![entry("a", "01", "oil", 1.0, 2.0, 1)];
        assert!(project_plan(&input, "99", 500.0).is_empty());
        assert!(project_plan(&[], "01", 500.0).is_empty());
    }

    #[test]
    fn test_requested_bus_is_trimmed() {
        let input = vec![entry("a", "01", "oil", 1.0, 2.0, 1)];
        assert_eq!(project_plan(&input, " 01 ", 500.0).len(), 1);
    }

    #[test]
    fn test_plan_ordered_by_category() {
        let input = vec![
            entry("a", "01", "tyres", 1.0, 9000.0, 1),
            entry("b", "01", "brakes", 1.0, 9000.0, 1),
            entry("c", "01", "oil", 1.0, 9000.0, 1),
        ];
        let categories: Vec<_> = project_plan(&input, "01", 500.0)
            .into_iter()
            .map(|s| s.category)
            .collect();
        assert_eq!(categories, vec!["brakes", "oil", "tyres"]);
    }

    #[test]
    fn test_fleet_overview_counts_urgent() {
        let input = vec![
            entry("a", "02", "brakes", 9500.0, 10000.0, 1),
            entry("b", "01", "brakes", 10000.0, 15000.0, 1),
            entry("c", "01", "oil", 12000.0, 12400.0, 1),
        ];
        let overview = fleet_overview(&input, 500.0);
        assert_eq!(
            overview,
            vec![
                BusOverview {
                    bus: "01".into(),
                    components: 2,
                    urgent: 1
                },
                BusOverview {
                    bus: "02".into(),
                    components: 1,
                    urgent: 1
                },
            ]
        );
        assert!(fleet_overview(&[], 500.0).is_empty());
    }
}

//! Render-ready structures for the UI shell.
//!
//! Pure formatting: no state, no I/O. Layout, colors, icons and copy beyond
//! the labels below belong to the shell.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::durability::DurabilityDistribution;
use crate::plan::{AlertLevel, ComponentState};

/// Shown when no category has a positive durability value yet.
pub const EMPTY_DURABILITY_MESSAGE: &str =
    "Durability needs at least two entries of the same category on the same bus.";

/// `"5000 KM remaining"`; fractional kilometers keep their fraction.
pub fn remaining_label(km_remaining: f64) -> String {
    format!("{km_remaining} KM remaining")
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanRow {
    pub category: String,
    pub km_remaining: f64,
    pub remaining_label: String,
    pub alert: AlertLevel,
    pub alert_tag: &'static str,
    pub km_current: f64,
    pub km_next: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanView {
    pub bus: String,
    pub rows: Vec<PlanRow>,
    pub urgent_count: usize,
}

/// Plan table for one bus, ordered by category name.
pub fn plan_view(bus: &str, states: &[ComponentState]) -> PlanView {
    let mut rows: Vec<PlanRow> = states
        .iter()
        .map(|s| PlanRow {
            category: s.category.clone(),
            km_remaining: s.km_remaining,
            remaining_label: remaining_label(s.km_remaining),
            alert: s.alert_level,
            alert_tag: s.alert_level.tag(),
            km_current: s.latest.km_current,
            km_next: s.latest.km_next,
        })
        .collect();
    rows.sort_by(|a, b| a.category.cmp(&b.category));
    let urgent_count = rows.iter().filter(|r| r.alert == AlertLevel::Urgent).count();
    PlanView {
        bus: bus.trim().to_string(),
        rows,
        urgent_count,
    }
}

/// Five-number summary plus count and mean of one series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxPlotSummary {
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub mean: f64,
}

impl BoxPlotSummary {
    /// `None` for an empty series.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let n = sorted.len();
        Some(Self {
            count: n,
            min: sorted[0],
            q1: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q3: quantile(&sorted, 0.75),
            max: sorted[n - 1],
            mean: sorted.iter().sum::<f64>() / n as f64,
        })
    }
}

/// Linear-interpolation quantile of an ascending, non-empty slice.
fn quantile(sorted: &[f64], p: f64) -> f64 {
    let pos = p * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Box-plot input for one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxPlotSeries {
    pub category: String,
    pub values: Vec<f64>,
    pub summary: BoxPlotSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurabilityView {
    pub series: Vec<BoxPlotSeries>,
    /// Non-positive deltas per category (odometer went backwards or stood still).
    pub data_quality: BTreeMap<String, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_state: Option<&'static str>,
}

/// Box-plot dataset, one series per category with positive durability.
pub fn durability_view(
    distribution: &DurabilityDistribution,
    data_quality: BTreeMap<String, usize>,
) -> DurabilityView {
    let series: Vec<BoxPlotSeries> = distribution
        .iter()
        .filter_map(|(category, values)| {
            let summary = BoxPlotSummary::from_values(values)?;
            Some(BoxPlotSeries {
                category: category.clone(),
                values: values.clone(),
                summary,
            })
        })
        .collect();
    let empty_state = series.is_empty().then_some(EMPTY_DURABILITY_MESSAGE);
    DurabilityView {
        series,
        data_quality,
        empty_state,
    }
}

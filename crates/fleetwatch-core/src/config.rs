//! Deployment configuration for the dashboard kernel.

use std::time::Duration;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, Result};

/// Deployment identifier used in the log collection path.
pub const DEFAULT_APP_ID: &str = "fleetwatch";

/// `km_remaining` at or below this value is URGENT.
pub const DEFAULT_ALERT_THRESHOLD_KM: f64 = 500.0;

pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Largest UTC offset chrono accepts, in minutes (just under one day).
const MAX_OFFSET_MINUTES: i32 = 24 * 60 - 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Fixed deployment string; selects `artifacts/<app_id>/public/data/logs`.
    pub app_id: String,
    /// One threshold for every category.
    pub alert_threshold_km: f64,
    /// Request-level deadline for the store round-trip.
    pub request_timeout_ms: u64,
    /// The fleet's civil time, as minutes east of UTC. Zoned timestamps are
    /// converted into it; naive ones are taken as already local.
    pub fleet_utc_offset_minutes: i32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            app_id: DEFAULT_APP_ID.to_string(),
            alert_threshold_km: DEFAULT_ALERT_THRESHOLD_KM,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            fleet_utc_offset_minutes: 0,
        }
    }
}

impl DashboardConfig {
    pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = app_id.into();
        self
    }

    pub fn with_alert_threshold_km(mut self, km: f64) -> Self {
        self.alert_threshold_km = km;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_fleet_utc_offset_minutes(mut self, minutes: i32) -> Self {
        self.fleet_utc_offset_minutes = minutes;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// The fleet's UTC offset as a chrono timezone.
    pub fn fleet_offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.fleet_utc_offset_minutes * 60).ok_or_else(|| {
            DashboardError::InvalidConfig(format!(
                "fleet_utc_offset_minutes out of range: {}",
                self.fleet_utc_offset_minutes
            ))
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.app_id.trim().is_empty() {
            return Err(DashboardError::InvalidConfig(
                "app_id must not be empty".to_string(),
            ));
        }
        if !self.alert_threshold_km.is_finite() || self.alert_threshold_km < 0.0 {
            return Err(DashboardError::InvalidConfig(format!(
                "alert_threshold_km must be a non-negative number, got {}",
                self.alert_threshold_km
            )));
        }
        if self.request_timeout_ms == 0 {
            return Err(DashboardError::InvalidConfig(
                "request_timeout_ms must be positive".to_string(),
            ));
        }
        if self.fleet_utc_offset_minutes.abs() > MAX_OFFSET_MINUTES {
            return Err(DashboardError::InvalidConfig(format!(
                "fleet_utc_offset_minutes out of range: {}",
                self.fleet_utc_offset_minutes
            )));
        }
        Ok(())
    }
}

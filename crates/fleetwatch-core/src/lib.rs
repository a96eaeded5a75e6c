//! Fleetwatch Core Library
//!
//! Maintenance analytics kernel of the fleet workshop dashboard: turns a
//! fleet's raw maintenance log into a per-bus plan with URGENT/OK alerts and
//! a per-category durability distribution.
//!
//! ## Layers
//!
//! - `normalize`: raw entries to trusted entries, with drop diagnostics
//! - `plan` / `durability`: pure projections over normalized entries
//! - `view`: render-ready tables and box-plot summaries
//! - `dashboard`: request-level entry points returning [`Outcome`]

pub mod config;
pub mod dashboard;
pub mod durability;
pub mod error;
pub mod normalize;
pub mod obs;
pub mod plan;
pub mod session;
pub mod telemetry;
pub mod view;

pub use config::DashboardConfig;
pub use dashboard::{Dashboard, Outcome, Snapshot, Unavailable, UNAVAILABLE_MESSAGE};
pub use durability::{
    analyze_durability, durability_distribution, non_positive_counts, DurabilityDistribution,
    DurabilityRecord,
};
pub use error::{DashboardError, MalformedEntry, Result};
pub use normalize::{Diagnostics, DropReason, NormalizedBatch, NormalizedEntry, Normalizer};
pub use plan::{buses, fleet_overview, project_plan, AlertLevel, BusOverview, ComponentState};
pub use session::{Role, SessionContext};
pub use telemetry::{init_tracing, LogFormat};
pub use view::{BoxPlotSeries, BoxPlotSummary, DurabilityView, PlanRow, PlanView};

pub use fleetwatch_store::{FleetId, LogEntry, LogStore, StoreError, SurrealLogStore};

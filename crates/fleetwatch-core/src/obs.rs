//! Structured observability hooks for dashboard requests.
//!
//! This module provides:
//! - Request-scoped tracing spans via [`request_span`]
//! - Emission functions for the request lifecycle: fetch, normalize,
//!   projection, analysis, store failure
//!
//! Events are emitted at `info!` level (store failures at `warn!`); filter
//! them with `RUST_LOG`.

use fleetwatch_store::{FleetId, StoreError};
use tracing::{info, warn};

use crate::normalize::Diagnostics;

/// Span covering one page render.
///
/// # Example
///
/// ```ignore
/// render().instrument(request_span(session.fleet_id(), "plan")).await
/// // every event below carries fleet_id and view
/// ```
pub fn request_span(fleet_id: &FleetId, view: &'static str) -> tracing::Span {
    tracing::info_span!("fleetwatch.request", fleet_id = %fleet_id, view = view)
}

/// Emit event: raw entries received from the store.
pub fn emit_logs_fetched(fleet_id: &FleetId, count: usize) {
    info!(event = "logs.fetched", fleet_id = %fleet_id, count = count);
}

/// Emit event: normalization finished.
pub fn emit_logs_normalized(fleet_id: &FleetId, diagnostics: &Diagnostics) {
    info!(
        event = "logs.normalized",
        fleet_id = %fleet_id,
        received = diagnostics.received,
        kept = diagnostics.kept,
        dropped = diagnostics.dropped_total(),
        repaired_km_fields = diagnostics.repaired_km_fields,
    );
}

/// Emit event: the store could not be read (warning level).
pub fn emit_store_unavailable(fleet_id: &FleetId, error: &StoreError) {
    warn!(
        event = "store.unavailable",
        fleet_id = %fleet_id,
        kind = error.kind(),
        error = %error,
    );
}

/// Emit event: a bus plan was projected.
pub fn emit_plan_projected(bus: &str, components: usize, urgent: usize) {
    info!(event = "plan.projected", bus = %bus, components = components, urgent = urgent);
}

/// Emit event: durability was analyzed for the fleet.
pub fn emit_durability_analyzed(records: usize, categories: usize) {
    info!(event = "durability.analyzed", records = records, categories = categories);
}

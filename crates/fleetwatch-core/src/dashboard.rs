//! Request-level entry points consumed by the UI shell.
//!
//! Every call is one page render: one fetch through the store (under the
//! configured deadline), one normalization pass, one projection. Nothing
//! derived is cached between calls.
//!
//! Failures never cross this boundary as errors. A render yields either a
//! [`Outcome::Snapshot`] (possibly empty) or [`Outcome::Unavailable`], and
//! the latter never carries data.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::FixedOffset;
use fleetwatch_store::{fetch_logs_with_deadline, LogStore, StoreError, SurrealLogStore};
use serde::Serialize;
use tracing::{instrument, Instrument};

use crate::config::DashboardConfig;
use crate::durability::{
    analyze_durability, durability_distribution, non_positive_counts, DurabilityDistribution,
};
use crate::error::{DashboardError, Result};
use crate::normalize::{Diagnostics, NormalizedBatch, Normalizer};
use crate::obs;
use crate::plan::{self, AlertLevel, BusOverview, ComponentState};
use crate::session::SessionContext;
use crate::view::{self, DurabilityView, PlanView};

/// User-facing message for [`Outcome::Unavailable`].
pub const UNAVAILABLE_MESSAGE: &str = "Data unavailable, retry.";

/// Successful render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot<T> {
    pub data: T,
    pub diagnostics: Diagnostics,
}

/// Store could not be read; no data is returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unavailable {
    pub message: &'static str,
    pub kind: &'static str,
    pub detail: String,
}

impl From<&StoreError> for Unavailable {
    fn from(err: &StoreError) -> Self {
        Self {
            message: UNAVAILABLE_MESSAGE,
            kind: err.kind(),
            detail: err.to_string(),
        }
    }
}

/// Result of one render at the presentation boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome<T> {
    Snapshot(Snapshot<T>),
    Unavailable(Unavailable),
}

impl<T> Outcome<T> {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Outcome::Unavailable(_))
    }

    /// The rendered data, if any.
    pub fn data(&self) -> Option<&T> {
        match self {
            Outcome::Snapshot(s) => Some(&s.data),
            Outcome::Unavailable(_) => None,
        }
    }

    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        match self {
            Outcome::Snapshot(s) => Some(&s.diagnostics),
            Outcome::Unavailable(_) => None,
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            Outcome::Snapshot(s) => Some(s.data),
            Outcome::Unavailable(_) => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Snapshot(s) => Outcome::Snapshot(Snapshot {
                data: f(s.data),
                diagnostics: s.diagnostics,
            }),
            Outcome::Unavailable(u) => Outcome::Unavailable(u),
        }
    }
}

/// The analytics kernel bound to one session.
///
/// The store is the process-wide handle: open it once at start-up (for
/// example `Arc<SurrealLogStore>` from [`SurrealLogStore::from_env`]) and
/// hand a clone to each session's dashboard.
pub struct Dashboard<S> {
    store: S,
    session: SessionContext,
    config: DashboardConfig,
    offset: FixedOffset,
}

impl Dashboard<Arc<SurrealLogStore>> {
    /// Bind a session to the shared SurrealDB handle.
    ///
    /// Fails when the handle was opened for another deployment.
    pub fn shared(
        store: &Arc<SurrealLogStore>,
        session: SessionContext,
        config: DashboardConfig,
    ) -> Result<Self> {
        if store.collection().database() != config.app_id {
            return Err(DashboardError::InvalidConfig(format!(
                "store serves {}, config expects app id {}",
                store.collection(),
                config.app_id
            )));
        }
        Self::new(Arc::clone(store), session, config)
    }
}

impl<S: LogStore> Dashboard<S> {
    pub fn new(store: S, session: SessionContext, config: DashboardConfig) -> Result<Self> {
        config.validate()?;
        let offset = config.fleet_offset()?;
        Ok(Self {
            store,
            session,
            config,
            offset,
        })
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Fetch and normalize the session fleet's log.
    async fn load(&self) -> std::result::Result<NormalizedBatch, StoreError> {
        let fleet_id = self.session.fleet_id();
        let deadline = self.config.request_timeout();
        let raw = match fetch_logs_with_deadline(&self.store, fleet_id, deadline).await {
            Ok(raw) => raw,
            Err(err) => {
                obs::emit_store_unavailable(fleet_id, &err);
                return Err(err);
            }
        };
        obs::emit_logs_fetched(fleet_id, raw.len());

        let batch = Normalizer::new(fleet_id.clone(), self.offset).normalize(raw);
        obs::emit_logs_normalized(fleet_id, &batch.diagnostics);
        Ok(batch)
    }

    async fn render<T>(
        &self,
        view: &'static str,
        f: impl FnOnce(&NormalizedBatch) -> T,
    ) -> Outcome<T> {
        let span = obs::request_span(self.session.fleet_id(), view);
        let loaded = self.load().instrument(span.clone()).await;
        let _entered = span.enter();
        match loaded {
            Ok(batch) => {
                let data = f(&batch);
                Outcome::Snapshot(Snapshot {
                    data,
                    diagnostics: batch.diagnostics,
                })
            }
            Err(err) => Outcome::Unavailable(Unavailable::from(&err)),
        }
    }

    /// Current state of every component of `bus_id`, ordered by category.
    #[instrument(skip(self), fields(fleet_id = %self.session.fleet_id()))]
    pub async fn plan(&self, bus_id: &str) -> Outcome<Vec<ComponentState>> {
        let threshold = self.config.alert_threshold_km;
        self.render("plan", |batch| {
            let states = plan::project_plan(&batch.entries, bus_id, threshold);
            let urgent = states
                .iter()
                .filter(|s| s.alert_level == AlertLevel::Urgent)
                .count();
            obs::emit_plan_projected(bus_id, states.len(), urgent);
            states
        })
        .await
    }

    /// Plan of the bus assigned to the session; empty when none is assigned.
    pub async fn plan_for_session(&self) -> Outcome<Vec<ComponentState>> {
        match self.session.bus() {
            Some(bus) => self.plan(bus).await,
            None => self.render("plan", |_| Vec::new()).await,
        }
    }

    /// Positive durability values per category, across every bus.
    #[instrument(skip(self), fields(fleet_id = %self.session.fleet_id()))]
    pub async fn durability_distribution(&self) -> Outcome<DurabilityDistribution> {
        self.render("durability", |batch| {
            let records = analyze_durability(&batch.entries);
            let distribution = durability_distribution(&records);
            obs::emit_durability_analyzed(records.len(), distribution.len());
            distribution
        })
        .await
    }

    /// Every bus present in the fleet's normalized log.
    #[instrument(skip(self), fields(fleet_id = %self.session.fleet_id()))]
    pub async fn buses(&self) -> Outcome<BTreeSet<String>> {
        self.render("buses", |batch| plan::buses(&batch.entries)).await
    }

    /// Plan table for `bus_id`.
    pub async fn plan_view(&self, bus_id: &str) -> Outcome<PlanView> {
        self.plan(bus_id)
            .await
            .map(|states| view::plan_view(bus_id, &states))
    }

    /// Box-plot dataset with data-quality counts.
    #[instrument(skip(self), fields(fleet_id = %self.session.fleet_id()))]
    pub async fn durability_view(&self) -> Outcome<DurabilityView> {
        self.render("durability", |batch| {
            let records = analyze_durability(&batch.entries);
            let distribution = durability_distribution(&records);
            obs::emit_durability_analyzed(records.len(), distribution.len());
            view::durability_view(&distribution, non_positive_counts(&records))
        })
        .await
    }

    /// Component and URGENT counts for every bus.
    #[instrument(skip(self), fields(fleet_id = %self.session.fleet_id()))]
    pub async fn fleet_overview(&self) -> Outcome<Vec<BusOverview>> {
        let threshold = self.config.alert_threshold_km;
        self.render("overview", |batch| plan::fleet_overview(&batch.entries, threshold))
            .await
    }
}

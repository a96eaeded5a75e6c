//! Fleetwatch-Store: maintenance log access for the workshop dashboard
//!
//! This crate provides the persistence layer of the fleet workshop
//! dashboard. It handles all I/O with the document store holding the
//! maintenance log and hands raw, uninterpreted entries to the analytics
//! kernel.
//!
//! ## Layer 0 - Data/Persistence
//!
//! Focus: fleet scoping, one-shot connection lifecycle, request deadlines.
//!
//! ## Key Components
//!
//! - `LogStore`: the read contract (`fetch_logs(fleet_id)`)
//! - `SurrealLogStore`: SurrealDB backend with a lazily opened shared handle
//! - `LogEntry`: raw document shape of `artifacts/<APP_ID>/public/data/logs`

pub mod credentials;
mod error;
pub mod fakes;
mod migrations;
mod schema;
pub mod storage_traits;
pub mod surreal_store;

pub use credentials::{StoreCredentials, SECRET_ENV_VAR};
pub use error::StoreError;
pub use migrations::init_schema;
pub use schema::{CollectionPath, FleetId, LogEntry, FLEET_FIELD};
pub use storage_traits::{fetch_logs_with_deadline, LogStore, StoreResult};
pub use surreal_store::SurrealLogStore;

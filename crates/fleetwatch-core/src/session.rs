//! Session context: who is looking, and at which fleet.
//!
//! Created once at login and never mutated. Every read goes through the
//! session's fleet, so it is passed explicitly to whatever needs it.

use std::str::FromStr;

use fleetwatch_store::FleetId;
use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, Result};

/// Workshop role of the logged-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Mechanic,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Mechanic => "mechanic",
        }
    }
}

impl FromStr for Role {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "owner" => Ok(Role::Owner),
            "mechanic" => Ok(Role::Mechanic),
            other => Err(DashboardError::InvalidSession(format!("unknown role: {other}"))),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable per-login record `{ role, fleetId, name, bus }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionContext {
    role: Role,
    #[serde(rename = "fleetId")]
    fleet_id: FleetId,
    name: String,
    /// Bus assigned to the user, if any.
    bus: Option<String>,
}

impl SessionContext {
    pub fn new(
        role: Role,
        fleet_id: FleetId,
        name: impl Into<String>,
        bus: Option<String>,
    ) -> Result<Self> {
        if fleet_id.as_str().trim().is_empty() {
            return Err(DashboardError::InvalidSession(
                "fleet id must not be empty".to_string(),
            ));
        }
        let bus = bus
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty());
        Ok(Self {
            role,
            fleet_id,
            name: name.into(),
            bus,
        })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn fleet_id(&self) -> &FleetId {
        &self.fleet_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bus(&self) -> Option<&str> {
        self.bus.as_deref()
    }
}

//! Mesh Health Contracts
//!
//! Shared status vocabulary, the upstream health payload shapes, and the
//! aggregated summary emitted by the engine.

mod summary;
mod upstream;

pub use summary::*;
pub use upstream::*;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Health status levels
///
/// Serialized in the upper snake case used by the mesh console
/// (`HEALTHY`, `NOT_READY`, ...).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    /// Not enough data to evaluate
    #[default]
    Unknown,
    /// Fully operational
    Healthy,
    /// Deliberately scaled down
    NotReady,
    /// Operational with issues
    Degraded,
    /// Not operational
    Unhealthy,
}

impl HealthStatus {
    /// Merge priority, higher is worse
    pub fn priority(self) -> u8 {
        match self {
            HealthStatus::Unknown => 0,
            HealthStatus::Healthy => 1,
            HealthStatus::NotReady => 2,
            HealthStatus::Degraded => 3,
            HealthStatus::Unhealthy => 4,
        }
    }

    /// Return the worse of two statuses
    pub fn merge(self, other: HealthStatus) -> HealthStatus {
        if self.priority() > other.priority() {
            self
        } else {
            other
        }
    }

    /// Wire representation
    pub fn as_str(self) -> &'static str {
        match self {
            HealthStatus::Unknown => "UNKNOWN",
            HealthStatus::Healthy => "HEALTHY",
            HealthStatus::NotReady => "NOT_READY",
            HealthStatus::Degraded => "DEGRADED",
            HealthStatus::Unhealthy => "UNHEALTHY",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of mesh entity being health-checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    App,
    Service,
    Workload,
}

impl EntityType {
    /// All entity types, in discovery order
    pub const ALL: [EntityType; 3] = [EntityType::App, EntityType::Service, EntityType::Workload];

    /// Value of the upstream `type` query parameter
    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::App => "app",
            EntityType::Service => "service",
            EntityType::Workload => "workload",
        }
    }

    /// Top-level key of the upstream response body for this type
    pub fn payload_key(self) -> &'static str {
        match self {
            EntityType::App => "namespaceAppHealth",
            EntityType::Service => "namespaceServiceHealth",
            EntityType::Workload => "namespaceWorkloadHealth",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "app" => Ok(EntityType::App),
            "service" => Ok(EntityType::Service),
            "workload" => Ok(EntityType::Workload),
            _ => Err(format!(
                "invalid type parameter: must be one of 'app', 'service', or 'workload' (got '{}')",
                s
            )),
        }
    }
}

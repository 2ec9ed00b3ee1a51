//! Aggregated mesh health summary
//!
//! The shapes serialized back to the caller. All keys are camelCase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::AddAssign;

use super::{EntityType, HealthStatus};

/// Status counts for one entity type
///
/// `total` covers the four evaluated buckets only. Entities that could not be
/// evaluated are tallied in `unknown` and stay out of every denominator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCounts {
    pub total: u32,
    pub healthy: u32,
    pub degraded: u32,
    pub unhealthy: u32,
    pub not_ready: u32,
    #[serde(default)]
    pub unknown: u32,
}

impl HealthCounts {
    /// Count one classified entity
    pub fn record(&mut self, status: HealthStatus) {
        match status {
            HealthStatus::Unknown => {
                self.unknown += 1;
                return;
            }
            HealthStatus::Healthy => self.healthy += 1,
            HealthStatus::NotReady => self.not_ready += 1,
            HealthStatus::Degraded => self.degraded += 1,
            HealthStatus::Unhealthy => self.unhealthy += 1,
        }
        self.total += 1;
    }

    /// Entities seen, evaluated or not
    pub fn observed(&self) -> u32 {
        self.total + self.unknown
    }
}

impl AddAssign for HealthCounts {
    fn add_assign(&mut self, rhs: Self) {
        self.total += rhs.total;
        self.healthy += rhs.healthy;
        self.degraded += rhs.degraded;
        self.unhealthy += rhs.unhealthy;
        self.not_ready += rhs.not_ready;
        self.unknown += rhs.unknown;
    }
}

/// Counts for all three entity types
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityHealthCounts {
    pub apps: HealthCounts,
    pub services: HealthCounts,
    pub workloads: HealthCounts,
}

impl EntityHealthCounts {
    /// Bucket for an entity type
    pub fn for_type_mut(&mut self, entity_type: EntityType) -> &mut HealthCounts {
        match entity_type {
            EntityType::App => &mut self.apps,
            EntityType::Service => &mut self.services,
            EntityType::Workload => &mut self.workloads,
        }
    }

    /// Sum across entity types
    pub fn combined(&self) -> HealthCounts {
        let mut all = self.apps;
        all += self.services;
        all += self.workloads;
        all
    }
}

/// Health summary for a namespace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceSummary {
    pub status: HealthStatus,

    /// Percentage 0-100
    pub availability: f64,

    /// Sum of per-entity error rates; may exceed 1.0
    pub error_rate: f64,

    pub apps: HealthCounts,
    pub services: HealthCounts,
    pub workloads: HealthCounts,
}

impl NamespaceSummary {
    pub fn counts(&self) -> EntityHealthCounts {
        EntityHealthCounts {
            apps: self.apps,
            services: self.services,
            workloads: self.workloads,
        }
    }
}

/// An unhealthy entity, ranked by impact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnhealthyEntity {
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub namespace: String,
    pub name: String,
    pub status: HealthStatus,
    pub issue: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub error_rate: f64,
}

fn is_zero(value: &f64) -> bool {
    *value == 0.0
}

/// Aggregated health across the mesh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeshHealthSummary {
    pub overall_status: HealthStatus,

    /// Percentage 0-100
    pub availability: f64,

    /// Sum of namespace error rates
    pub total_error_rate: f64,

    pub namespace_count: usize,

    pub entity_counts: EntityHealthCounts,

    pub namespace_summary: BTreeMap<String, NamespaceSummary>,

    /// At most ten entries, worst error rate first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub top_unhealthy: Vec<UnhealthyEntity>,

    pub timestamp: DateTime<Utc>,

    pub rate_interval: String,
}

impl MeshHealthSummary {
    /// Whether any entity was classified unhealthy
    pub fn has_unhealthy(&self) -> bool {
        self.entity_counts.combined().unhealthy > 0
    }
}

//! Namespace and mesh rollups
//!
//! Entities are visited namespace by namespace (name order), then apps,
//! services and workloads, each by entity name. That order is the discovery
//! order the ranker preserves among equal error rates.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};

use crate::contracts::{
    ClustersNamespaceHealth, EntityHealthCounts, EntityType, HealthCounts, HealthStatus,
    MeshHealthSummary, NamespaceSummary, UnhealthyEntity,
};

use super::classifier::{classify_app, classify_service, classify_workload, Classification};
use super::ranker::{rank_unhealthy, TOP_UNHEALTHY_LIMIT};

/// Error-rate sum below which a namespace with no unhealthy entity is healthy
pub const HEALTHY_ERROR_RATE: f64 = 0.01;

/// Error-rate sum above which a namespace is unhealthy
pub const UNHEALTHY_ERROR_RATE: f64 = 0.05;

/// Derive a status from evaluated counts and an error-rate sum
pub fn compute_status(counts: &HealthCounts, error_rate: f64) -> HealthStatus {
    if counts.total == 0 {
        return HealthStatus::Unknown;
    }

    if counts.unhealthy == 0 && error_rate < HEALTHY_ERROR_RATE {
        HealthStatus::Healthy
    } else if counts.unhealthy * 2 > counts.total || error_rate > UNHEALTHY_ERROR_RATE {
        HealthStatus::Unhealthy
    } else {
        HealthStatus::Degraded
    }
}

/// Mesh-wide status from counts alone
///
/// Any unhealthy entity makes the mesh at least degraded, and unhealthy when
/// they are the majority. Degraded entities alone make it degraded.
pub fn compute_overall_status(counts: &HealthCounts) -> HealthStatus {
    if counts.total == 0 {
        HealthStatus::Unknown
    } else if counts.unhealthy * 2 > counts.total {
        HealthStatus::Unhealthy
    } else if counts.unhealthy > 0 || counts.degraded > 0 {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    }
}

/// Percentage of evaluated entities that are available, degraded ones at half
/// weight; 100 when nothing was evaluated
pub fn compute_availability(counts: &HealthCounts) -> f64 {
    if counts.total == 0 {
        return 100.0;
    }
    (counts.healthy as f64 + counts.degraded as f64 * 0.5) / counts.total as f64 * 100.0
}

/// The three parsed payloads of one aggregation call
#[derive(Debug, Clone, Copy)]
pub struct HealthPayloads<'a> {
    pub apps: &'a ClustersNamespaceHealth,
    pub services: &'a ClustersNamespaceHealth,
    pub workloads: &'a ClustersNamespaceHealth,
}

impl HealthPayloads<'_> {
    /// Union of namespaces seen in any payload
    pub fn namespaces(&self) -> BTreeSet<&str> {
        self.apps
            .namespace_app_health
            .keys()
            .chain(self.services.namespace_service_health.keys())
            .chain(self.workloads.namespace_workload_health.keys())
            .map(String::as_str)
            .collect()
    }
}

/// Accumulator for one namespace
#[derive(Default)]
struct NamespaceRollup {
    counts: EntityHealthCounts,
    error_rate: f64,
}

impl NamespaceRollup {
    fn finish(self) -> NamespaceSummary {
        let combined = self.counts.combined();
        NamespaceSummary {
            status: compute_status(&combined, self.error_rate),
            availability: compute_availability(&combined),
            error_rate: self.error_rate,
            apps: self.counts.apps,
            services: self.counts.services,
            workloads: self.counts.workloads,
        }
    }
}

/// Build the mesh summary from parsed payloads
pub fn compute_summary(
    payloads: HealthPayloads<'_>,
    rate_interval: impl Into<String>,
    timestamp: DateTime<Utc>,
) -> MeshHealthSummary {
    let mut mesh_counts = EntityHealthCounts::default();
    let mut namespace_summary = BTreeMap::new();
    let mut unhealthy = Vec::new();

    for namespace in payloads.namespaces() {
        let mut rollup = NamespaceRollup::default();

        let apps = payloads.apps.namespace_app_health.get(namespace);
        let services = payloads.services.namespace_service_health.get(namespace);
        let workloads = payloads.workloads.namespace_workload_health.get(namespace);

        let classified = apps
            .into_iter()
            .flatten()
            .map(|(name, app)| (EntityType::App, name, classify_app(app)))
            .chain(
                services
                    .into_iter()
                    .flatten()
                    .map(|(name, svc)| (EntityType::Service, name, classify_service(svc))),
            )
            .chain(
                workloads
                    .into_iter()
                    .flatten()
                    .map(|(name, wl)| (EntityType::Workload, name, classify_workload(wl))),
            );

        for (entity_type, name, classification) in classified {
            let Classification {
                status,
                issue,
                error_rate,
            } = classification;

            rollup.counts.for_type_mut(entity_type).record(status);
            mesh_counts.for_type_mut(entity_type).record(status);
            rollup.error_rate += error_rate;

            if status == HealthStatus::Unhealthy {
                unhealthy.push(UnhealthyEntity {
                    entity_type,
                    namespace: namespace.to_string(),
                    name: name.clone(),
                    status,
                    issue,
                    error_rate,
                });
            }
        }

        let summary = rollup.finish();
        tracing::debug!(
            namespace,
            status = %summary.status,
            availability = summary.availability,
            error_rate = summary.error_rate,
            "Namespace health rolled up"
        );
        namespace_summary.insert(namespace.to_string(), summary);
    }

    let total_error_rate: f64 = namespace_summary.values().map(|ns| ns.error_rate).sum();
    let combined = mesh_counts.combined();

    MeshHealthSummary {
        overall_status: compute_overall_status(&combined),
        availability: compute_availability(&combined),
        total_error_rate,
        namespace_count: namespace_summary.len(),
        entity_counts: mesh_counts,
        namespace_summary,
        top_unhealthy: rank_unhealthy(unhealthy, TOP_UNHEALTHY_LIMIT),
        timestamp,
        rate_interval: rate_interval.into(),
    }
}

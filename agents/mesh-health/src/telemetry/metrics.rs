//! Prometheus metrics for the Mesh Health Agent
//!
//! - `mesh_health_summaries_total` (counter) - summary calls by result
//! - `mesh_health_summary_duration_seconds` (histogram) - summary latency
//! - `mesh_health_fetch_failures_total` (counter) - failed upstream fetches by entity type
//! - `mesh_health_availability_percent` (gauge) - availability of the last summary
//! - `mesh_health_entities` (gauge) - entity counts of the last summary by type and status

use prometheus::{
    CounterVec, Encoder, Gauge, GaugeVec, Histogram, HistogramOpts, Opts, Registry, TextEncoder,
};
use std::time::Instant;

use super::{Result, TelemetryError};
use mesh_health_core::{EntityType, HealthCounts, HealthStatus, MeshHealthSummary};

const NAMESPACE: &str = "mesh_health";

/// Metrics owned by one agent instance
pub struct MeshHealthMetrics {
    registry: Registry,
    summaries_total: CounterVec,
    summary_duration_seconds: Histogram,
    fetch_failures_total: CounterVec,
    availability_percent: Gauge,
    entities: GaugeVec,
}

impl MeshHealthMetrics {
    /// Create metrics registered with a fresh registry
    pub fn new() -> Result<Self> {
        Self::with_registry(Registry::new())
    }

    pub fn with_registry(registry: Registry) -> Result<Self> {
        let summaries_total = CounterVec::new(
            Opts::new("summaries_total", "Total number of mesh health summary calls")
                .namespace(NAMESPACE),
            &["result"],
        )?;

        let summary_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "summary_duration_seconds",
                "Mesh health summary duration in seconds",
            )
            .namespace(NAMESPACE)
            .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        )?;

        let fetch_failures_total = CounterVec::new(
            Opts::new(
                "fetch_failures_total",
                "Total number of failed upstream health fetches",
            )
            .namespace(NAMESPACE),
            &["entity_type"],
        )?;

        let availability_percent = Gauge::with_opts(
            Opts::new(
                "availability_percent",
                "Mesh availability reported by the last summary",
            )
            .namespace(NAMESPACE),
        )?;

        let entities = GaugeVec::new(
            Opts::new("entities", "Entities in the last summary by type and status")
                .namespace(NAMESPACE),
            &["entity_type", "status"],
        )?;

        registry.register(Box::new(summaries_total.clone()))?;
        registry.register(Box::new(summary_duration_seconds.clone()))?;
        registry.register(Box::new(fetch_failures_total.clone()))?;
        registry.register(Box::new(availability_percent.clone()))?;
        registry.register(Box::new(entities.clone()))?;

        Ok(Self {
            registry,
            summaries_total,
            summary_duration_seconds,
            fetch_failures_total,
            availability_percent,
            entities,
        })
    }

    /// Record a completed summary
    pub fn record_summary(&self, summary: &MeshHealthSummary) {
        self.summaries_total.with_label_values(&["success"]).inc();
        self.availability_percent.set(summary.availability);

        let counts = &summary.entity_counts;
        for (entity_type, bucket) in [
            (EntityType::App, &counts.apps),
            (EntityType::Service, &counts.services),
            (EntityType::Workload, &counts.workloads),
        ] {
            self.set_entity_counts(entity_type, bucket);
        }
    }

    /// Record a failed summary; `entity_type` is set when a fetch failed
    pub fn record_failure(&self, entity_type: Option<EntityType>) {
        self.summaries_total.with_label_values(&["error"]).inc();
        if let Some(entity_type) = entity_type {
            self.record_fetch_failure(entity_type);
        }
    }

    pub fn record_fetch_failure(&self, entity_type: EntityType) {
        self.fetch_failures_total
            .with_label_values(&[entity_type.as_str()])
            .inc();
    }

    /// Start a timer that observes the summary duration on drop
    pub fn start_timer(&self) -> SummaryTimer<'_> {
        SummaryTimer {
            start: Instant::now(),
            metrics: self,
        }
    }

    /// Encode all metrics in the Prometheus text format
    pub fn encode_text(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| TelemetryError::EncodingFailed(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::EncodingFailed(e.to_string()))
    }

    fn set_entity_counts(&self, entity_type: EntityType, counts: &HealthCounts) {
        let label = entity_type.as_str();
        for (status, value) in [
            (HealthStatus::Healthy, counts.healthy),
            (HealthStatus::Degraded, counts.degraded),
            (HealthStatus::Unhealthy, counts.unhealthy),
            (HealthStatus::NotReady, counts.not_ready),
            (HealthStatus::Unknown, counts.unknown),
        ] {
            self.entities
                .with_label_values(&[label, status.as_str()])
                .set(value as f64);
        }
    }
}

/// RAII guard timing one summary call
pub struct SummaryTimer<'a> {
    start: Instant,
    metrics: &'a MeshHealthMetrics,
}

impl SummaryTimer<'_> {
    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Drop for SummaryTimer<'_> {
    fn drop(&mut self) {
        self.metrics
            .summary_duration_seconds
            .observe(self.start.elapsed().as_secs_f64());
    }
}

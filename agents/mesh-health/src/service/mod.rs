//! Mesh health service
//!
//! Shared by the CLI and the HTTP handler: owns the Kiali client, the
//! aggregator and the metrics, and enforces the per-call deadline.

use mesh_health_core::engine::{HealthAggregator, SummaryQuery, RATE_INTERVAL_PARAM};
use mesh_health_core::{AggregationError, EntityType, MeshHealthSummary};
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use crate::client::KialiClient;
use crate::config::AgentConfig;
use crate::error::{AgentError, Result};
use crate::telemetry::MeshHealthMetrics;

/// Entity type used by raw health queries without a `type`
pub const DEFAULT_ENTITY_TYPE: EntityType = EntityType::App;

pub struct MeshHealthService {
    config: AgentConfig,
    aggregator: HealthAggregator<KialiClient>,
    metrics: MeshHealthMetrics,
}

impl MeshHealthService {
    /// Build the service from a validated configuration
    pub fn new(config: AgentConfig) -> Result<Self> {
        config.validate()?;
        let client = KialiClient::new(&config)?;
        let metrics = MeshHealthMetrics::new()?;

        Ok(Self {
            config,
            aggregator: HealthAggregator::new(client),
            metrics,
        })
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn metrics(&self) -> &MeshHealthMetrics {
        &self.metrics
    }

    /// Compute the mesh health summary
    pub async fn summary(&self, query: SummaryQuery) -> Result<MeshHealthSummary> {
        let query = self.with_default_rate_interval(query);
        let _timer = self.metrics.start_timer();

        match self.with_deadline(self.aggregator.summarize(&query)).await {
            Ok(Ok(summary)) => {
                self.metrics.record_summary(&summary);
                Ok(summary)
            }
            Ok(Err(err)) => {
                let failed_fetch = match &err {
                    AggregationError::Fetch { entity_type, .. } => Some(*entity_type),
                    _ => None,
                };
                self.metrics.record_failure(failed_fetch);
                tracing::error!(error = %err, "Mesh health summary failed");
                Err(err.into())
            }
            Err(err) => {
                self.metrics.record_failure(None);
                tracing::error!(error = %err, "Mesh health summary timed out");
                Err(err)
            }
        }
    }

    /// Summary rendered as pretty-printed JSON
    pub async fn summary_json(&self, query: SummaryQuery) -> Result<String> {
        let summary = self.summary(query).await?;
        Ok(serde_json::to_string_pretty(&summary)?)
    }

    /// Raw health for one entity type
    ///
    /// `entity_type` must be `app`, `service` or `workload`; `None` or an
    /// empty value means `app`.
    pub async fn health(
        &self,
        namespaces: Option<&str>,
        entity_type: Option<&str>,
        params: &BTreeMap<String, String>,
    ) -> Result<serde_json::Value> {
        let entity_type = parse_entity_type(entity_type)?;

        let mut params = params.clone();
        params
            .entry(RATE_INTERVAL_PARAM.to_string())
            .or_insert_with(|| self.config.default_rate_interval.clone());

        let client = self.aggregator.fetcher();
        let body = match self
            .with_deadline(client.health(namespaces, entity_type, &params))
            .await?
        {
            Ok(body) => body,
            Err(err) => {
                self.metrics.record_fetch_failure(entity_type);
                return Err(err.into());
            }
        };

        Ok(serde_json::from_str(&body)?)
    }

    fn with_default_rate_interval(&self, mut query: SummaryQuery) -> SummaryQuery {
        let explicit = query
            .rate_interval
            .as_deref()
            .or_else(|| query.overrides.get(RATE_INTERVAL_PARAM).map(String::as_str))
            .is_some_and(|value| !value.trim().is_empty());
        if !explicit {
            query.rate_interval = Some(self.config.default_rate_interval.clone());
        }
        query
    }

    async fn with_deadline<T>(&self, fut: impl Future<Output = T>) -> Result<T> {
        let deadline = Duration::from_millis(self.config.deadline_ms);
        tokio::time::timeout(deadline, fut)
            .await
            .map_err(|_| AgentError::Timeout(self.config.deadline_ms))
    }
}

/// Validate a `type` parameter
pub fn parse_entity_type(raw: Option<&str>) -> Result<EntityType> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(DEFAULT_ENTITY_TYPE),
        Some(value) => value
            .parse()
            .map_err(|err: String| AgentError::invalid_input(err)),
    }
}

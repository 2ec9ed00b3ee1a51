//! Mesh health aggregation engine
//!
//! Fetches app, service and workload health concurrently, classifies every
//! entity and rolls the results up into a [`MeshHealthSummary`].

mod classifier;
mod ranker;
mod rollup;
mod tolerance;

pub use classifier::*;
pub use ranker::*;
pub use rollup::*;
pub use tolerance::*;

use chrono::Utc;
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Instant;

use crate::contracts::*;
use crate::error::{AggregationError, FetchError, Result};

/// Rate interval used when the caller does not provide one
pub const DEFAULT_RATE_INTERVAL: &str = "10m";

/// Query parameter carrying the rate interval
pub const RATE_INTERVAL_PARAM: &str = "rateInterval";

/// Boxed future returned by [`HealthFetcher::fetch`]
pub type FetchFuture = Pin<Box<dyn Future<Output = std::result::Result<String, FetchError>> + Send>>;

/// Source of raw per-type health documents
pub trait HealthFetcher: Send + Sync {
    /// Fetcher identifier
    fn id(&self) -> &str;

    /// Fetch the raw health body for one entity type (takes an owned request
    /// so the future does not borrow the caller)
    fn fetch(&self, request: HealthRequest) -> FetchFuture;
}

/// One upstream health request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthRequest {
    /// Normalised comma-separated namespaces; `None` means all accessible
    pub namespaces: Option<String>,
    pub entity_type: EntityType,
    /// Extra query parameters (rate interval, query time, overrides)
    pub params: BTreeMap<String, String>,
}

impl HealthRequest {
    pub fn new(namespaces: Option<&str>, entity_type: EntityType) -> Self {
        Self {
            namespaces: namespaces.and_then(normalize_namespaces),
            entity_type,
            params: BTreeMap::new(),
        }
    }

    pub fn with_params(mut self, params: &BTreeMap<String, String>) -> Self {
        self.params
            .extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Query string pairs; `type` always reflects `entity_type`
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.params.len() + 2);
        if let Some(namespaces) = &self.namespaces {
            pairs.push(("namespaces".to_string(), namespaces.clone()));
        }
        pairs.extend(
            self.params
                .iter()
                .filter(|(key, _)| key.as_str() != "type" && key.as_str() != "namespaces")
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        pairs.push(("type".to_string(), self.entity_type.as_str().to_string()));
        pairs
    }
}

/// Trim each namespace and drop empty entries; `None` when nothing remains
pub fn normalize_namespaces(raw: &str) -> Option<String> {
    let cleaned: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|ns| !ns.is_empty())
        .collect();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.join(","))
    }
}

/// Caller input for one summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryQuery {
    /// Comma-separated namespace filter
    pub namespaces: Option<String>,
    /// Prometheus rate interval, e.g. `5m`
    pub rate_interval: Option<String>,
    /// Further parameters forwarded to every fetch, e.g. `queryTime`
    pub overrides: BTreeMap<String, String>,
}

impl SummaryQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn namespaces(mut self, namespaces: impl Into<String>) -> Self {
        self.namespaces = Some(namespaces.into());
        self
    }

    pub fn rate_interval(mut self, rate_interval: impl Into<String>) -> Self {
        self.rate_interval = Some(rate_interval.into());
        self
    }

    pub fn with_override(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.insert(key.into(), value.into());
        self
    }

    /// Effective rate interval: explicit field, then override, then default
    pub fn effective_rate_interval(&self) -> String {
        self.rate_interval
            .as_deref()
            .or_else(|| self.overrides.get(RATE_INTERVAL_PARAM).map(String::as_str))
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_RATE_INTERVAL)
            .to_string()
    }

    /// Request for one entity type
    pub fn request_for(&self, entity_type: EntityType) -> HealthRequest {
        let mut params = self.overrides.clone();
        params.insert(RATE_INTERVAL_PARAM.to_string(), self.effective_rate_interval());
        HealthRequest::new(self.namespaces.as_deref(), entity_type).with_params(&params)
    }
}

/// Orchestrates the three fetches and the rollup
pub struct HealthAggregator<F> {
    fetcher: F,
}

impl<F: HealthFetcher> HealthAggregator<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Fetch, classify and roll up mesh health
    ///
    /// All three fetches run concurrently and must all succeed. Dropping the
    /// returned future drops the in-flight fetches with it.
    pub async fn summarize(&self, query: &SummaryQuery) -> Result<MeshHealthSummary> {
        let start = Instant::now();
        let rate_interval = query.effective_rate_interval();

        let [apps, services, workloads] = EntityType::ALL.map(|t| self.fetch_typed(query, t));
        let (apps, services, workloads) = futures::future::join3(apps, services, workloads).await;

        // Report in a fixed order so concurrent failures are deterministic
        let apps = parse_payload(EntityType::App, apps?)?;
        let services = parse_payload(EntityType::Service, services?)?;
        let workloads = parse_payload(EntityType::Workload, workloads?)?;

        let summary = compute_summary(
            HealthPayloads {
                apps: &apps,
                services: &services,
                workloads: &workloads,
            },
            rate_interval,
            Utc::now(),
        );

        tracing::info!(
            fetcher = self.fetcher.id(),
            overall_status = %summary.overall_status,
            namespaces = summary.namespace_count,
            unhealthy = summary.top_unhealthy.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Mesh health summary computed"
        );

        Ok(summary)
    }

    /// Summary rendered as pretty-printed JSON
    pub async fn summarize_json(&self, query: &SummaryQuery) -> Result<String> {
        let summary = self.summarize(query).await?;
        Ok(serde_json::to_string_pretty(&summary)?)
    }

    fn fetch_typed(
        &self,
        query: &SummaryQuery,
        entity_type: EntityType,
    ) -> impl Future<Output = Result<String>> {
        let request = query.request_for(entity_type);
        tracing::debug!(
            entity_type = %entity_type,
            namespaces = request.namespaces.as_deref().unwrap_or("*"),
            "Fetching health"
        );
        let fetch = self.fetcher.fetch(request);
        async move {
            fetch.await.map_err(|source| {
                tracing::warn!(entity_type = %entity_type, error = %source, "Health fetch failed");
                AggregationError::Fetch {
                    entity_type,
                    source,
                }
            })
        }
    }
}

/// Parse one upstream body
pub fn parse_payload(entity_type: EntityType, body: String) -> Result<ClustersNamespaceHealth> {
    serde_json::from_str(&body).map_err(|source| AggregationError::Parse {
        entity_type,
        source,
    })
}

//! Kiali health API client
//!
//! Thin GET wrapper around `/api/clusters/health`. Bodies are returned as
//! raw strings; parsing belongs to the aggregation engine.

use mesh_health_core::engine::{FetchFuture, HealthFetcher, HealthRequest};
use mesh_health_core::{EntityType, FetchError};
use reqwest::header::{HeaderValue, ACCEPT};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::AgentConfig;

const HEALTH_PATH: &str = "/api/clusters/health";

/// Client for the Kiali health endpoint
#[derive(Clone)]
pub struct KialiClient {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl KialiClient {
    /// Create a client from agent configuration
    pub fn new(config: &AgentConfig) -> Result<Self, FetchError> {
        let base_url = config.kiali_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(FetchError::NotConfigured);
        }

        let timeout = Duration::from_millis(config.timeout_ms);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(config.insecure)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| FetchError::InvalidRequest(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            client,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Endpoint the health requests are sent to
    pub fn health_url(&self) -> String {
        format!("{}{}", self.base_url, HEALTH_PATH)
    }

    /// Raw health for a single entity type
    pub async fn health(
        &self,
        namespaces: Option<&str>,
        entity_type: EntityType,
        params: &BTreeMap<String, String>,
    ) -> Result<String, FetchError> {
        let request = HealthRequest::new(namespaces, entity_type).with_params(params);
        execute(self.client.clone(), self.health_url(), request, self.timeout).await
    }
}

impl HealthFetcher for KialiClient {
    fn id(&self) -> &str {
        "kiali"
    }

    fn fetch(&self, request: HealthRequest) -> FetchFuture {
        Box::pin(execute(
            self.client.clone(),
            self.health_url(),
            request,
            self.timeout,
        ))
    }
}

async fn execute(
    client: reqwest::Client,
    url: String,
    request: HealthRequest,
    timeout: Duration,
) -> Result<String, FetchError> {
    tracing::info!(
        url = %url,
        entity_type = %request.entity_type,
        "kiali API call"
    );

    let response = client
        .get(&url)
        .query(&request.query_pairs())
        .header(ACCEPT, HeaderValue::from_static("application/json"))
        .send()
        .await
        .map_err(|e| map_transport_error(e, timeout))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| map_transport_error(e, timeout))?;

    if status.is_success() {
        Ok(body)
    } else {
        tracing::warn!(
            status = status.as_u16(),
            entity_type = %request.entity_type,
            "kiali API returned non-success status"
        );
        Err(FetchError::from_response(status.as_u16(), &body))
    }
}

fn map_transport_error(err: reqwest::Error, timeout: Duration) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout(timeout.as_millis() as u64)
    } else {
        FetchError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> AgentConfig {
        AgentConfig {
            kiali_url: url.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_requires_base_url() {
        assert!(matches!(
            KialiClient::new(&config("  ")),
            Err(FetchError::NotConfigured)
        ));
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let client = KialiClient::new(&config("http://kiali:20001/kiali/")).unwrap();
        assert_eq!(client.base_url(), "http://kiali:20001/kiali");
        assert_eq!(
            client.health_url(),
            "http://kiali:20001/kiali/api/clusters/health"
        );
    }
}

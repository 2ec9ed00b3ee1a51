//! HTTP handler for the Mesh Health Agent

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use mesh_health_core::engine::SummaryQuery;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::error::AgentError;
use crate::service::MeshHealthService;
use crate::{AGENT_ID, AGENT_VERSION};

const QUERY_TIME_PARAM: &str = "queryTime";

/// Application state
pub struct AppState {
    pub service: MeshHealthService,
}

impl AppState {
    pub fn new(service: MeshHealthService) -> Self {
        Self { service }
    }
}

/// Create the router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/api/v1/mesh/health-summary", get(mesh_health_summary))
        .route("/api/v1/mesh/health", get(mesh_health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness endpoint
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        agent_id: AGENT_ID.to_string(),
        agent_version: AGENT_VERSION.to_string(),
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> Result<Response, ApiFailure> {
    let body = state
        .service
        .metrics()
        .encode_text()
        .map_err(|e| ApiFailure::from(AgentError::from(e)))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}

/// Aggregated mesh health summary
async fn mesh_health_summary(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HealthParams>,
) -> Result<Response, ApiFailure> {
    let body = state.service.summary_json(params.summary_query()).await?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

/// Raw health for one entity type
async fn mesh_health(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HealthParams>,
) -> Result<Json<serde_json::Value>, ApiFailure> {
    let health = state
        .service
        .health(
            params.namespaces.as_deref(),
            params.entity_type.as_deref(),
            &params.forwarded(),
        )
        .await?;
    Ok(Json(health))
}

/// Query parameters accepted by the mesh endpoints
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthParams {
    pub namespaces: Option<String>,
    pub rate_interval: Option<String>,
    pub query_time: Option<String>,
    #[serde(rename = "type")]
    pub entity_type: Option<String>,
}

impl HealthParams {
    pub fn summary_query(&self) -> SummaryQuery {
        let mut query = SummaryQuery::new();
        if let Some(namespaces) = &self.namespaces {
            query = query.namespaces(namespaces.clone());
        }
        if let Some(rate_interval) = &self.rate_interval {
            query = query.rate_interval(rate_interval.clone());
        }
        if let Some(query_time) = self.query_time() {
            query = query.with_override(QUERY_TIME_PARAM, query_time);
        }
        query
    }

    /// Parameters forwarded verbatim on a raw health call
    pub fn forwarded(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        if let Some(rate_interval) = self
            .rate_interval
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
        {
            params.insert("rateInterval".to_string(), rate_interval.to_string());
        }
        if let Some(query_time) = self.query_time() {
            params.insert(QUERY_TIME_PARAM.to_string(), query_time.to_string());
        }
        params
    }

    fn query_time(&self) -> Option<&str> {
        self.query_time
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub agent_id: String,
    pub agent_version: String,
}

/// API error
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub message: String,
    pub request_id: Option<Uuid>,
}

/// Error response carrying its status code
#[derive(Debug)]
pub struct ApiFailure {
    pub status: StatusCode,
    pub body: ApiError,
}

impl From<AgentError> for ApiFailure {
    fn from(err: AgentError) -> Self {
        let (status, kind) = if err.is_user_error() {
            (StatusCode::BAD_REQUEST, "InvalidInput")
        } else if err.is_upstream_error() {
            (StatusCode::BAD_GATEWAY, "UpstreamError")
        } else {
            (StatusCode::INTERNAL_SERVER_ERROR, "InternalError")
        };

        let request_id = Uuid::new_v4();
        tracing::warn!(
            request_id = %request_id,
            status = status.as_u16(),
            error = %err,
            "Request failed"
        );

        Self {
            status,
            body: ApiError {
                error: kind.to_string(),
                message: err.to_string(),
                request_id: Some(request_id),
            },
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

//! Error types for mesh health aggregation

use thiserror::Error;

use crate::contracts::EntityType;

/// Failure of a single upstream health fetch
#[derive(Error, Debug)]
pub enum FetchError {
    /// No upstream base URL configured
    #[error("kiali server URL not configured")]
    NotConfigured,

    /// Connection or transport failure
    #[error("{0}")]
    Network(String),

    /// Upstream answered with a non-2xx status
    #[error("kiali API error: {message}")]
    Status { status: u16, message: String },

    /// Request exceeded its deadline
    #[error("request timed out after {0}ms")]
    Timeout(u64),

    /// Request could not be built
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl FetchError {
    /// Build a status error, preferring the response body as the message
    pub fn from_response(status: u16, body: &str) -> Self {
        let body = body.trim();
        let message = if body.is_empty() {
            format!("status {}", status)
        } else {
            body.to_string()
        };
        FetchError::Status { status, message }
    }

    /// Whether the upstream was reached at all
    pub fn is_upstream_response(&self) -> bool {
        matches!(self, FetchError::Status { .. })
    }
}

/// Failure of a whole aggregation call
#[derive(Error, Debug)]
pub enum AggregationError {
    /// One of the three per-type fetches failed
    #[error("failed to fetch {entity_type} health: {source}")]
    Fetch {
        entity_type: EntityType,
        source: FetchError,
    },

    /// A payload did not match the expected shape
    #[error("failed to parse {entity_type} health: {source}")]
    Parse {
        entity_type: EntityType,
        source: serde_json::Error,
    },

    /// Summary could not be serialized
    #[error("failed to marshal summary: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AggregationError {
    /// Entity type whose fetch or parse failed
    pub fn entity_type(&self) -> Option<EntityType> {
        match self {
            AggregationError::Fetch { entity_type, .. }
            | AggregationError::Parse { entity_type, .. } => Some(*entity_type),
            AggregationError::Serialization(_) => None,
        }
    }
}

/// Result type alias for aggregation operations
pub type Result<T> = std::result::Result<T, AggregationError>;

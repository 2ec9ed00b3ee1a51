//! Error types for the Mesh Health Agent

use mesh_health_core::{AggregationError, FetchError};
use thiserror::Error;

use crate::telemetry::TelemetryError;

/// Main error type for agent operations
#[derive(Error, Debug)]
pub enum AgentError {
    /// Invalid input data or arguments
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration could not be loaded or is inconsistent
    #[error("Configuration error: {0}")]
    Config(String),

    /// Summary aggregation failed
    #[error("failed to get mesh health summary: {0}")]
    Aggregation(#[from] AggregationError),

    /// Single-type health query failed
    #[error("failed to get health: {0}")]
    Upstream(#[from] FetchError),

    /// Call exceeded the agent's deadline
    #[error("Timed out after {0}ms")]
    Timeout(u64),

    /// Metrics registration or encoding failed
    #[error("Telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),

    /// File access or I/O error
    #[error("File error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AgentError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        AgentError::InvalidInput(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        AgentError::Config(msg.into())
    }

    /// Check if this is a user-facing error (vs upstream or internal)
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            AgentError::InvalidInput(_) | AgentError::Config(_) | AgentError::Io(_)
        )
    }

    /// Whether the failure came from the upstream health API
    pub fn is_upstream_error(&self) -> bool {
        matches!(
            self,
            AgentError::Aggregation(_) | AgentError::Upstream(_) | AgentError::Timeout(_)
        )
    }
}

impl From<serde_json::Error> for AgentError {
    fn from(err: serde_json::Error) -> Self {
        AgentError::Serialization(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for AgentError {
    fn from(err: serde_yaml::Error) -> Self {
        AgentError::Config(format!("YAML error: {}", err))
    }
}

impl From<toml::de::Error> for AgentError {
    fn from(err: toml::de::Error) -> Self {
        AgentError::Config(format!("TOML error: {}", err))
    }
}

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

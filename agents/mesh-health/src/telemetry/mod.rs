//! Telemetry for the Mesh Health Agent
//!
//! - `metrics` - Prometheus metrics for summary and health calls
//!
//! Logging goes through `tracing`; the subscriber is installed by the binary.

pub mod metrics;

pub use metrics::{MeshHealthMetrics, SummaryTimer};

use thiserror::Error;

/// Telemetry errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Metrics error: {0}")]
    MetricsError(#[from] prometheus::Error),

    #[error("Failed to encode metrics: {0}")]
    EncodingFailed(String),
}

pub type Result<T> = std::result::Result<T, TelemetryError>;

//! Mesh Health Agent
//!
//! Serves aggregated service-mesh health over HTTP and the command line,
//! backed by the Kiali `/api/clusters/health` endpoint.
//!
//! - `client` - Kiali HTTP client implementing the core `HealthFetcher`
//! - `service` - summary and raw health calls with deadline and metrics
//! - `handler` - axum router
//! - `cli` - clap commands and output rendering

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod service;
pub mod telemetry;

pub use client::KialiClient;
pub use config::AgentConfig;
pub use error::{AgentError, Result};
pub use service::MeshHealthService;

/// Agent identifier reported by the liveness endpoint
pub const AGENT_ID: &str = "mesh-health-agent";

/// Agent version reported by the liveness endpoint
pub const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

//! CLI module for the Mesh Health Agent
//!
//! `summary` prints the aggregated mesh health, `health` prints the raw
//! upstream document for one entity type and `serve` starts the HTTP API.

pub mod output;

pub use output::{render_summary, OutputFormat};

use clap::{Args, Parser, Subcommand};
use mesh_health_core::engine::SummaryQuery;
use mesh_health_core::{HealthStatus, MeshHealthSummary};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::AgentConfig;
use crate::error::{AgentError, Result};
use crate::handler::{create_router, AppState};
use crate::service::MeshHealthService;
use crate::{AGENT_ID, AGENT_VERSION};

#[derive(Parser, Debug)]
#[command(name = "mesh-health")]
#[command(about = "Mesh Health Agent - aggregated service-mesh health over the Kiali API")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Connection settings shared by every command
#[derive(Args, Debug, Default)]
pub struct GlobalArgs {
    /// Config file (YAML, TOML or JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Kiali base URL
    #[arg(long, global = true)]
    pub kiali_url: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long, global = true)]
    pub insecure: bool,

    /// Per-request timeout in milliseconds
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
    },

    /// Print the aggregated mesh health summary
    Summary {
        /// Comma-separated namespaces (all accessible when omitted)
        #[arg(short, long)]
        namespaces: Option<String>,

        /// Rate interval for request metrics, e.g. 5m
        #[arg(short, long)]
        rate_interval: Option<String>,

        /// Evaluation time as a unix timestamp
        #[arg(long)]
        query_time: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// Print raw upstream health for one entity type
    Health {
        /// Comma-separated namespaces (all accessible when omitted)
        #[arg(short, long)]
        namespaces: Option<String>,

        /// Entity type: app, service or workload
        #[arg(short = 't', long = "type")]
        entity_type: Option<String>,

        /// Rate interval for request metrics, e.g. 5m
        #[arg(short, long)]
        rate_interval: Option<String>,

        /// Evaluation time as a unix timestamp
        #[arg(long)]
        query_time: Option<String>,
    },
}

impl Commands {
    pub fn is_server(&self) -> bool {
        matches!(self, Commands::Serve { .. })
    }
}

/// Exit codes for CLI operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Mesh is not unhealthy
    Success = 0,
    /// Overall mesh status is UNHEALTHY
    Unhealthy = 1,
    /// Invalid input or configuration
    InvalidInput = 3,
    /// Upstream health API failed
    UpstreamError = 4,
    /// Internal error
    InternalError = 10,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl ExitCode {
    pub fn from_summary(summary: &MeshHealthSummary) -> Self {
        if summary.overall_status == HealthStatus::Unhealthy {
            ExitCode::Unhealthy
        } else {
            ExitCode::Success
        }
    }

    pub fn from_error(err: &AgentError) -> Self {
        if err.is_user_error() {
            ExitCode::InvalidInput
        } else if err.is_upstream_error() {
            ExitCode::UpstreamError
        } else {
            ExitCode::InternalError
        }
    }
}

/// Resolve configuration: file and environment, then CLI flags
pub fn resolve_config(global: &GlobalArgs) -> Result<AgentConfig> {
    let mut config = AgentConfig::load(global.config.as_deref())?;
    if let Some(url) = &global.kiali_url {
        config.kiali_url = url.clone();
    }
    if global.insecure {
        config.insecure = true;
    }
    if let Some(timeout_ms) = global.timeout_ms {
        config.timeout_ms = timeout_ms;
    }
    Ok(config)
}

/// Run the CLI and return the exit code
pub async fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = resolve_config(&cli.global)?;

    match cli.command {
        Commands::Serve { port, host } => {
            if let Some(port) = port {
                config.listen_port = port;
            }
            if let Some(host) = host {
                config.listen_host = host;
            }
            serve(config).await?;
            Ok(ExitCode::Success)
        }

        Commands::Summary {
            namespaces,
            rate_interval,
            query_time,
            format,
        } => {
            let service = MeshHealthService::new(config)?;
            let mut query = SummaryQuery::new();
            if let Some(namespaces) = namespaces {
                query = query.namespaces(namespaces);
            }
            if let Some(rate_interval) = rate_interval {
                query = query.rate_interval(rate_interval);
            }
            if let Some(query_time) = query_time {
                query = query.with_override("queryTime", query_time);
            }

            let summary = service.summary(query).await?;
            println!("{}", render_summary(&summary, format)?);
            Ok(ExitCode::from_summary(&summary))
        }

        Commands::Health {
            namespaces,
            entity_type,
            rate_interval,
            query_time,
        } => {
            let service = MeshHealthService::new(config)?;
            let mut params = BTreeMap::new();
            if let Some(rate_interval) = rate_interval {
                params.insert("rateInterval".to_string(), rate_interval);
            }
            if let Some(query_time) = query_time {
                params.insert("queryTime".to_string(), query_time);
            }

            let health = service
                .health(namespaces.as_deref(), entity_type.as_deref(), &params)
                .await?;
            println!("{}", serde_json::to_string_pretty(&health)?);
            Ok(ExitCode::Success)
        }
    }
}

async fn serve(config: AgentConfig) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.listen_host, config.listen_port)
        .parse()
        .map_err(|e| AgentError::config(format!("invalid listen address: {}", e)))?;

    let service = MeshHealthService::new(config)?;
    tracing::info!(
        kiali_url = %service.config().kiali_url,
        "Starting Mesh Health Agent on {}",
        addr
    );
    tracing::info!("Agent ID: {}, Version: {}", AGENT_ID, AGENT_VERSION);

    let router = create_router(Arc::new(AppState::new(service)));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

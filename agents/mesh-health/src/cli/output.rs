//! Output formatting for the Mesh Health Agent CLI
//!
//! JSON and YAML for machines, a colored text view for people.

use clap::ValueEnum;
use colored::{ColoredString, Colorize};
use mesh_health_core::{HealthCounts, HealthStatus, MeshHealthSummary};
use std::fmt::Write;

use crate::error::{AgentError, Result};

/// Output format options for CLI results
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    #[default]
    Json,
    /// YAML
    Yaml,
    /// Human-readable text with colors
    Text,
}

/// Render a summary in the requested format
pub fn render_summary(summary: &MeshHealthSummary, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(summary)?),
        OutputFormat::Yaml => serde_yaml::to_string(summary)
            .map_err(|e| AgentError::Serialization(format!("YAML error: {}", e))),
        OutputFormat::Text => Ok(render_text(summary)),
    }
}

fn render_text(summary: &MeshHealthSummary) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", "Mesh Health Summary".cyan().bold());
    let _ = writeln!(out, "{}", "=".repeat(60));
    let _ = writeln!(
        out,
        "Overall status:   {}",
        paint(summary.overall_status)
    );
    let _ = writeln!(out, "Availability:     {:.2}%", summary.availability);
    let _ = writeln!(
        out,
        "Error rate:       {:.2}%",
        summary.total_error_rate * 100.0
    );
    let _ = writeln!(out, "Namespaces:       {}", summary.namespace_count);
    let _ = writeln!(out, "Rate interval:    {}", summary.rate_interval);
    let _ = writeln!(out, "Timestamp:        {}", summary.timestamp.to_rfc3339());
    let _ = writeln!(out);

    let counts = &summary.entity_counts;
    let _ = writeln!(out, "{}", "Entities".bold());
    let _ = writeln!(out, "  {}", counts_line("apps", &counts.apps));
    let _ = writeln!(out, "  {}", counts_line("services", &counts.services));
    let _ = writeln!(out, "  {}", counts_line("workloads", &counts.workloads));

    if !summary.namespace_summary.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", "Namespaces".bold());
        for (name, ns) in &summary.namespace_summary {
            let _ = writeln!(
                out,
                "  {:<30} {:<10} {:>7.2}%",
                name,
                paint(ns.status),
                ns.availability
            );
        }
    }

    if !summary.top_unhealthy.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", "Top unhealthy".bold());
        for entity in &summary.top_unhealthy {
            let _ = writeln!(
                out,
                "  {} {}/{} ({}) {}",
                paint(entity.status),
                entity.namespace,
                entity.name,
                entity.entity_type,
                entity.issue.dimmed()
            );
        }
    }

    out
}

fn counts_line(label: &str, counts: &HealthCounts) -> String {
    format!(
        "{:<10} total {:>4}  healthy {:>4}  degraded {:>4}  unhealthy {:>4}  not ready {:>4}",
        label, counts.total, counts.healthy, counts.degraded, counts.unhealthy, counts.not_ready
    )
}

fn paint(status: HealthStatus) -> ColoredString {
    let label = status.as_str();
    match status {
        HealthStatus::Healthy => label.green(),
        HealthStatus::Degraded | HealthStatus::NotReady => label.yellow(),
        HealthStatus::Unhealthy => label.red().bold(),
        HealthStatus::Unknown => label.dimmed(),
    }
}

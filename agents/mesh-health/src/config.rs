//! Agent configuration
//!
//! Layered as defaults, then an optional file (YAML, TOML or JSON by
//! extension), then environment variables. CLI flags are applied last by the
//! binary.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{AgentError, Result};
use mesh_health_core::engine::DEFAULT_RATE_INTERVAL;

/// Mesh Health Agent configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Base URL of the Kiali server
    pub kiali_url: String,

    /// Skip TLS certificate verification
    pub insecure: bool,

    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,

    /// Deadline for a whole summary call in milliseconds
    pub deadline_ms: u64,

    /// Rate interval used when a caller does not send one
    pub default_rate_interval: String,

    /// Host to bind to when serving
    pub listen_host: String,

    /// Port to listen on when serving
    pub listen_port: u16,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            kiali_url: String::new(),
            insecure: false,
            timeout_ms: 30_000,
            deadline_ms: 45_000,
            default_rate_interval: DEFAULT_RATE_INTERVAL.to_string(),
            listen_host: "0.0.0.0".to_string(),
            listen_port: 8083,
        }
    }
}

impl AgentConfig {
    /// Load from an optional file, then overlay the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(config.with_env(|key| std::env::var(key).ok()))
    }

    /// Parse a config file; format is chosen by extension
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&content)?),
            Some("toml") => Ok(toml::from_str(&content)?),
            _ => serde_json::from_str(&content)
                .map_err(|e| AgentError::config(format!("JSON error: {}", e))),
        }
    }

    /// Overlay values from an environment lookup
    ///
    /// Unparsable numeric or boolean values are ignored and keep the
    /// previous setting.
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("KIALI_URL") {
            self.kiali_url = url;
        }
        if let Some(insecure) = lookup("KIALI_INSECURE").and_then(|v| v.parse().ok()) {
            self.insecure = insecure;
        }
        if let Some(timeout) = lookup("KIALI_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.timeout_ms = timeout;
        }
        if let Some(deadline) = lookup("MESH_HEALTH_DEADLINE_MS").and_then(|v| v.parse().ok()) {
            self.deadline_ms = deadline;
        }
        if let Some(interval) = lookup("MESH_HEALTH_RATE_INTERVAL") {
            self.default_rate_interval = interval;
        }
        if let Some(host) = lookup("HOST") {
            self.listen_host = host;
        }
        if let Some(port) = lookup("PORT").and_then(|v| v.parse().ok()) {
            self.listen_port = port;
        }
        self
    }

    /// Reject configurations the agent cannot run with
    pub fn validate(&self) -> Result<()> {
        let url = self.kiali_url.trim();
        if url.is_empty() {
            return Err(AgentError::config("kiali server URL not configured"));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(AgentError::config(format!(
                "kiali server URL must start with http:// or https:// (got '{}')",
                url
            )));
        }
        if self.timeout_ms == 0 {
            return Err(AgentError::config("timeout_ms must be greater than zero"));
        }
        if self.deadline_ms == 0 {
            return Err(AgentError::config("deadline_ms must be greater than zero"));
        }
        if self.default_rate_interval.trim().is_empty() {
            return Err(AgentError::config("default_rate_interval must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AgentConfig::default();
        assert_eq!(config.default_rate_interval, "10m");
        assert_eq!(config.listen_port, 8083);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overlay() {
        let config = AgentConfig::default().with_env(env(&[
            ("KIALI_URL", "https://kiali.istio-system:20001"),
            ("KIALI_INSECURE", "true"),
            ("KIALI_TIMEOUT_MS", "not-a-number"),
            ("PORT", "9000"),
        ]));

        assert_eq!(config.kiali_url, "https://kiali.istio-system:20001");
        assert!(config.insecure);
        assert_eq!(config.timeout_ms, 30_000);
        assert_eq!(config.listen_port, 9000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AgentConfig {
            kiali_url: "kiali:20001".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config.kiali_url = "http://kiali:20001".to_string();
        config.timeout_ms = 0;
        assert!(config.validate().is_err());

        config.timeout_ms = 1_000;
        config.deadline_ms = 0;
        assert!(config.validate().is_err());

        config.deadline_ms = 500;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "kiali_url: http://localhost:20001\ntimeout_ms: 5000").unwrap();

        let config = AgentConfig::from_file(file.path()).unwrap();
        assert_eq!(config.kiali_url, "http://localhost:20001");
        assert_eq!(config.timeout_ms, 5000);
        assert_eq!(config.deadline_ms, 45_000);
    }

    #[test]
    fn test_load_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "kiali_url = \"http://localhost:20001\"\ninsecure = true").unwrap();

        let config = AgentConfig::from_file(file.path()).unwrap();
        assert!(config.insecure);
    }

    #[test]
    fn test_load_invalid_json_is_config_error() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        writeln!(file, "{{ not json").unwrap();

        let err = AgentConfig::from_file(file.path()).unwrap_err();
        assert!(err.is_user_error());
    }
}

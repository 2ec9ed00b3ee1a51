//! Upstream health API payloads
//!
//! Only the fields the engine needs are modelled. Missing or `null`
//! collections deserialize to empty ones so that partial records still
//! classify (usually as `UNKNOWN`) instead of failing the whole call.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Protocol name -> response code -> observed count
pub type ProtocolCounters = BTreeMap<String, BTreeMap<String, f64>>;

/// Namespace -> entity name -> health payload
pub type NamespaceHealth<T> = BTreeMap<String, BTreeMap<String, T>>;

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn not_applicable() -> i32 {
    -1
}

/// Request counters by direction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestHealth {
    #[serde(default, deserialize_with = "null_as_default")]
    pub inbound: ProtocolCounters,

    #[serde(default, deserialize_with = "null_as_default")]
    pub outbound: ProtocolCounters,

    /// Per-entity tolerance overrides; carried but not evaluated
    #[serde(default, deserialize_with = "null_as_default")]
    pub health_annotations: BTreeMap<String, String>,
}

impl RequestHealth {
    /// Both directions, inbound first
    pub fn directions(&self) -> [&ProtocolCounters; 2] {
        [&self.inbound, &self.outbound]
    }
}

/// Replica status of one workload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadStatus {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub desired_replicas: i32,

    #[serde(default)]
    pub current_replicas: i32,

    #[serde(default)]
    pub available_replicas: i32,

    /// Negative when proxy sync does not apply
    #[serde(default = "not_applicable")]
    pub synced_proxies: i32,
}

/// Health of an application (a set of workloads sharing an app label)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppHealth {
    #[serde(default, deserialize_with = "null_as_default")]
    pub workload_statuses: Vec<WorkloadStatus>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub requests: RequestHealth,
}

/// Health of a service; traffic only
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceHealth {
    #[serde(default, deserialize_with = "null_as_default")]
    pub requests: RequestHealth,
}

/// Health of a single workload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadHealth {
    #[serde(default)]
    pub workload_status: Option<WorkloadStatus>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub requests: RequestHealth,
}

/// Body of `GET /api/clusters/health`
///
/// Only the key matching the requested `type` is populated by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClustersNamespaceHealth {
    #[serde(default, deserialize_with = "null_as_default")]
    pub namespace_app_health: NamespaceHealth<AppHealth>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub namespace_service_health: NamespaceHealth<ServiceHealth>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub namespace_workload_health: NamespaceHealth<WorkloadHealth>,
}

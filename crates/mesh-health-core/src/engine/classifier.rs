//! Per-entity health classification
//!
//! Replica state and request health are judged separately and merged, worst
//! status wins.

use crate::contracts::{AppHealth, HealthStatus, ServiceHealth, WorkloadHealth, WorkloadStatus};

use super::tolerance::{aggregate_error_rate, evaluate_request_health, has_traffic};

/// Outcome of classifying one entity
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub status: HealthStatus,
    /// Human readable reason, empty when nothing stands out
    pub issue: String,
    /// Volume-weighted error share of the entity's traffic
    pub error_rate: f64,
}

impl Classification {
    fn unknown(issue: impl Into<String>, error_rate: f64) -> Self {
        Self {
            status: HealthStatus::Unknown,
            issue: issue.into(),
            error_rate,
        }
    }
}

/// Running verdict over one or more workload statuses
#[derive(Debug, Clone)]
struct ReplicaAssessment {
    status: HealthStatus,
    issue: String,
    observed: usize,
    scaled_down: usize,
}

impl ReplicaAssessment {
    fn new() -> Self {
        Self {
            status: HealthStatus::Healthy,
            issue: String::new(),
            observed: 0,
            scaled_down: 0,
        }
    }

    /// Every observed workload is scaled to zero
    fn fully_scaled_down(&self) -> bool {
        self.observed > 0 && self.scaled_down == self.observed
    }

    fn observe(&mut self, ws: &WorkloadStatus) {
        self.observed += 1;
        // Scaled to zero on purpose, not a failure
        if ws.desired_replicas == 0 {
            self.scaled_down += 1;
            self.status = self.status.merge(HealthStatus::NotReady);
            self.issue = "scaled to 0 replicas".to_string();
            return;
        }

        if ws.available_replicas < ws.desired_replicas {
            self.issue = format!(
                "{}/{} replicas available",
                ws.available_replicas, ws.desired_replicas
            );
            let shortfall = if ws.available_replicas == 0 {
                HealthStatus::Unhealthy
            } else {
                HealthStatus::Degraded
            };
            self.status = self.status.merge(shortfall);
        }

        if ws.synced_proxies >= 0 && ws.synced_proxies < ws.available_replicas {
            if self.issue.is_empty() {
                self.issue = format!(
                    "{}/{} proxies synced",
                    ws.synced_proxies, ws.available_replicas
                );
            }
            self.status = self.status.merge(HealthStatus::Degraded);
        }
    }

    /// Fold in request health and fill the issue from the error ratio if
    /// replicas gave no reason; a fully scaled-down entity stays `NotReady`
    fn finish(mut self, request_status: HealthStatus, worst_ratio: f64, error_rate: f64) -> Classification {
        if worst_ratio > 0.0 && self.issue.is_empty() {
            self.issue = error_rate_issue(worst_ratio);
        }
        // Leftover traffic errors never fail a deliberately scaled-down entity
        let status = if self.fully_scaled_down() {
            HealthStatus::NotReady
        } else {
            self.status.merge(request_status)
        };
        Classification {
            status,
            issue: self.issue,
            error_rate,
        }
    }
}

fn error_rate_issue(ratio: f64) -> String {
    format!("error rate: {:.2}%", ratio * 100.0)
}

/// Classify an application
pub fn classify_app(app: &AppHealth) -> Classification {
    let error_rate = aggregate_error_rate(&app.requests);
    if app.workload_statuses.is_empty() {
        return Classification::unknown("no workloads found", error_rate);
    }

    let mut assessment = ReplicaAssessment::new();
    for ws in &app.workload_statuses {
        assessment.observe(ws);
    }

    let (request_status, worst_ratio) = evaluate_request_health(&app.requests);
    assessment.finish(request_status, worst_ratio, error_rate)
}

/// Classify a service
pub fn classify_service(service: &ServiceHealth) -> Classification {
    if !has_traffic(&service.requests) {
        return Classification::unknown("", 0.0);
    }

    let (status, worst_ratio) = evaluate_request_health(&service.requests);
    let issue = if worst_ratio > 0.0 {
        error_rate_issue(worst_ratio)
    } else {
        String::new()
    };

    Classification {
        status,
        issue,
        error_rate: aggregate_error_rate(&service.requests),
    }
}

/// Classify a single workload
pub fn classify_workload(workload: &WorkloadHealth) -> Classification {
    let traffic = has_traffic(&workload.requests);
    if !traffic && workload.workload_status.is_none() {
        return Classification::unknown("", 0.0);
    }

    let mut assessment = ReplicaAssessment::new();
    if let Some(ws) = &workload.workload_status {
        assessment.observe(ws);
    }

    let (request_status, worst_ratio) = evaluate_request_health(&workload.requests);
    assessment.finish(
        request_status,
        worst_ratio,
        aggregate_error_rate(&workload.requests),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::RequestHealth;
    use std::collections::BTreeMap;

    fn status(desired: i32, available: i32, synced: i32) -> WorkloadStatus {
        WorkloadStatus {
            name: "reviews-v1".to_string(),
            desired_replicas: desired,
            current_replicas: desired,
            available_replicas: available,
            synced_proxies: synced,
        }
    }

    fn http(codes: &[(&str, f64)]) -> RequestHealth {
        let mut inbound = BTreeMap::new();
        inbound.insert(
            "http".to_string(),
            codes
                .iter()
                .map(|(code, count)| (code.to_string(), *count))
                .collect(),
        );
        RequestHealth {
            inbound,
            ..Default::default()
        }
    }

    #[test]
    fn test_app_without_workloads_is_unknown() {
        let result = classify_app(&AppHealth::default());
        assert_eq!(result.status, HealthStatus::Unknown);
        assert_eq!(result.issue, "no workloads found");
    }

    #[test]
    fn test_app_scaled_to_zero_is_not_ready() {
        let app = AppHealth {
            workload_statuses: vec![status(0, 0, 0), status(0, 0, -1)],
            requests: RequestHealth::default(),
        };
        let result = classify_app(&app);
        assert_eq!(result.status, HealthStatus::NotReady);
        assert_eq!(result.issue, "scaled to 0 replicas");
    }

    #[test]
    fn test_app_scaled_to_zero_ignores_request_errors() {
        let app = AppHealth {
            workload_statuses: vec![status(0, 0, 0)],
            requests: http(&[("200", 50.0), ("500", 50.0)]),
        };
        let result = classify_app(&app);
        assert_eq!(result.status, HealthStatus::NotReady);
        assert_eq!(result.issue, "scaled to 0 replicas");
        assert!((result.error_rate - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_partially_scaled_app_still_merges_request_errors() {
        let app = AppHealth {
            workload_statuses: vec![status(0, 0, 0), status(2, 2, 2)],
            requests: http(&[("200", 50.0), ("500", 50.0)]),
        };
        assert_eq!(classify_app(&app).status, HealthStatus::Unhealthy);
    }

    #[test]
    fn test_app_replica_shortfall() {
        let degraded = AppHealth {
            workload_statuses: vec![status(3, 1, 1)],
            requests: RequestHealth::default(),
        };
        let result = classify_app(&degraded);
        assert_eq!(result.status, HealthStatus::Degraded);
        assert_eq!(result.issue, "1/3 replicas available");

        let down = AppHealth {
            workload_statuses: vec![status(2, 0, 0)],
            requests: RequestHealth::default(),
        };
        let result = classify_app(&down);
        assert_eq!(result.status, HealthStatus::Unhealthy);
        assert_eq!(result.issue, "0/2 replicas available");
    }

    #[test]
    fn test_app_unhealthy_workload_not_masked_by_later_ones() {
        let app = AppHealth {
            workload_statuses: vec![status(2, 0, 0), status(1, 1, 1), status(0, 0, 0)],
            requests: RequestHealth::default(),
        };
        assert_eq!(classify_app(&app).status, HealthStatus::Unhealthy);
    }

    #[test]
    fn test_app_proxy_sync_issue() {
        let app = AppHealth {
            workload_statuses: vec![status(2, 2, 1)],
            requests: RequestHealth::default(),
        };
        let result = classify_app(&app);
        assert_eq!(result.status, HealthStatus::Degraded);
        assert_eq!(result.issue, "1/2 proxies synced");
    }

    #[test]
    fn test_proxy_issue_does_not_replace_replica_issue() {
        let app = AppHealth {
            workload_statuses: vec![status(3, 2, 1)],
            requests: RequestHealth::default(),
        };
        assert_eq!(classify_app(&app).issue, "2/3 replicas available");
    }

    #[test]
    fn test_app_error_rate_issue() {
        let app = AppHealth {
            workload_statuses: vec![status(1, 1, 1)],
            requests: http(&[("200", 80.0), ("500", 20.0)]),
        };
        let result = classify_app(&app);
        assert_eq!(result.status, HealthStatus::Unhealthy);
        assert_eq!(result.issue, "error rate: 20.00%");
        assert!((result.error_rate - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_service_without_traffic_is_unknown() {
        let result = classify_service(&ServiceHealth::default());
        assert_eq!(result.status, HealthStatus::Unknown);
        assert!(result.issue.is_empty());

        let idle = ServiceHealth {
            requests: http(&[("200", 0.0)]),
        };
        assert_eq!(classify_service(&idle).status, HealthStatus::Unknown);
    }

    #[test]
    fn test_service_uses_request_health() {
        let healthy = ServiceHealth {
            requests: http(&[("200", 100.0)]),
        };
        let result = classify_service(&healthy);
        assert_eq!(result.status, HealthStatus::Healthy);
        assert!(result.issue.is_empty());

        let degraded = ServiceHealth {
            requests: http(&[("200", 88.0), ("404", 12.0)]),
        };
        let result = classify_service(&degraded);
        assert_eq!(result.status, HealthStatus::Degraded);
        assert_eq!(result.issue, "error rate: 12.00%");
    }

    #[test]
    fn test_workload_without_status_or_traffic_is_unknown() {
        let result = classify_workload(&WorkloadHealth::default());
        assert_eq!(result.status, HealthStatus::Unknown);
    }

    #[test]
    fn test_workload_with_status_but_no_traffic() {
        let workload = WorkloadHealth {
            workload_status: Some(status(1, 1, 1)),
            requests: RequestHealth::default(),
        };
        let result = classify_workload(&workload);
        assert_eq!(result.status, HealthStatus::Healthy);
        assert!(result.issue.is_empty());
    }

    #[test]
    fn test_workload_traffic_without_status() {
        let workload = WorkloadHealth {
            workload_status: None,
            requests: http(&[("200", 95.0), ("503", 5.0)]),
        };
        let result = classify_workload(&workload);
        assert_eq!(result.status, HealthStatus::Degraded);
        assert_eq!(result.issue, "error rate: 5.00%");
    }

    #[test]
    fn test_workload_merges_replica_and_request_status() {
        let workload = WorkloadHealth {
            workload_status: Some(status(2, 1, 1)),
            requests: http(&[("200", 50.0), ("500", 50.0)]),
        };
        let result = classify_workload(&workload);
        assert_eq!(result.status, HealthStatus::Unhealthy);
        assert_eq!(result.issue, "1/2 replicas available");
    }

    #[test]
    fn test_workload_scaled_to_zero() {
        let workload = WorkloadHealth {
            workload_status: Some(status(0, 0, 0)),
            requests: RequestHealth::default(),
        };
        let result = classify_workload(&workload);
        assert_eq!(result.status, HealthStatus::NotReady);
        assert_eq!(result.issue, "scaled to 0 replicas");

        let workload = WorkloadHealth {
            workload_status: Some(status(0, 0, 0)),
            requests: http(&[("200", 10.0), ("503", 90.0)]),
        };
        assert_eq!(classify_workload(&workload).status, HealthStatus::NotReady);
    }
}

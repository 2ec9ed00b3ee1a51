//! Benchmarks for classification and rollup

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mesh_health_core::engine::{compute_summary, evaluate_request_health, HealthPayloads};
use mesh_health_core::{
    AppHealth, ClustersNamespaceHealth, RequestHealth, ServiceHealth, WorkloadHealth,
    WorkloadStatus,
};
use std::collections::BTreeMap;

fn requests(errors: f64) -> RequestHealth {
    let mut inbound = BTreeMap::new();
    inbound.insert(
        "http".to_string(),
        [("200".to_string(), 1000.0 - errors), ("503".to_string(), errors)]
            .into_iter()
            .collect(),
    );
    RequestHealth {
        inbound,
        ..Default::default()
    }
}

fn status(name: &str) -> WorkloadStatus {
    WorkloadStatus {
        name: name.to_string(),
        desired_replicas: 3,
        current_replicas: 3,
        available_replicas: 2,
        synced_proxies: 2,
    }
}

fn mesh(namespaces: usize, entities: usize) -> [ClustersNamespaceHealth; 3] {
    let mut apps = ClustersNamespaceHealth::default();
    let mut services = ClustersNamespaceHealth::default();
    let mut workloads = ClustersNamespaceHealth::default();

    for ns in 0..namespaces {
        let ns_name = format!("ns-{ns}");
        for e in 0..entities {
            let name = format!("entity-{e}");
            let errors = (e % 20) as f64 * 10.0;
            apps.namespace_app_health
                .entry(ns_name.clone())
                .or_default()
                .insert(
                    name.clone(),
                    AppHealth {
                        workload_statuses: vec![status(&name)],
                        requests: requests(errors),
                    },
                );
            services
                .namespace_service_health
                .entry(ns_name.clone())
                .or_default()
                .insert(
                    name.clone(),
                    ServiceHealth {
                        requests: requests(errors),
                    },
                );
            workloads
                .namespace_workload_health
                .entry(ns_name.clone())
                .or_default()
                .insert(
                    name.clone(),
                    WorkloadHealth {
                        workload_status: Some(status(&name)),
                        requests: requests(errors),
                    },
                );
        }
    }

    [apps, services, workloads]
}

fn bench_evaluate(c: &mut Criterion) {
    let req = requests(42.0);
    c.bench_function("evaluate_request_health", |b| {
        b.iter(|| evaluate_request_health(black_box(&req)))
    });
}

fn bench_summary(c: &mut Criterion) {
    let [apps, services, workloads] = mesh(20, 50);
    c.bench_function("compute_summary_20x50", |b| {
        b.iter(|| {
            compute_summary(
                black_box(HealthPayloads {
                    apps: &apps,
                    services: &services,
                    workloads: &workloads,
                }),
                "10m",
                Utc::now(),
            )
        })
    });
}

criterion_group!(benches, bench_evaluate, bench_summary);
criterion_main!(benches);

//! Mesh Health Core
//!
//! Aggregates service-mesh health into a single summary:
//!
//! 1. App, service and workload health are fetched concurrently through a
//!    [`HealthFetcher`](engine::HealthFetcher).
//! 2. Each entity is classified from its replica state and its request
//!    counters, judged against protocol-aware error tolerances.
//! 3. Results roll up into per-namespace and mesh-wide counts, status,
//!    availability and error rate.
//! 4. Unhealthy entities are ranked by error rate and cut to the top ten.
//!
//! # Design Principles
//! - Stateless: every call is a fresh computation, nothing is cached
//! - All-or-nothing: a failed fetch or unparsable payload fails the call
//! - Deterministic: namespaces and entities are visited in name order
//!
//! # Example
//!
//! ```rust,no_run
//! use mesh_health_core::engine::{HealthAggregator, HealthFetcher, SummaryQuery};
//!
//! async fn run<F: HealthFetcher>(fetcher: F) {
//!     let aggregator = HealthAggregator::new(fetcher);
//!     let query = SummaryQuery::new().namespaces("bookinfo").rate_interval("5m");
//!     let summary = aggregator.summarize(&query).await.unwrap();
//!     println!("{} ({:.1}%)", summary.overall_status, summary.availability);
//! }
//! ```

pub mod engine;
pub mod error;

#[path = "../contracts/mod.rs"]
pub mod contracts;

pub use contracts::*;
pub use engine::{HealthAggregator, HealthFetcher, HealthRequest, SummaryQuery};
pub use error::{AggregationError, FetchError};

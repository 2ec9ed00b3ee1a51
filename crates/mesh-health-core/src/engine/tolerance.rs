//! Request health evaluation
//!
//! Error-rate tolerances are declared as data: each rule names a protocol, a
//! class of response codes, and the percentages at which that class degrades
//! or fails an entity. A code is an error exactly when some rule matches it.

use crate::contracts::{HealthStatus, ProtocolCounters, RequestHealth};

/// Class of response codes a tolerance rule applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeMatcher {
    /// The `-` sentinel used for aborted or fault-injected requests
    Aborted,
    /// Three-digit codes starting with the given digit (`4` matches `4xx`)
    Class(u8),
    /// Anything other than `0`, `-` included
    NonZero,
}

impl CodeMatcher {
    pub fn matches(&self, code: &str) -> bool {
        match self {
            CodeMatcher::Aborted => code == "-",
            CodeMatcher::Class(digit) => {
                let bytes = code.as_bytes();
                bytes.len() == 3 && bytes[0] == b'0' + digit
            }
            CodeMatcher::NonZero => code != "0",
        }
    }
}

/// One row of the tolerance table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToleranceRule {
    pub protocol: &'static str,
    pub codes: CodeMatcher,
    /// Percentage at or above which the code degrades the entity; any
    /// non-zero share degrades when this is `0.0`
    pub degrade_at: f64,
    /// Percentage at or above which the code fails the entity
    pub fail_at: f64,
}

impl ToleranceRule {
    pub fn applies(&self, protocol: &str, code: &str) -> bool {
        self.protocol == protocol && self.codes.matches(code)
    }

    /// Status for an error share expressed as a ratio in `[0, 1]`
    pub fn status_for(&self, ratio: f64) -> HealthStatus {
        let percentage = ratio * 100.0;
        if percentage >= self.fail_at {
            HealthStatus::Unhealthy
        } else if percentage > 0.0 && percentage >= self.degrade_at {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        }
    }
}

/// Default mesh console tolerances
pub const DEFAULT_TOLERANCES: &[ToleranceRule] = &[
    ToleranceRule {
        protocol: "http",
        codes: CodeMatcher::Aborted,
        degrade_at: 0.0,
        fail_at: 10.0,
    },
    ToleranceRule {
        protocol: "http",
        codes: CodeMatcher::Class(5),
        degrade_at: 0.0,
        fail_at: 10.0,
    },
    ToleranceRule {
        protocol: "http",
        codes: CodeMatcher::Class(4),
        degrade_at: 10.0,
        fail_at: 20.0,
    },
    ToleranceRule {
        protocol: "grpc",
        codes: CodeMatcher::NonZero,
        degrade_at: 0.0,
        fail_at: 10.0,
    },
];

/// First rule covering a protocol/code pair
pub fn rule_for<'a>(
    rules: &'a [ToleranceRule],
    protocol: &str,
    code: &str,
) -> Option<&'a ToleranceRule> {
    rules.iter().find(|rule| rule.applies(protocol, code))
}

/// Whether a response code counts as an error under the default tolerances
pub fn is_error_code(protocol: &str, code: &str) -> bool {
    rule_for(DEFAULT_TOLERANCES, protocol, code).is_some()
}

/// Evaluate request health with the default tolerances
///
/// Returns the worst status across all erroring codes and the worst single
/// error ratio seen in any protocol of either direction.
pub fn evaluate_request_health(requests: &RequestHealth) -> (HealthStatus, f64) {
    evaluate_with(DEFAULT_TOLERANCES, requests)
}

/// Evaluate request health against a custom tolerance table
pub fn evaluate_with(rules: &[ToleranceRule], requests: &RequestHealth) -> (HealthStatus, f64) {
    let mut status = HealthStatus::Healthy;
    let mut worst_ratio = 0.0_f64;

    for counters in requests.directions() {
        for (protocol, codes) in counters {
            let total: f64 = codes.values().sum();
            if total <= 0.0 {
                continue;
            }

            for (code, &count) in codes {
                if count <= 0.0 {
                    continue;
                }
                let Some(rule) = rule_for(rules, protocol, code) else {
                    continue;
                };

                let ratio = count / total;
                worst_ratio = worst_ratio.max(ratio);
                status = status.merge(rule.status_for(ratio));
            }
        }
    }

    (status, worst_ratio)
}

/// Whether any counter in either direction is non-zero
pub fn has_traffic(requests: &RequestHealth) -> bool {
    requests
        .directions()
        .iter()
        .flat_map(|counters| counters.values())
        .flat_map(|codes| codes.values())
        .any(|&count| count > 0.0)
}

/// Share of all requests, both directions, that were errors
///
/// Unlike the worst ratio this weighs every protocol by its volume. Zero when
/// there is no traffic.
pub fn aggregate_error_rate(requests: &RequestHealth) -> f64 {
    let (errors, total) = requests
        .directions()
        .iter()
        .fold((0.0, 0.0), |acc, counters| tally(counters, acc));

    if total == 0.0 {
        0.0
    } else {
        errors / total
    }
}

fn tally(counters: &ProtocolCounters, (mut errors, mut total): (f64, f64)) -> (f64, f64) {
    for (protocol, codes) in counters {
        for (code, &count) in codes {
            total += count;
            if is_error_code(protocol, code) {
                errors += count;
            }
        }
    }
    (errors, total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn inbound(protocol: &str, codes: &[(&str, f64)]) -> RequestHealth {
        let mut counters = BTreeMap::new();
        counters.insert(
            protocol.to_string(),
            codes
                .iter()
                .map(|(code, count)| (code.to_string(), *count))
                .collect(),
        );
        RequestHealth {
            inbound: counters,
            ..Default::default()
        }
    }

    #[test]
    fn test_error_code_classification() {
        assert!(is_error_code("http", "-"));
        assert!(is_error_code("http", "404"));
        assert!(is_error_code("http", "503"));
        assert!(!is_error_code("http", "200"));
        assert!(!is_error_code("http", "302"));
        assert!(!is_error_code("http", "5000"));
        assert!(is_error_code("grpc", "-"));
        assert!(is_error_code("grpc", "14"));
        assert!(!is_error_code("grpc", "0"));
        assert!(!is_error_code("tcp", "500"));
    }

    #[test]
    fn test_no_traffic_is_healthy() {
        let (status, ratio) = evaluate_request_health(&RequestHealth::default());
        assert_eq!(status, HealthStatus::Healthy);
        assert_eq!(ratio, 0.0);

        let idle = inbound("http", &[("200", 0.0), ("500", 0.0)]);
        assert_eq!(evaluate_request_health(&idle), (HealthStatus::Healthy, 0.0));
        assert!(!has_traffic(&idle));
    }

    #[test]
    fn test_http_4xx_boundaries() {
        let at_ten = inbound("http", &[("200", 90.0), ("404", 10.0)]);
        assert_eq!(evaluate_request_health(&at_ten).0, HealthStatus::Degraded);

        let at_twenty = inbound("http", &[("200", 80.0), ("404", 20.0)]);
        assert_eq!(evaluate_request_health(&at_twenty).0, HealthStatus::Unhealthy);

        let below = inbound("http", &[("200", 901.0), ("404", 99.0)]);
        let (status, ratio) = evaluate_request_health(&below);
        assert_eq!(status, HealthStatus::Healthy);
        assert!((ratio - 0.099).abs() < 1e-12);
    }

    #[test]
    fn test_http_5xx_and_aborted() {
        let small = inbound("http", &[("200", 99.0), ("503", 1.0)]);
        assert_eq!(evaluate_request_health(&small).0, HealthStatus::Degraded);

        let large = inbound("http", &[("200", 90.0), ("500", 10.0)]);
        assert_eq!(evaluate_request_health(&large).0, HealthStatus::Unhealthy);

        let aborted = inbound("http", &[("200", 95.0), ("-", 5.0)]);
        assert_eq!(evaluate_request_health(&aborted).0, HealthStatus::Degraded);
    }

    #[test]
    fn test_grpc_boundaries() {
        let at_ten = inbound("grpc", &[("0", 90.0), ("14", 10.0)]);
        assert_eq!(evaluate_request_health(&at_ten).0, HealthStatus::Unhealthy);

        let below = inbound("grpc", &[("0", 95.0), ("2", 5.0)]);
        assert_eq!(evaluate_request_health(&below).0, HealthStatus::Degraded);
    }

    #[test]
    fn test_worst_ratio_spans_directions() {
        let mut requests = inbound("http", &[("200", 95.0), ("500", 5.0)]);
        requests.outbound.insert(
            "grpc".to_string(),
            [("0".to_string(), 70.0), ("13".to_string(), 30.0)]
                .into_iter()
                .collect(),
        );

        let (status, ratio) = evaluate_request_health(&requests);
        assert_eq!(status, HealthStatus::Unhealthy);
        assert!((ratio - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_protocols_are_rated_separately() {
        let mut requests = inbound("http", &[("200", 1000.0)]);
        requests.inbound.insert(
            "grpc".to_string(),
            [("0".to_string(), 1.0), ("2".to_string(), 1.0)]
                .into_iter()
                .collect(),
        );

        let (status, ratio) = evaluate_request_health(&requests);
        assert_eq!(status, HealthStatus::Unhealthy);
        assert_eq!(ratio, 0.5);
        assert!(aggregate_error_rate(&requests) < 0.001);
    }

    #[test]
    fn test_aggregate_error_rate() {
        let requests = inbound("http", &[("200", 80.0), ("500", 20.0)]);
        assert!((aggregate_error_rate(&requests) - 0.2).abs() < 1e-12);
        assert_eq!(aggregate_error_rate(&RequestHealth::default()), 0.0);
    }

    #[test]
    fn test_custom_table() {
        let strict = [ToleranceRule {
            protocol: "http",
            codes: CodeMatcher::Class(4),
            degrade_at: 0.0,
            fail_at: 1.0,
        }];
        let requests = inbound("http", &[("200", 98.0), ("404", 2.0)]);
        assert_eq!(evaluate_with(&strict, &requests).0, HealthStatus::Unhealthy);
        assert_eq!(evaluate_request_health(&requests).0, HealthStatus::Healthy);
    }

    proptest! {
        #[test]
        fn prop_success_only_traffic_is_healthy(ok in 0u32..10_000, redirects in 0u32..10_000) {
            let requests = inbound("http", &[("200", ok as f64), ("301", redirects as f64)]);
            prop_assert_eq!(evaluate_request_health(&requests), (HealthStatus::Healthy, 0.0));
        }

        #[test]
        fn prop_worst_ratio_is_a_ratio(ok in 0u32..1_000, errors in 0u32..1_000, aborted in 0u32..1_000) {
            let requests = inbound("http", &[("200", ok as f64), ("500", errors as f64), ("-", aborted as f64)]);
            let (_, ratio) = evaluate_request_health(&requests);
            prop_assert!((0.0..=1.0).contains(&ratio));
        }
    }
}

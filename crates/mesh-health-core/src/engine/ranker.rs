//! Ranking of unhealthy entities

use crate::contracts::UnhealthyEntity;

/// Maximum entries kept in a summary's top-unhealthy list
pub const TOP_UNHEALTHY_LIMIT: usize = 10;

/// Sort by error rate, worst first, and keep at most `limit` entries
///
/// The sort is stable, so entities with equal error rates keep their
/// discovery order.
pub fn rank_unhealthy(mut entities: Vec<UnhealthyEntity>, limit: usize) -> Vec<UnhealthyEntity> {
    entities.sort_by(|a, b| b.error_rate.total_cmp(&a.error_rate));
    entities.truncate(limit);
    entities
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::{EntityType, HealthStatus};
    use proptest::prelude::*;

    fn entity(name: &str, error_rate: f64) -> UnhealthyEntity {
        UnhealthyEntity {
            entity_type: EntityType::Service,
            namespace: "bookinfo".to_string(),
            name: name.to_string(),
            status: HealthStatus::Unhealthy,
            issue: String::new(),
            error_rate,
        }
    }

    #[test]
    fn test_sorted_descending() {
        let ranked = rank_unhealthy(
            vec![entity("a", 0.1), entity("b", 0.9), entity("c", 0.5)],
            TOP_UNHEALTHY_LIMIT,
        );
        let names: Vec<_> = ranked.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["b", "c", "a"]);
    }

    #[test]
    fn test_ties_keep_discovery_order() {
        let ranked = rank_unhealthy(
            vec![entity("first", 0.0), entity("worst", 0.4), entity("second", 0.0)],
            TOP_UNHEALTHY_LIMIT,
        );
        let names: Vec<_> = ranked.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["worst", "first", "second"]);
    }

    #[test]
    fn test_truncates_to_limit() {
        let entities = (0..25).map(|i| entity(&format!("svc-{i}"), i as f64 / 100.0)).collect();
        let ranked = rank_unhealthy(entities, TOP_UNHEALTHY_LIMIT);
        assert_eq!(ranked.len(), 10);
        assert_eq!(ranked[0].name, "svc-24");
        assert_eq!(ranked[9].name, "svc-15");
    }

    proptest! {
        #[test]
        fn prop_bounded_and_sorted(rates in proptest::collection::vec(0.0f64..1.0, 0..40)) {
            let entities = rates.iter().enumerate().map(|(i, r)| entity(&i.to_string(), *r)).collect();
            let ranked = rank_unhealthy(entities, TOP_UNHEALTHY_LIMIT);
            prop_assert!(ranked.len() <= TOP_UNHEALTHY_LIMIT);
            prop_assert_eq!(ranked.len(), rates.len().min(TOP_UNHEALTHY_LIMIT));
            for pair in ranked.windows(2) {
                prop_assert!(pair[0].error_rate >= pair[1].error_rate);
            }
        }
    }
}

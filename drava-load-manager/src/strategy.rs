use std::collections::HashSet;
use std::sync::Arc;

use crate::bundle_data::BundleData;
use crate::config::{LoadManagerConfig, PlacementStrategyKind};
use crate::load_view::LoadView;

/// Scores the candidate set and picks the broker a new bundle should go to.
/// Must return a member of `candidates`; `None` only when the set is empty.
pub trait PlacementStrategy: Send + Sync {
    fn select_broker(
        &self,
        candidates: &HashSet<String>,
        bundle_data: &BundleData,
        view: &LoadView,
        config: &LoadManagerConfig,
    ) -> Option<String>;
}

pub fn create_placement_strategy(kind: &PlacementStrategyKind) -> Arc<dyn PlacementStrategy> {
    match kind {
        PlacementStrategyKind::LowestUsage => Arc::new(LowestUsageStrategy),
        PlacementStrategyKind::LeastLongTermRate => Arc::new(LeastLongTermRateStrategy),
    }
}

// Ties are broken by broker name so repeated runs stay deterministic.
fn argmin_by_score(
    candidates: &HashSet<String>,
    score: impl Fn(&str) -> f64,
) -> Option<String> {
    candidates
        .iter()
        .map(|broker| (score(broker), broker))
        .min_by(|(sa, ba), (sb, bb)| {
            sa.partial_cmp(sb)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| ba.cmp(bb))
        })
        .map(|(_, broker)| broker.clone())
}

/// Least loaded by maximum host resource usage. A broker with no report yet
/// scores zero, which makes fresh brokers the most attractive targets.
#[derive(Debug, Default)]
pub struct LowestUsageStrategy;

impl PlacementStrategy for LowestUsageStrategy {
    fn select_broker(
        &self,
        candidates: &HashSet<String>,
        _bundle_data: &BundleData,
        view: &LoadView,
        _config: &LoadManagerConfig,
    ) -> Option<String> {
        argmin_by_score(candidates, |broker| {
            view.broker_states
                .get(broker)
                .map(|state| state.local_data.max_resource_usage())
                .unwrap_or(0.0)
        })
    }
}

/// Least aggregate long-term message rate, preallocated bundles included
/// (they are already part of each broker's time-average data).
#[derive(Debug, Default)]
pub struct LeastLongTermRateStrategy;

impl PlacementStrategy for LeastLongTermRateStrategy {
    fn select_broker(
        &self,
        candidates: &HashSet<String>,
        _bundle_data: &BundleData,
        view: &LoadView,
        _config: &LoadManagerConfig,
    ) -> Option<String> {
        argmin_by_score(candidates, |broker| {
            view.broker_states
                .get(broker)
                .map(|state| {
                    state.time_average_data.long_term_msg_rate_in
                        + state.time_average_data.long_term_msg_rate_out
                })
                .unwrap_or(0.0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle_data::{NUM_LONG_SAMPLES, NUM_SHORT_SAMPLES};
    use crate::load_report::{LocalBrokerData, ResourceUsage};
    use crate::load_view::BrokerState;

    fn view_with_usage(brokers: &[(&str, f64)]) -> LoadView {
        let mut view = LoadView::default();
        for (broker, cpu_percent) in brokers {
            let mut data = LocalBrokerData::new(&format!("http://{}", broker), "1.0.0");
            data.cpu = ResourceUsage::new(*cpu_percent, 100.0);
            view.broker_states
                .insert(broker.to_string(), BrokerState::new(data));
        }
        view
    }

    fn candidates(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_lowest_usage_picks_least_loaded() {
        let view = view_with_usage(&[("a", 30.0), ("b", 50.0)]);
        let picked = LowestUsageStrategy.select_broker(
            &candidates(&["a", "b"]),
            &BundleData::new(NUM_SHORT_SAMPLES, NUM_LONG_SAMPLES),
            &view,
            &LoadManagerConfig::default(),
        );
        assert_eq!(picked.as_deref(), Some("a"));
    }

    #[test]
    fn test_unreported_broker_wins_over_loaded_one() {
        let view = view_with_usage(&[("a", 30.0)]);
        let picked = LowestUsageStrategy.select_broker(
            &candidates(&["a", "fresh"]),
            &BundleData::new(NUM_SHORT_SAMPLES, NUM_LONG_SAMPLES),
            &view,
            &LoadManagerConfig::default(),
        );
        assert_eq!(picked.as_deref(), Some("fresh"));
    }

    #[test]
    fn test_ties_break_deterministically() {
        let view = view_with_usage(&[("b", 30.0), ("a", 30.0)]);
        let picked = LowestUsageStrategy.select_broker(
            &candidates(&["a", "b"]),
            &BundleData::new(NUM_SHORT_SAMPLES, NUM_LONG_SAMPLES),
            &view,
            &LoadManagerConfig::default(),
        );
        assert_eq!(picked.as_deref(), Some("a"));
    }

    #[test]
    fn test_empty_candidates_yield_none() {
        let view = LoadView::default();
        let picked = LowestUsageStrategy.select_broker(
            &HashSet::new(),
            &BundleData::new(NUM_SHORT_SAMPLES, NUM_LONG_SAMPLES),
            &view,
            &LoadManagerConfig::default(),
        );
        assert!(picked.is_none());
    }

    #[test]
    fn test_least_long_term_rate_uses_time_average_data() {
        let mut view = view_with_usage(&[("a", 10.0), ("b", 10.0)]);
        view.broker_states
            .get_mut("a")
            .unwrap()
            .time_average_data
            .long_term_msg_rate_in = 500.0;

        let picked = LeastLongTermRateStrategy.select_broker(
            &candidates(&["a", "b"]),
            &BundleData::new(NUM_SHORT_SAMPLES, NUM_LONG_SAMPLES),
            &view,
            &LoadManagerConfig::default(),
        );
        assert_eq!(picked.as_deref(), Some("b"));
    }
}

use std::collections::HashMap;
use tracing::debug;

use crate::config::LoadManagerConfig;
use crate::load_report::NamespaceBundleStats;
use crate::load_view::LoadView;

/// Picks bundles to unload from overloaded brokers.
///
/// Strategies run in order and the first one returning a non-empty map wins.
/// A strategy must consult `recently_unloaded` and never re-propose a bundle
/// still inside the grace period.
pub trait LoadSheddingStrategy: Send + Sync {
    /// Returns `{bundle -> source broker}` pairs to unload.
    fn find_bundles_for_unloading(
        &self,
        view: &LoadView,
        config: &LoadManagerConfig,
    ) -> HashMap<String, String>;
}

/// Sheds the highest-throughput bundle of every overloaded broker.
///
/// A broker serving a single bundle is left alone: unloading its only bundle
/// would just move the hotspot.
#[derive(Debug, Default)]
pub struct OverloadShedder;

fn bundle_throughput(stats: &NamespaceBundleStats) -> f64 {
    stats.msg_throughput_in + stats.msg_throughput_out
}

impl LoadSheddingStrategy for OverloadShedder {
    fn find_bundles_for_unloading(
        &self,
        view: &LoadView,
        config: &LoadManagerConfig,
    ) -> HashMap<String, String> {
        let overload_threshold = config.broker_overloaded_threshold_percentage / 100.0;
        let mut selected = HashMap::new();

        for (broker, state) in &view.broker_states {
            let usage = state.local_data.max_resource_usage();
            if usage <= overload_threshold {
                continue;
            }
            if state.local_data.last_stats.len() <= 1 {
                debug!(
                    broker = %broker,
                    "broker is overloaded but serves at most one bundle, nothing to shed"
                );
                continue;
            }

            let candidate = state
                .local_data
                .last_stats
                .iter()
                .filter(|(bundle, _)| !view.recently_unloaded.contains_key(*bundle))
                .max_by(|(_, a), (_, b)| {
                    bundle_throughput(a)
                        .partial_cmp(&bundle_throughput(b))
                        .unwrap_or(std::cmp::Ordering::Equal)
                });

            if let Some((bundle, stats)) = candidate {
                debug!(
                    broker = %broker,
                    bundle = %bundle,
                    usage = %usage,
                    throughput = %bundle_throughput(stats),
                    "proposing bundle for unloading"
                );
                selected.insert(bundle.clone(), broker.clone());
            }
        }
        selected
    }
}

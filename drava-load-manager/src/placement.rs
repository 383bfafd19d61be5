use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::bundle_data::BundleData;
use crate::utils::{bundle_namespace, bundle_range};

/// Restricts which brokers may serve a given namespace (tenant isolation,
/// primary/secondary/shared fallback). Owned by the surrounding broker; the
/// default implementation admits every available broker.
pub trait ResourceAllocationPolicies: Send + Sync {
    fn allowed_brokers(&self, bundle: &str, available: &HashSet<String>) -> HashSet<String>;
}

/// Policy for shared namespaces: every available broker qualifies.
#[derive(Debug, Default)]
pub struct SharedNamespacePolicies;

impl ResourceAllocationPolicies for SharedNamespacePolicies {
    fn allowed_brokers(&self, _bundle: &str, available: &HashSet<String>) -> HashSet<String> {
        available.clone()
    }
}

/// Placement-owned state, guarded by the placement mutex for the whole
/// duration of a selection and touched by the aggregator only to reconcile
/// settled preallocations and rebuild the namespace fanout.
///
/// `preallocated_index` duplicates the per-broker maps on purpose: placement
/// needs the O(1) bundle -> broker lookup without walking broker entries.
/// The two structures live under the same lock so the duplication cannot
/// drift.
#[derive(Debug, Default)]
pub struct PlacementState {
    /// Bundle -> broker it has been promised to
    pub preallocated_index: HashMap<String, String>,
    /// Broker -> bundles promised to it, with the bundle data at decision time
    pub preallocated_bundles: HashMap<String, HashMap<String, BundleData>>,
    /// Broker -> namespace -> bundle ranges served or promised
    pub namespace_fanout: HashMap<String, HashMap<String, HashSet<String>>>,
    /// Reusable candidate set, cleared at the start of every selection
    pub candidate_cache: HashSet<String>,
}

impl PlacementState {
    /// Bias placement away from brokers already serving the most bundles of
    /// this namespace: drop the brokers tied for the maximum count, unless
    /// that would empty the candidate set.
    pub fn remove_most_servicing_brokers(&mut self, bundle: &str) {
        let namespace = bundle_namespace(bundle);
        let count = |broker: &String| {
            self.namespace_fanout
                .get(broker)
                .and_then(|namespaces| namespaces.get(namespace))
                .map(|ranges| ranges.len())
                .unwrap_or(0)
        };

        let max_count = self.candidate_cache.iter().map(count).max().unwrap_or(0);
        if max_count == 0 {
            return;
        }
        let retained: HashSet<String> = self
            .candidate_cache
            .iter()
            .filter(|broker| count(broker) < max_count)
            .cloned()
            .collect();
        if retained.is_empty() {
            debug!(
                namespace = %namespace,
                "all candidates serve this namespace equally, keeping the full set"
            );
            return;
        }
        self.candidate_cache = retained;
    }

    /// Record a fresh promise of `bundle` to `broker`.
    pub fn record_preallocation(&mut self, bundle: &str, broker: &str, data: BundleData) {
        self.preallocated_index
            .insert(bundle.to_string(), broker.to_string());
        self.preallocated_bundles
            .entry(broker.to_string())
            .or_default()
            .insert(bundle.to_string(), data);
        self.namespace_fanout
            .entry(broker.to_string())
            .or_default()
            .entry(bundle_namespace(bundle).to_string())
            .or_default()
            .insert(bundle_range(bundle).to_string());
    }

    /// A bundle has been observed in some broker's report: the promise is
    /// fulfilled (or overtaken), drop it from both sides of the index.
    /// Returns the broker the bundle had been promised to.
    pub fn clear_settled(&mut self, bundle: &str) -> Option<String> {
        let broker = self.preallocated_index.remove(bundle)?;
        if let Some(bundles) = self.preallocated_bundles.get_mut(&broker) {
            bundles.remove(bundle);
            if bundles.is_empty() {
                self.preallocated_bundles.remove(&broker);
            }
        }
        Some(broker)
    }

    /// Drop everything still promised to a broker that left membership.
    pub fn purge_broker(&mut self, broker: &str) {
        self.preallocated_bundles.remove(broker);
        self.preallocated_index
            .retain(|_, promised_to| promised_to != broker);
        self.namespace_fanout.remove(broker);
    }

    /// Bundles currently promised to `broker`.
    pub fn preallocated_keys(&self, broker: &str) -> Vec<String> {
        self.preallocated_bundles
            .get(broker)
            .map(|bundles| bundles.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Rebuild the namespace fanout entry of `broker` from the bundles it
    /// serves and the bundles promised to it.
    pub fn rebuild_fanout<'a>(
        &mut self,
        broker: &str,
        bundles: impl IntoIterator<Item = &'a String>,
    ) {
        let entry = self
            .namespace_fanout
            .entry(broker.to_string())
            .or_default();
        entry.clear();
        for bundle in bundles {
            entry
                .entry(bundle_namespace(bundle).to_string())
                .or_default()
                .insert(bundle_range(bundle).to_string());
        }
    }
}

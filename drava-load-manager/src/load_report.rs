use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// One sampled resource: how much is used against how much exists.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ResourceUsage {
    pub usage: f64,
    pub limit: f64,
}

impl ResourceUsage {
    pub fn new(usage: f64, limit: f64) -> Self {
        Self { usage, limit }
    }

    pub fn percent_usage(&self) -> f64 {
        if self.limit > 0.0 {
            100.0 * self.usage / self.limit
        } else {
            0.0
        }
    }
}

/// Snapshot of host resources produced by the host probe.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SystemResourceUsage {
    pub cpu: ResourceUsage,
    pub memory: ResourceUsage,
    pub bandwidth_in: ResourceUsage,
    pub bandwidth_out: ResourceUsage,
}

impl SystemResourceUsage {
    /// Fraction (0.0..1.0) of the most saturated host resource.
    pub fn max_resource_usage(&self) -> f64 {
        [
            self.cpu.percent_usage(),
            self.memory.percent_usage(),
            self.bandwidth_in.percent_usage(),
            self.bandwidth_out.percent_usage(),
        ]
        .into_iter()
        .fold(0.0, f64::max)
            / 100.0
    }
}

/// Traffic statistics for one bundle as reported by its serving broker.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamespaceBundleStats {
    pub msg_rate_in: f64,
    pub msg_rate_out: f64,
    pub msg_throughput_in: f64,
    pub msg_throughput_out: f64,
    pub topics: u64,
    pub producer_count: u64,
    pub consumer_count: u64,
}

// LocalBrokerData holds everything one broker publishes about itself to the
// coordination store: host resource usage, aggregated traffic, the bundles it
// serves, and the per-bundle stats behind the aggregates.
//
// The delta sets (gains/losses) accumulate between publishes; the reporter
// clears them once a report has been written out.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalBrokerData {
    pub web_service_url: String,
    pub broker_version: String,

    // Host resource usage
    pub cpu: ResourceUsage,
    pub memory: ResourceUsage,
    pub bandwidth_in: ResourceUsage,
    pub bandwidth_out: ResourceUsage,

    // Traffic aggregated over all served bundles
    pub msg_rate_in: f64,
    pub msg_rate_out: f64,
    pub msg_throughput_in: f64,
    pub msg_throughput_out: f64,

    pub num_topics: u64,
    pub num_bundles: u64,
    pub num_consumers: u64,
    pub num_producers: u64,

    /// Bundles currently served by this broker
    pub bundles: HashSet<String>,
    /// Bundles gained since the last published report
    pub last_bundle_gains: HashSet<String>,
    /// Bundles lost since the last published report
    pub last_bundle_losses: HashSet<String>,
    /// Per-bundle stats behind the aggregates above
    pub last_stats: HashMap<String, NamespaceBundleStats>,

    /// Millis timestamp of the last published report
    pub last_update: u64,
}

impl LocalBrokerData {
    pub fn new(web_service_url: &str, broker_version: &str) -> Self {
        Self {
            web_service_url: web_service_url.to_string(),
            broker_version: broker_version.to_string(),
            ..Default::default()
        }
    }

    /// Merge a fresh host probe sample and bundle-stats snapshot into the
    /// local data, tracking which bundles appeared or disappeared since the
    /// previous snapshot.
    pub fn update(
        &mut self,
        usage: SystemResourceUsage,
        bundle_stats: HashMap<String, NamespaceBundleStats>,
    ) {
        self.cpu = usage.cpu;
        self.memory = usage.memory;
        self.bandwidth_in = usage.bandwidth_in;
        self.bandwidth_out = usage.bandwidth_out;

        let new_bundles: HashSet<String> = bundle_stats.keys().cloned().collect();
        for bundle in &new_bundles {
            if !self.bundles.contains(bundle) {
                self.last_bundle_gains.insert(bundle.clone());
            }
        }
        for bundle in &self.bundles {
            if !new_bundles.contains(bundle) {
                self.last_bundle_losses.insert(bundle.clone());
            }
        }

        self.msg_rate_in = 0.0;
        self.msg_rate_out = 0.0;
        self.msg_throughput_in = 0.0;
        self.msg_throughput_out = 0.0;
        self.num_topics = 0;
        self.num_consumers = 0;
        self.num_producers = 0;
        for stats in bundle_stats.values() {
            self.msg_rate_in += stats.msg_rate_in;
            self.msg_rate_out += stats.msg_rate_out;
            self.msg_throughput_in += stats.msg_throughput_in;
            self.msg_throughput_out += stats.msg_throughput_out;
            self.num_topics += stats.topics;
            self.num_consumers += stats.consumer_count;
            self.num_producers += stats.producer_count;
        }
        self.num_bundles = bundle_stats.len() as u64;

        self.bundles = new_bundles;
        self.last_stats = bundle_stats;
    }

    /// Fraction (0.0..1.0) of the most saturated host resource.
    pub fn max_resource_usage(&self) -> f64 {
        [
            self.cpu.percent_usage(),
            self.memory.percent_usage(),
            self.bandwidth_in.percent_usage(),
            self.bandwidth_out.percent_usage(),
        ]
        .into_iter()
        .fold(0.0, f64::max)
            / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(rate: f64, throughput: f64) -> NamespaceBundleStats {
        NamespaceBundleStats {
            msg_rate_in: rate,
            msg_rate_out: rate,
            msg_throughput_in: throughput,
            msg_throughput_out: throughput,
            topics: 2,
            producer_count: 1,
            consumer_count: 3,
        }
    }

    #[test]
    fn test_update_aggregates_totals() {
        let mut data = LocalBrokerData::new("http://a:8080", "1.0.0");
        let mut snapshot = HashMap::new();
        snapshot.insert("ns1/0x0_0x8".to_string(), stats(10.0, 1000.0));
        snapshot.insert("ns1/0x8_0xf".to_string(), stats(5.0, 500.0));

        data.update(SystemResourceUsage::default(), snapshot);

        assert_eq!(data.msg_rate_in, 15.0);
        assert_eq!(data.msg_throughput_out, 1500.0);
        assert_eq!(data.num_bundles, 2);
        assert_eq!(data.num_topics, 4);
        assert_eq!(data.num_consumers, 6);
    }

    #[test]
    fn test_update_tracks_gains_and_losses_across_snapshots() {
        let mut data = LocalBrokerData::new("http://a:8080", "1.0.0");

        let mut first = HashMap::new();
        first.insert("ns1/0x0_0x8".to_string(), stats(1.0, 1.0));
        data.update(SystemResourceUsage::default(), first);
        assert!(data.last_bundle_gains.contains("ns1/0x0_0x8"));

        let mut second = HashMap::new();
        second.insert("ns1/0x8_0xf".to_string(), stats(1.0, 1.0));
        data.update(SystemResourceUsage::default(), second);

        // deltas accumulate until the reporter publishes and clears them
        assert!(data.last_bundle_gains.contains("ns1/0x0_0x8"));
        assert!(data.last_bundle_gains.contains("ns1/0x8_0xf"));
        assert!(data.last_bundle_losses.contains("ns1/0x0_0x8"));
    }

    #[test]
    fn test_max_resource_usage_picks_hottest_component() {
        let mut data = LocalBrokerData::new("http://a:8080", "1.0.0");
        data.cpu = ResourceUsage::new(30.0, 100.0);
        data.memory = ResourceUsage::new(75.0, 100.0);
        data.bandwidth_in = ResourceUsage::new(10.0, 100.0);
        assert!((data.max_resource_usage() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_percent_usage_with_zero_limit() {
        let usage = ResourceUsage::new(42.0, 0.0);
        assert_eq!(usage.percent_usage(), 0.0);
    }
}

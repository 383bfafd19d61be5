use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::load_report::NamespaceBundleStats;

/// Samples kept by the short-term window.
pub const NUM_SHORT_SAMPLES: u64 = 10;

/// Samples kept by the long-term window.
pub const NUM_LONG_SAMPLES: u64 = 1000;

/// Message rate assumed for bundles that were never sampled (msg/s).
pub const DEFAULT_MESSAGE_RATE: f64 = 50.0;

/// Message throughput assumed for bundles that were never sampled (bytes/s).
/// The implied default message size is DEFAULT_MESSAGE_THROUGHPUT / DEFAULT_MESSAGE_RATE.
pub const DEFAULT_MESSAGE_THROUGHPUT: f64 = 50_000.0;

/// Windowed running average of bundle traffic.
///
/// While the window is filling, each sample contributes with its exact weight.
/// Once `num_samples` reaches `max_samples`, every further sample displaces
/// history exponentially with weight `1/max_samples`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeAverageMessageData {
    pub max_samples: u64,
    pub num_samples: u64,
    pub msg_rate_in: f64,
    pub msg_rate_out: f64,
    pub msg_throughput_in: f64,
    pub msg_throughput_out: f64,
}

impl TimeAverageMessageData {
    pub fn new(max_samples: u64) -> Self {
        Self {
            max_samples,
            num_samples: 0,
            msg_rate_in: 0.0,
            msg_rate_out: 0.0,
            msg_throughput_in: 0.0,
            msg_throughput_out: 0.0,
        }
    }

    /// Placeholder averages carrying zero weight: the first real sample
    /// overwrites them entirely (num_samples stays 0).
    pub fn with_defaults(max_samples: u64, defaults: &NamespaceBundleStats) -> Self {
        Self {
            max_samples,
            num_samples: 0,
            msg_rate_in: defaults.msg_rate_in,
            msg_rate_out: defaults.msg_rate_out,
            msg_throughput_in: defaults.msg_throughput_in,
            msg_throughput_out: defaults.msg_throughput_out,
        }
    }

    pub fn update(&mut self, sample: &NamespaceBundleStats) {
        self.num_samples = (self.num_samples + 1).min(self.max_samples);
        self.msg_rate_in = self.updated_value(self.msg_rate_in, sample.msg_rate_in);
        self.msg_rate_out = self.updated_value(self.msg_rate_out, sample.msg_rate_out);
        self.msg_throughput_in =
            self.updated_value(self.msg_throughput_in, sample.msg_throughput_in);
        self.msg_throughput_out =
            self.updated_value(self.msg_throughput_out, sample.msg_throughput_out);
    }

    // For num_samples == 1 this returns the sample itself, so placeholder
    // averages are overwritten as soon as real data arrives.
    fn updated_value(&self, old_average: f64, sample: f64) -> f64 {
        (((self.num_samples - 1) as f64) * old_average + sample) / self.num_samples as f64
    }
}

/// Rolling statistics for one bundle: a short and a long averaging window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleData {
    pub short_term: TimeAverageMessageData,
    pub long_term: TimeAverageMessageData,
}

impl BundleData {
    pub fn new(num_short_samples: u64, num_long_samples: u64) -> Self {
        Self {
            short_term: TimeAverageMessageData::new(num_short_samples),
            long_term: TimeAverageMessageData::new(num_long_samples),
        }
    }

    pub fn with_default_stats(
        num_short_samples: u64,
        num_long_samples: u64,
        defaults: &NamespaceBundleStats,
    ) -> Self {
        Self {
            short_term: TimeAverageMessageData::with_defaults(num_short_samples, defaults),
            long_term: TimeAverageMessageData::with_defaults(num_long_samples, defaults),
        }
    }

    /// Seed both windows from a legacy resource quota and mark them saturated
    /// so the history outweighs the first real samples.
    pub fn from_resource_quota(quota: &ResourceQuota) -> Self {
        let seed = NamespaceBundleStats {
            msg_rate_in: quota.msg_rate_in,
            msg_rate_out: quota.msg_rate_out,
            msg_throughput_in: quota.bandwidth_in,
            msg_throughput_out: quota.bandwidth_out,
            ..Default::default()
        };
        let mut data = Self::with_default_stats(NUM_SHORT_SAMPLES, NUM_LONG_SAMPLES, &seed);
        data.short_term.num_samples = NUM_SHORT_SAMPLES;
        data.long_term.num_samples = NUM_LONG_SAMPLES;
        data
    }

    /// Feed a new sample into both windows.
    pub fn update(&mut self, stats: &NamespaceBundleStats) {
        self.short_term.update(stats);
        self.long_term.update(stats);
    }
}

/// Legacy per-namespace resource quota, only read to seed bundle history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceQuota {
    pub msg_rate_in: f64,
    pub msg_rate_out: f64,
    pub bandwidth_in: f64,
    pub bandwidth_out: f64,
    pub memory: f64,
}

/// Traffic a broker is responsible for, summed over its bundles per window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimeAverageBrokerData {
    pub short_term_msg_rate_in: f64,
    pub short_term_msg_rate_out: f64,
    pub short_term_msg_throughput_in: f64,
    pub short_term_msg_throughput_out: f64,
    pub long_term_msg_rate_in: f64,
    pub long_term_msg_rate_out: f64,
    pub long_term_msg_throughput_in: f64,
    pub long_term_msg_throughput_out: f64,
}

impl TimeAverageBrokerData {
    /// Recompute the sums over `bundles`, substituting `defaults` for bundles
    /// with no recorded data yet.
    pub fn reset<'a>(
        &mut self,
        bundles: impl IntoIterator<Item = &'a String>,
        bundle_data: &HashMap<String, BundleData>,
        defaults: &NamespaceBundleStats,
    ) {
        *self = Self::default();
        for bundle in bundles {
            match bundle_data.get(bundle) {
                Some(data) => {
                    self.short_term_msg_rate_in += data.short_term.msg_rate_in;
                    self.short_term_msg_rate_out += data.short_term.msg_rate_out;
                    self.short_term_msg_throughput_in += data.short_term.msg_throughput_in;
                    self.short_term_msg_throughput_out += data.short_term.msg_throughput_out;
                    self.long_term_msg_rate_in += data.long_term.msg_rate_in;
                    self.long_term_msg_rate_out += data.long_term.msg_rate_out;
                    self.long_term_msg_throughput_in += data.long_term.msg_throughput_in;
                    self.long_term_msg_throughput_out += data.long_term.msg_throughput_out;
                }
                None => {
                    self.short_term_msg_rate_in += defaults.msg_rate_in;
                    self.short_term_msg_rate_out += defaults.msg_rate_out;
                    self.short_term_msg_throughput_in += defaults.msg_throughput_in;
                    self.short_term_msg_throughput_out += defaults.msg_throughput_out;
                    self.long_term_msg_rate_in += defaults.msg_rate_in;
                    self.long_term_msg_rate_out += defaults.msg_rate_out;
                    self.long_term_msg_throughput_in += defaults.msg_throughput_in;
                    self.long_term_msg_throughput_out += defaults.msg_throughput_out;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(rate: f64) -> NamespaceBundleStats {
        NamespaceBundleStats {
            msg_rate_in: rate,
            msg_rate_out: rate,
            msg_throughput_in: rate * 1000.0,
            msg_throughput_out: rate * 1000.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_windows_saturate_at_capacity() {
        let mut data = BundleData::new(NUM_SHORT_SAMPLES, NUM_LONG_SAMPLES);
        for _ in 0..15 {
            data.update(&sample(10.0));
        }
        assert_eq!(data.short_term.num_samples, NUM_SHORT_SAMPLES);
        assert_eq!(data.long_term.num_samples, 15);
    }

    #[test]
    fn test_first_sample_overwrites_default_history() {
        let defaults = sample(50.0);
        let mut window = TimeAverageMessageData::with_defaults(10, &defaults);
        window.update(&sample(7.0));
        assert_eq!(window.num_samples, 1);
        assert!((window.msg_rate_in - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_saturated_window_displaces_exponentially() {
        let mut window = TimeAverageMessageData::new(10);
        for _ in 0..10 {
            window.update(&sample(10.0));
        }
        assert!((window.msg_rate_in - 10.0).abs() < 1e-9);

        // one outlier at capacity moves the average by (sample - old) / max
        window.update(&sample(20.0));
        assert!((window.msg_rate_in - 11.0).abs() < 1e-9);
        assert_eq!(window.num_samples, 10);
    }

    #[test]
    fn test_quota_seeding_marks_windows_saturated() {
        let quota = ResourceQuota {
            msg_rate_in: 40.0,
            msg_rate_out: 40.0,
            bandwidth_in: 4000.0,
            bandwidth_out: 4000.0,
            memory: 0.0,
        };
        let data = BundleData::from_resource_quota(&quota);
        assert_eq!(data.short_term.num_samples, NUM_SHORT_SAMPLES);
        assert_eq!(data.long_term.num_samples, NUM_LONG_SAMPLES);
        assert!((data.short_term.msg_rate_in - 40.0).abs() < f64::EPSILON);
        assert!((data.long_term.msg_throughput_out - 4000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_time_average_broker_data_uses_defaults_for_unknown_bundles() {
        let defaults = NamespaceBundleStats {
            msg_rate_in: DEFAULT_MESSAGE_RATE,
            msg_rate_out: DEFAULT_MESSAGE_RATE,
            msg_throughput_in: DEFAULT_MESSAGE_THROUGHPUT,
            msg_throughput_out: DEFAULT_MESSAGE_THROUGHPUT,
            ..Default::default()
        };
        let mut known = BundleData::new(NUM_SHORT_SAMPLES, NUM_LONG_SAMPLES);
        known.update(&sample(10.0));
        let mut bundle_data = HashMap::new();
        bundle_data.insert("ns/0x0_0x8".to_string(), known);

        let bundles = vec!["ns/0x0_0x8".to_string(), "ns/0x8_0xf".to_string()];
        let mut aggregate = TimeAverageBrokerData::default();
        aggregate.reset(bundles.iter(), &bundle_data, &defaults);

        assert!((aggregate.short_term_msg_rate_in - (10.0 + DEFAULT_MESSAGE_RATE)).abs() < 1e-9);
        assert!((aggregate.long_term_msg_rate_out - (10.0 + DEFAULT_MESSAGE_RATE)).abs() < 1e-9);
    }
}

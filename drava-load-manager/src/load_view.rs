use std::collections::HashMap;

use crate::bundle_data::{BundleData, TimeAverageBrokerData};
use crate::load_report::LocalBrokerData;

/// Everything the aggregator knows about one live broker.
#[derive(Debug, Clone, Default)]
pub struct BrokerState {
    /// Latest report published by the broker
    pub local_data: LocalBrokerData,
    /// Aggregated traffic this broker is responsible for, per window
    pub time_average_data: TimeAverageBrokerData,
}

impl BrokerState {
    pub fn new(local_data: LocalBrokerData) -> Self {
        Self {
            local_data,
            time_average_data: TimeAverageBrokerData::default(),
        }
    }
}

/// Fleet-wide view of broker and bundle load, maintained by the aggregator
/// and read by placement and shedding.
#[derive(Debug, Default)]
pub struct LoadView {
    /// One entry per broker currently in membership
    pub broker_states: HashMap<String, BrokerState>,
    /// Rolling statistics per bundle, across all brokers
    pub bundle_data: HashMap<String, BundleData>,
    /// Bundle -> millis timestamp of its last unload, kept for the grace period
    pub recently_unloaded: HashMap<String, u64>,
}

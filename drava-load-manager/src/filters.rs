use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::debug;

use crate::bundle_data::BundleData;
use crate::config::LoadManagerConfig;
use crate::load_view::LoadView;

#[derive(Debug, Error)]
#[error("broker filter error: {0}")]
pub struct BrokerFilterError(pub String);

/// Narrows the candidate set before scoring. A failing filter is recoverable:
/// placement restores the full policy-compliant set and carries on.
pub trait BrokerFilter: Send + Sync {
    fn filter(
        &self,
        candidates: &mut HashSet<String>,
        bundle_data: &BundleData,
        view: &LoadView,
        config: &LoadManagerConfig,
    ) -> Result<(), BrokerFilterError>;
}

/// Keeps only the brokers running the version most of the candidates run.
///
/// During a rolling upgrade this steers new bundles away from the stragglers.
/// When the majority is ambiguous (tie) the set is left untouched.
#[derive(Debug, Default)]
pub struct BrokerVersionFilter;

impl BrokerFilter for BrokerVersionFilter {
    fn filter(
        &self,
        candidates: &mut HashSet<String>,
        _bundle_data: &BundleData,
        view: &LoadView,
        _config: &LoadManagerConfig,
    ) -> Result<(), BrokerFilterError> {
        let mut version_counts: HashMap<&str, usize> = HashMap::new();
        for broker in candidates.iter() {
            if let Some(state) = view.broker_states.get(broker) {
                let version = state.local_data.broker_version.as_str();
                if !version.is_empty() {
                    *version_counts.entry(version).or_insert(0) += 1;
                }
            }
        }
        if version_counts.is_empty() {
            return Err(BrokerFilterError(
                "no version information available for any candidate".to_string(),
            ));
        }

        let max_count = version_counts.values().copied().max().unwrap_or(0);
        let mut majority: Vec<&str> = version_counts
            .iter()
            .filter(|(_, count)| **count == max_count)
            .map(|(version, _)| *version)
            .collect();
        if majority.len() != 1 {
            debug!("no single majority broker version, keeping all candidates");
            return Ok(());
        }
        let majority = majority.remove(0).to_string();

        candidates.retain(|broker| {
            view.broker_states
                .get(broker)
                .map(|state| state.local_data.broker_version == majority)
                .unwrap_or(false)
        });
        Ok(())
    }
}

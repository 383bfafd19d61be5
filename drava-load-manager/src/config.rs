use serde::{Deserialize, Serialize};

/// Scoring strategy used to pick a broker for a new bundle
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum PlacementStrategyKind {
    /// Least loaded by maximum host resource usage (default)
    /// Best for: keeping the hottest resource of every broker below the ceiling
    LowestUsage,

    /// Least aggregate long-term message rate, preallocations included
    /// Best for: rate-bound workloads where host usage lags behind traffic
    LeastLongTermRate,
}

impl Default for PlacementStrategyKind {
    fn default() -> Self {
        Self::LowestUsage
    }
}

/// Load Manager configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoadManagerConfig {
    /// Ceiling on the time between two published local reports (minutes)
    #[serde(default = "default_report_update_max_interval_minutes")]
    pub report_update_max_interval_minutes: u64,

    /// Publish the local report when any tracked quantity moved by more than
    /// this percentage since the last publish
    #[serde(default = "default_report_update_threshold_percentage")]
    pub report_update_threshold_percentage: f64,

    /// A broker above this max-resource-usage percentage is considered
    /// overloaded for placement and shedding decisions
    #[serde(default = "default_broker_overloaded_threshold_percentage")]
    pub broker_overloaded_threshold_percentage: f64,

    /// An unloaded bundle is not proposed again for this long (minutes)
    #[serde(default = "default_shedding_grace_period_minutes")]
    pub shedding_grace_period_minutes: u64,

    /// Enable/disable the shedding loop
    #[serde(default = "default_shedding_enabled")]
    pub shedding_enabled: bool,

    /// Scoring strategy for new bundle placement
    #[serde(default)]
    pub placement_strategy: PlacementStrategyKind,

    /// NIC speed used as the bandwidth limit when the host probe cannot
    /// detect it (Gbps)
    #[serde(default)]
    pub override_nic_speed_gbps: Option<f64>,
}

fn default_report_update_max_interval_minutes() -> u64 {
    15
}

fn default_report_update_threshold_percentage() -> f64 {
    10.0
}

fn default_broker_overloaded_threshold_percentage() -> f64 {
    85.0
}

fn default_shedding_grace_period_minutes() -> u64 {
    30
}

fn default_shedding_enabled() -> bool {
    true
}

impl Default for LoadManagerConfig {
    fn default() -> Self {
        Self {
            report_update_max_interval_minutes: default_report_update_max_interval_minutes(),
            report_update_threshold_percentage: default_report_update_threshold_percentage(),
            broker_overloaded_threshold_percentage:
                default_broker_overloaded_threshold_percentage(),
            shedding_grace_period_minutes: default_shedding_grace_period_minutes(),
            shedding_enabled: default_shedding_enabled(),
            placement_strategy: PlacementStrategyKind::default(),
            override_nic_speed_gbps: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoadManagerConfig::default();
        assert_eq!(config.report_update_max_interval_minutes, 15);
        assert_eq!(config.report_update_threshold_percentage, 10.0);
        assert_eq!(config.broker_overloaded_threshold_percentage, 85.0);
        assert_eq!(config.shedding_grace_period_minutes, 30);
        assert!(config.shedding_enabled);
        assert_eq!(config.placement_strategy, PlacementStrategyKind::LowestUsage);
        assert!(config.override_nic_speed_gbps.is_none());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: LoadManagerConfig =
            serde_json::from_str(r#"{"shedding_enabled": false, "placement_strategy": "least_long_term_rate"}"#)
                .unwrap();
        assert!(!config.shedding_enabled);
        assert_eq!(
            config.placement_strategy,
            PlacementStrategyKind::LeastLongTermRate
        );
        assert_eq!(config.report_update_max_interval_minutes, 15);
    }
}

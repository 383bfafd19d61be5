use tracing::info;

use crate::config::LoadManagerConfig;
use crate::load_report::LocalBrokerData;

/// `100 * |old - new| / old`, with the zero cases pinned: both zero is no
/// change, growth from zero is infinite change.
pub(crate) fn percent_change(old_value: f64, new_value: f64) -> f64 {
    if old_value == 0.0 {
        if new_value == 0.0 {
            return 0.0;
        }
        return f64::INFINITY;
    }
    100.0 * ((old_value - new_value) / old_value).abs()
}

/// Decide whether the local report changed enough to publish.
///
/// Publishes unconditionally once the max interval has passed. Otherwise the
/// trigger is the largest of four deltas against the last published report.
/// The max-resource-usage term is an absolute gap in percentage points, not a
/// percent change: near-idle brokers would otherwise publish on every tiny
/// wiggle.
pub(crate) fn needs_broker_data_update(
    last: &LocalBrokerData,
    current: &LocalBrokerData,
    config: &LoadManagerConfig,
    now_millis: u64,
) -> bool {
    let update_max_interval_millis = config.report_update_max_interval_minutes * 60_000;
    let since_last_report = now_millis.saturating_sub(current.last_update);
    if since_last_report > update_max_interval_millis {
        info!(
            max_interval_minutes = %config.report_update_max_interval_minutes,
            "publishing local data because the max report interval has passed"
        );
        return true;
    }

    let max_change = [
        100.0 * (last.max_resource_usage() - current.max_resource_usage()).abs(),
        percent_change(
            last.msg_rate_in + last.msg_rate_out,
            current.msg_rate_in + current.msg_rate_out,
        ),
        percent_change(
            last.msg_throughput_in + last.msg_throughput_out,
            current.msg_throughput_in + current.msg_throughput_out,
        ),
        percent_change(last.num_bundles as f64, current.num_bundles as f64),
    ]
    .into_iter()
    .fold(0.0, f64::max);

    if max_change > config.report_update_threshold_percentage {
        info!(
            max_change = %max_change,
            threshold = %config.report_update_threshold_percentage,
            since_last_report_secs = %(since_last_report as f64 / 1000.0),
            "publishing local data because a tracked quantity changed beyond the threshold"
        );
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_report::ResourceUsage;

    fn data_with_usage(cpu_percent: f64) -> LocalBrokerData {
        let mut data = LocalBrokerData::new("http://a:8080", "1.0.0");
        data.cpu = ResourceUsage::new(cpu_percent, 100.0);
        data
    }

    #[test]
    fn test_percent_change_edge_cases() {
        assert_eq!(percent_change(0.0, 0.0), 0.0);
        assert_eq!(percent_change(0.0, 5.0), f64::INFINITY);
        assert!((percent_change(10.0, 5.0) - 50.0).abs() < f64::EPSILON);
        assert!((percent_change(10.0, 15.0) - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_usage_delta_is_absolute_percentage_points() {
        // 0.50 -> 0.58 is an 8-point gap, which beats a 5% threshold even
        // though the relative change is 16%
        let mut config = LoadManagerConfig::default();
        config.report_update_threshold_percentage = 5.0;

        let last = data_with_usage(50.0);
        let mut current = data_with_usage(58.0);
        current.last_update = 1_000;

        assert!(needs_broker_data_update(&last, &current, &config, 2_000));
    }

    #[test]
    fn test_small_deltas_do_not_publish() {
        let config = LoadManagerConfig::default();
        let last = data_with_usage(50.0);
        let mut current = data_with_usage(51.0);
        current.last_update = 1_000;

        assert!(!needs_broker_data_update(&last, &current, &config, 2_000));
    }

    #[test]
    fn test_max_interval_forces_publish() {
        let config = LoadManagerConfig::default();
        let last = data_with_usage(50.0);
        let mut current = data_with_usage(50.0);
        current.last_update = 0;

        let past_interval = config.report_update_max_interval_minutes * 60_000 + 1;
        assert!(needs_broker_data_update(&last, &current, &config, past_interval));
    }

    #[test]
    fn test_rate_growth_from_zero_publishes() {
        let config = LoadManagerConfig::default();
        let last = data_with_usage(50.0);
        let mut current = data_with_usage(50.0);
        current.msg_rate_in = 10.0;
        current.last_update = 1_000;

        assert!(needs_broker_data_update(&last, &current, &config, 2_000));
    }
}

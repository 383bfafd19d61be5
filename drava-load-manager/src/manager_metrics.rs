use metrics::{describe_counter, describe_gauge};

pub(crate) struct Metric {
    pub name: &'static str,
    description: &'static str,
}

pub(crate) const BUNDLE_ASSIGNMENTS_TOTAL: Metric = Metric {
    name: "drava_load_manager_assignments_total",
    description: "Total number of bundle placements decided by this manager",
};

pub(crate) const BUNDLE_UNLOADS_TOTAL: Metric = Metric {
    name: "drava_load_manager_unloads_total",
    description: "Total number of bundle unloads issued by the shedding loop",
};

pub(crate) const ACTIVE_BROKERS: Metric = Metric {
    name: "drava_load_manager_active_brokers",
    description: "Number of brokers currently tracked in the load view",
};

/// Register metric descriptions with the installed recorder.
pub fn describe_metrics() {
    describe_counter!(
        BUNDLE_ASSIGNMENTS_TOTAL.name,
        BUNDLE_ASSIGNMENTS_TOTAL.description
    );
    describe_counter!(BUNDLE_UNLOADS_TOTAL.name, BUNDLE_UNLOADS_TOTAL.description);
    describe_gauge!(ACTIVE_BROKERS.name, ACTIVE_BROKERS.description);
}

//! # Drava Load Manager
//!
//! Fleet-wide bundle placement and rebalancing for the drava broker cluster.
//!
//! ## Core Responsibilities
//!
//! - **Aggregation**: Builds a fleet-wide view of broker and bundle load from
//!   the reports every broker publishes to the coordination store
//! - **Placement**: Answers "which broker should serve this bundle" subject to
//!   namespace policy, anti-affinity, broker filters, and a pluggable scoring
//!   strategy, pre-reserving the bundle so concurrent lookups agree
//! - **Shedding**: Periodically detects overloaded brokers and unloads their
//!   hottest bundles so the namespace layer can reassign them
//! - **Reporting**: Samples the local host and serving layer and publishes
//!   this broker's own load report when it changed enough to matter
//!
//! ## Architecture
//!
//! Every broker runs a [`LoadManager`]; the externally elected leader is the
//! only instance that calls the placement, shedding, and bundle-persistence
//! operations. A single scheduler task per instance consumes the membership
//! watch stream and runs all aggregation passes serially.

pub mod bundle_data;
pub mod config;
pub mod filters;
pub mod host_usage;
pub mod load_report;
pub mod load_view;
pub mod placement;
pub mod shedding;
pub mod strategy;

mod errors;
mod manager;
mod manager_metrics;
mod reporter;
mod utils;

// Re-export main types
pub use errors::{LoadManagerError, Result};
pub use manager::{
    BundleStatsSource, ClusterAdmin, LoadManager, BUNDLE_DATA_ROOT, LOADBALANCE_BROKERS_ROOT,
    RESOURCE_QUOTA_ROOT, TIME_AVERAGE_BROKER_ROOT,
};
pub use manager_metrics::describe_metrics;

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use futures::StreamExt;
use metrics::{counter, gauge};
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use drava_metadata_store::{CoordinationStore, CreateMode, MetadataError, MetadataStorage};

use crate::bundle_data::{
    BundleData, ResourceQuota, TimeAverageBrokerData, DEFAULT_MESSAGE_RATE,
    DEFAULT_MESSAGE_THROUGHPUT, NUM_LONG_SAMPLES, NUM_SHORT_SAMPLES,
};
use crate::config::LoadManagerConfig;
use crate::errors::{LoadManagerError, Result};
use crate::filters::{BrokerFilter, BrokerVersionFilter};
use crate::host_usage::HostUsage;
use crate::load_report::{LocalBrokerData, NamespaceBundleStats};
use crate::load_view::{BrokerState, LoadView};
use crate::manager_metrics::{ACTIVE_BROKERS, BUNDLE_ASSIGNMENTS_TOTAL, BUNDLE_UNLOADS_TOTAL};
use crate::placement::{PlacementState, ResourceAllocationPolicies, SharedNamespacePolicies};
use crate::reporter;
use crate::shedding::{LoadSheddingStrategy, OverloadShedder};
use crate::strategy::{create_placement_strategy, PlacementStrategy};
use crate::utils::{bundle_namespace, bundle_range, join_path};

/// Keys under this path are the live brokers; each carries its LocalBrokerData.
pub const LOADBALANCE_BROKERS_ROOT: &str = "/loadbalance/brokers";
/// Aggregated per-bundle statistics persisted by the leader.
pub const BUNDLE_DATA_ROOT: &str = "/loadbalance/bundle-data";
/// Aggregated per-broker time-average data persisted by the leader.
pub const TIME_AVERAGE_BROKER_ROOT: &str = "/loadbalance/broker-time-average";
/// Legacy per-namespace resource quotas, read to seed bundle history.
pub const RESOURCE_QUOTA_ROOT: &str = "/loadbalance/resource-quota/namespace";

/// Snapshot of per-bundle traffic from the local serving layer.
pub trait BundleStatsSource: Send + Sync {
    fn bundle_stats(&self) -> HashMap<String, NamespaceBundleStats>;
}

/// Admin surface the shedding loop uses to request bundle unloads.
#[async_trait]
pub trait ClusterAdmin: Send + Sync {
    async fn unload_namespace_bundle(
        &self,
        namespace: &str,
        bundle_range: &str,
    ) -> anyhow::Result<()>;
}

/// LoadManager - fleet-wide bundle placement and rebalancing
///
/// Runs on every broker of the cluster. Each instance publishes its own load
/// report and tracks fleet membership; the elected leader additionally
/// answers placement requests and runs the shedding loop. Leadership itself
/// is decided outside this crate: callers invoke the leader-only operations
/// (`select_broker_for_assignment`, `do_load_shedding`, `write_bundle_data`)
/// only while they hold the leadership.
///
/// ## Concurrency:
/// One spawned task owns the membership watch stream and executes every
/// aggregation pass serially, so the load view is never updated by two passes
/// at once. Placement runs on caller tasks under a dedicated placement mutex;
/// the aggregator takes that mutex only for the short sections that reconcile
/// preallocations and rebuild the per-namespace fanout. Lock order is always
/// placement before load view.
#[derive(Clone)]
pub struct LoadManager {
    advertised: String,
    broker_key_path: String,
    time_average_path: String,
    store: CoordinationStore,
    config: Arc<LoadManagerConfig>,

    load_view: Arc<Mutex<LoadView>>,
    placement: Arc<Mutex<PlacementState>>,

    /// Report being built for this broker
    local_data: Arc<Mutex<LocalBrokerData>>,
    /// Report as of the last publish, for the publish predicate
    last_data: Arc<Mutex<LocalBrokerData>>,

    /// Stats assumed for bundles that were never sampled
    default_stats: NamespaceBundleStats,

    host_usage: Arc<dyn HostUsage>,
    bundle_stats_source: Arc<dyn BundleStatsSource>,
    admin: Arc<dyn ClusterAdmin>,
    policies: Arc<dyn ResourceAllocationPolicies>,
    filters: Arc<Vec<Box<dyn BrokerFilter>>>,
    strategy: Arc<dyn PlacementStrategy>,
    shedding_pipeline: Arc<Vec<Box<dyn LoadSheddingStrategy>>>,

    scheduler_handle: Arc<Mutex<Option<JoinHandle<()>>>>,
    last_bundle_data_update: Arc<AtomicU64>,
}

impl std::fmt::Debug for LoadManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadManager")
            .field("advertised", &self.advertised)
            .field("broker_key_path", &self.broker_key_path)
            .finish()
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}

impl LoadManager {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: MetadataStorage,
        config: LoadManagerConfig,
        host: &str,
        web_service_port: u16,
        broker_version: &str,
        host_usage: Arc<dyn HostUsage>,
        bundle_stats_source: Arc<dyn BundleStatsSource>,
        admin: Arc<dyn ClusterAdmin>,
    ) -> Self {
        let advertised = format!("{}:{}", host, web_service_port);
        let broker_key_path = join_path(&[LOADBALANCE_BROKERS_ROOT, &advertised]);
        let time_average_path = join_path(&[TIME_AVERAGE_BROKER_ROOT, &advertised]);
        let web_service_url = format!("http://{}", advertised);

        let default_stats = NamespaceBundleStats {
            msg_rate_in: DEFAULT_MESSAGE_RATE,
            msg_rate_out: DEFAULT_MESSAGE_RATE,
            msg_throughput_in: DEFAULT_MESSAGE_THROUGHPUT,
            msg_throughput_out: DEFAULT_MESSAGE_THROUGHPUT,
            ..Default::default()
        };

        let strategy = create_placement_strategy(&config.placement_strategy);

        LoadManager {
            advertised,
            broker_key_path,
            time_average_path,
            store: CoordinationStore::new(store),
            config: Arc::new(config),
            load_view: Arc::new(Mutex::new(LoadView::default())),
            placement: Arc::new(Mutex::new(PlacementState::default())),
            local_data: Arc::new(Mutex::new(LocalBrokerData::new(
                &web_service_url,
                broker_version,
            ))),
            last_data: Arc::new(Mutex::new(LocalBrokerData::new(
                &web_service_url,
                broker_version,
            ))),
            default_stats,
            host_usage,
            bundle_stats_source,
            admin,
            policies: Arc::new(SharedNamespacePolicies),
            filters: Arc::new(vec![Box::new(BrokerVersionFilter)]),
            strategy,
            shedding_pipeline: Arc::new(vec![Box::new(OverloadShedder)]),
            scheduler_handle: Arc::new(Mutex::new(None)),
            last_bundle_data_update: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Replace the namespace policy collaborator.
    pub fn with_policies(mut self, policies: Arc<dyn ResourceAllocationPolicies>) -> Self {
        self.policies = policies;
        self
    }

    /// Replace the broker filter pipeline.
    pub fn with_filters(mut self, filters: Vec<Box<dyn BrokerFilter>>) -> Self {
        self.filters = Arc::new(filters);
        self
    }

    /// Replace the placement scoring strategy.
    pub fn with_placement_strategy(mut self, strategy: Arc<dyn PlacementStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Replace the shedding strategy pipeline.
    pub fn with_shedding_pipeline(
        mut self,
        pipeline: Vec<Box<dyn LoadSheddingStrategy>>,
    ) -> Self {
        self.shedding_pipeline = Arc::new(pipeline);
        self
    }

    /// Advertised `host:port` name of this broker in the coordination store.
    pub fn advertised(&self) -> &str {
        &self.advertised
    }

    /// Register this broker in the cluster and start the aggregation loop.
    ///
    /// Creates the membership root, publishes the first local report under an
    /// ephemeral key, seeds the time-average entry, runs one full aggregation
    /// pass, and spawns the single-worker scheduler task that re-aggregates on
    /// every membership or broker-data change.
    pub async fn start(&self) -> Result<()> {
        self.store
            .exists_or_create(LOADBALANCE_BROKERS_ROOT, Value::Null, CreateMode::Persistent)
            .await?;

        self.update_local_broker_data().await;
        let payload = self.local_data.lock().await.clone();
        match self
            .store
            .create_json(&self.broker_key_path, &payload, CreateMode::Ephemeral)
            .await
        {
            Ok(()) => {}
            Err(MetadataError::KeyExists(_)) => {
                // Key may have been left behind by a previous manager of this
                // broker: take it over with the fresh data.
                self.store
                    .set_json(&self.broker_key_path, &payload, CreateMode::Ephemeral)
                    .await
                    .map_err(|e| {
                        LoadManagerError::StartFailure(format!(
                            "unable to refresh broker key {}: {}",
                            self.broker_key_path, e
                        ))
                    })?;
            }
            Err(e) => {
                error!(path = %self.broker_key_path, error = %e, "unable to create broker key");
                return Err(LoadManagerError::StartFailure(format!(
                    "unable to create broker key {}: {}",
                    self.broker_key_path, e
                )));
            }
        }

        self.store
            .exists_or_create(&self.time_average_path, Value::Null, CreateMode::Persistent)
            .await?;
        self.store
            .set_json(
                &self.time_average_path,
                &TimeAverageBrokerData::default(),
                CreateMode::Persistent,
            )
            .await?;

        self.update_all().await;
        self.last_bundle_data_update
            .store(now_millis(), Ordering::SeqCst);

        // Single-worker scheduler: one task owns the watch stream and runs
        // every aggregation pass serially.
        let (_, mut stream) = self
            .store
            .children_with_watch(LOADBALANCE_BROKERS_ROOT)
            .await?;
        let manager = self.clone();
        let handle = tokio::spawn(async move {
            while let Some(result) = stream.next().await {
                match result {
                    Ok(event) => {
                        debug!(event = %event, "membership or broker data change");
                        manager.refresh_cluster_view().await;
                    }
                    Err(e) => warn!(error = %e, "error receiving watch event"),
                }
            }
        });
        *self.scheduler_handle.lock().await = Some(handle);

        info!(broker = %self.advertised, "load manager started");
        Ok(())
    }

    /// Stop the aggregation loop and drop the cached broker data. The
    /// ephemeral broker key disappears with the coordination-store session.
    pub async fn stop(&self) {
        if let Some(handle) = self.scheduler_handle.lock().await.take() {
            handle.abort();
        }
        self.load_view.lock().await.broker_states.clear();
        info!(broker = %self.advertised, "load manager stopped");
    }

    /// Voluntarily drain this broker by deleting its membership key.
    pub async fn disable_broker(&self) -> Result<()> {
        self.store.delete(&self.broker_key_path).await?;
        info!(broker = %self.advertised, "broker disabled");
        Ok(())
    }

    /// Merge a fresh host probe sample and serving-layer snapshot into the
    /// local report.
    pub async fn update_local_broker_data(&self) {
        match self.host_usage.system_resource_usage().await {
            Ok(usage) => {
                let stats = self.bundle_stats_source.bundle_stats();
                self.local_data.lock().await.update(usage, stats);
            }
            Err(e) => warn!(error = %e, "error when attempting to update local broker data"),
        }
    }

    /// Publish the local report if it changed enough to be worth publishing.
    pub async fn write_broker_data(&self) {
        self.update_local_broker_data().await;

        let payload = {
            let mut local = self.local_data.lock().await;
            let last = self.last_data.lock().await;
            if !reporter::needs_broker_data_update(&last, &local, &self.config, now_millis()) {
                return;
            }
            local.last_update = now_millis();
            local.clone()
        };

        if let Err(e) = self
            .store
            .set_json(&self.broker_key_path, &payload, CreateMode::Ephemeral)
            .await
        {
            // Deltas stay in place so the next pass publishes them.
            warn!(error = %e, "error writing broker data to the coordination store");
            return;
        }

        let mut local = self.local_data.lock().await;
        local.last_bundle_gains.clear();
        local.last_bundle_losses.clear();
        *self.last_data.lock().await = local.clone();
    }

    /// As the leader, persist the aggregated bundle statistics and per-broker
    /// time-average data so a successor leader starts with warm history.
    pub async fn write_bundle_data(&self) {
        self.update_bundle_data().await;

        let (bundles, brokers) = {
            let view = self.load_view.lock().await;
            let bundles: Vec<(String, BundleData)> = view
                .bundle_data
                .iter()
                .map(|(bundle, data)| (bundle.clone(), data.clone()))
                .collect();
            let brokers: Vec<(String, TimeAverageBrokerData)> = view
                .broker_states
                .iter()
                .map(|(broker, state)| (broker.clone(), state.time_average_data.clone()))
                .collect();
            (bundles, brokers)
        };

        for (bundle, data) in bundles {
            let path = join_path(&[BUNDLE_DATA_ROOT, &bundle]);
            if let Err(e) = self.store.set_json(&path, &data, CreateMode::Persistent).await {
                warn!(bundle = %bundle, error = %e, "error writing bundle data");
            }
        }
        for (broker, data) in brokers {
            let path = join_path(&[TIME_AVERAGE_BROKER_ROOT, &broker]);
            if let Err(e) = self.store.set_json(&path, &data, CreateMode::Persistent).await {
                warn!(broker = %broker, error = %e, "error writing time average broker data");
            }
        }
    }

    /// As the leader, find a suitable broker for the assignment of the given
    /// bundle. Idempotent while the assignment is in flight: repeated calls
    /// return the broker already promised the bundle.
    pub async fn select_broker_for_assignment(&self, service_unit: &str) -> Result<String> {
        // The placement mutex is held for the entire selection.
        let mut placement = self.placement.lock().await;
        let bundle = service_unit.to_string();

        if let Some(broker) = placement.preallocated_index.get(&bundle) {
            return Ok(broker.clone());
        }

        let data = self.materialize_bundle_data(&bundle).await;
        let available = self.available_brokers().await;
        let policy_compliant = self.policies.allowed_brokers(&bundle, &available);

        let state = &mut *placement;
        state.candidate_cache.clear();
        state
            .candidate_cache
            .extend(policy_compliant.iter().cloned());
        state.remove_most_servicing_brokers(&bundle);
        info!(
            candidates = %state.candidate_cache.len(),
            bundle = %bundle,
            "brokers being considered for assignment"
        );

        let view = self.load_view.lock().await;

        for filter in self.filters.iter() {
            if let Err(e) = filter.filter(&mut state.candidate_cache, &data, &view, &self.config) {
                warn!(
                    bundle = %bundle,
                    error = %e,
                    "broker filter failed, restoring the full candidate set"
                );
                state.candidate_cache.clear();
                state
                    .candidate_cache
                    .extend(policy_compliant.iter().cloned());
                break;
            }
        }
        if state.candidate_cache.is_empty() {
            state
                .candidate_cache
                .extend(policy_compliant.iter().cloned());
        }

        let mut broker = self
            .strategy
            .select_broker(&state.candidate_cache, &data, &view, &self.config)
            .ok_or_else(|| LoadManagerError::NoBrokerAvailable(bundle.clone()))?;

        let overload_threshold = self.config.broker_overloaded_threshold_percentage / 100.0;
        let max_usage = view
            .broker_states
            .get(&broker)
            .map(|state| state.local_data.max_resource_usage())
            .unwrap_or(0.0);
        if max_usage > overload_threshold {
            // Every filtered candidate was overloaded; rescore once over the
            // full policy-compliant set and accept the result.
            debug!(
                bundle = %bundle,
                broker = %broker,
                max_usage = %max_usage,
                "selected broker is overloaded, rescoring over the full candidate set"
            );
            state.candidate_cache.clear();
            state
                .candidate_cache
                .extend(policy_compliant.iter().cloned());
            broker = self
                .strategy
                .select_broker(&state.candidate_cache, &data, &view, &self.config)
                .ok_or_else(|| LoadManagerError::NoBrokerAvailable(bundle.clone()))?;
        }
        drop(view);

        state.record_preallocation(&bundle, &broker, data);
        counter!(BUNDLE_ASSIGNMENTS_TOTAL.name, "broker" => broker.clone()).increment(1);
        info!(bundle = %bundle, broker = %broker, "bundle preallocated to broker");
        Ok(broker)
    }

    /// As the leader, select bundles to unload so the namespace layer can
    /// reassign them.
    pub async fn do_load_shedding(&self) {
        if !self.config.shedding_enabled {
            debug!("load shedding is disabled");
            return;
        }
        let available = self.available_brokers().await;
        if available.len() <= 1 {
            info!("only one broker available: no load shedding will be performed");
            return;
        }

        let grace_millis = self.config.shedding_grace_period_minutes * 60_000;
        let now = now_millis();
        let selected = {
            let mut view = self.load_view.lock().await;
            view.recently_unloaded
                .retain(|_, unloaded_at| now.saturating_sub(*unloaded_at) < grace_millis);

            // First strategy returning a non-empty map wins.
            let mut selected = HashMap::new();
            for strategy in self.shedding_pipeline.iter() {
                let found = strategy.find_bundles_for_unloading(&view, &self.config);
                if !found.is_empty() {
                    selected = found;
                    break;
                }
            }
            for bundle in selected.keys() {
                view.recently_unloaded.insert(bundle.clone(), now);
            }
            selected
        };

        // Admin calls happen outside any lock.
        for (bundle, broker) in selected {
            info!(bundle = %bundle, broker = %broker, "unloading bundle");
            match self
                .admin
                .unload_namespace_bundle(bundle_namespace(&bundle), bundle_range(&bundle))
                .await
            {
                Ok(()) => {
                    counter!(BUNDLE_UNLOADS_TOTAL.name).increment(1);
                }
                Err(e) => warn!(bundle = %bundle, error = %e, "error when trying to unload bundle"),
            }
        }
    }

    /// One scheduler turn: refresh membership, reap, and re-aggregate.
    async fn refresh_cluster_view(&self) {
        let alive = self.available_brokers().await;
        self.reap_dead_brokers(&alive).await;
        self.update_all().await;
    }

    /// Brokers currently in membership, falling back to the known set when
    /// the membership read fails.
    async fn available_brokers(&self) -> HashSet<String> {
        match self.store.children(LOADBALANCE_BROKERS_ROOT).await {
            Ok(children) => children.into_iter().collect(),
            Err(e) => {
                warn!(error = %e, "error when trying to get active brokers");
                self.load_view
                    .lock()
                    .await
                    .broker_states
                    .keys()
                    .cloned()
                    .collect()
            }
        }
    }

    /// Remove state and reclaim preallocations of brokers that left
    /// membership.
    pub(crate) async fn reap_dead_brokers(&self, alive: &HashSet<String>) {
        let dead: Vec<String> = {
            let mut view = self.load_view.lock().await;
            let dead: Vec<String> = view
                .broker_states
                .keys()
                .filter(|broker| !alive.contains(*broker))
                .cloned()
                .collect();
            for broker in &dead {
                view.broker_states.remove(broker);
            }
            dead
        };
        if dead.is_empty() {
            return;
        }
        let mut placement = self.placement.lock().await;
        for broker in &dead {
            debug!(broker = %broker, "broker appears to have stopped, reclaiming its preallocations");
            placement.purge_broker(broker);
        }
    }

    pub(crate) async fn update_all(&self) {
        self.update_all_broker_data().await;
        self.update_bundle_data().await;
    }

    /// Pull every member's published report into the load view.
    pub(crate) async fn update_all_broker_data(&self) {
        let alive = self.available_brokers().await;

        let mut reports: Vec<(String, LocalBrokerData)> = Vec::new();
        for broker in &alive {
            let path = join_path(&[LOADBALANCE_BROKERS_ROOT, broker]);
            match self.store.get_json::<LocalBrokerData>(&path).await {
                Ok(Some(data)) => reports.push((broker.clone(), data)),
                // A broker whose key vanished mid-read is simply dropped.
                Ok(None) => debug!(broker = %broker, "broker key not found, skipping"),
                Err(e) => warn!(broker = %broker, error = %e, "error reading broker data"),
            }
        }

        let mut view = self.load_view.lock().await;
        for (broker, data) in reports {
            match view.broker_states.get_mut(&broker) {
                Some(state) => state.local_data = data,
                None => {
                    view.broker_states
                        .insert(broker.clone(), BrokerState::new(data));
                }
            }
        }
        view.broker_states.retain(|broker, _| alive.contains(broker));
        gauge!(ACTIVE_BROKERS.name).set(view.broker_states.len() as f64);
    }

    /// Fold every broker's reported bundle stats into the per-bundle windows,
    /// retire settled preallocations, and recompute per-broker aggregates.
    pub(crate) async fn update_bundle_data(&self) {
        struct BrokerSnapshot {
            broker: String,
            stats: HashMap<String, NamespaceBundleStats>,
        }

        // Snapshot the reported stats and note bundles with no window yet.
        // Store reads happen with the view lock released, as in
        // update_all_broker_data.
        let mut missing: HashSet<String> = HashSet::new();
        let snapshots: Vec<BrokerSnapshot> = {
            let view = self.load_view.lock().await;
            let mut snapshots = Vec::new();
            for (broker, state) in &view.broker_states {
                let stats = state.local_data.last_stats.clone();
                for bundle in stats.keys() {
                    if !view.bundle_data.contains_key(bundle) {
                        missing.insert(bundle.clone());
                    }
                }
                snapshots.push(BrokerSnapshot {
                    broker: broker.clone(),
                    stats,
                });
            }
            snapshots
        };

        // Hydrate unseen bundles from the store, outside any lock.
        let mut hydrated: Vec<(String, BundleData)> = Vec::new();
        for bundle in &missing {
            hydrated.push((bundle.clone(), self.bundle_data_or_default(bundle).await));
        }

        // Feed the reported samples into the bundle windows.
        {
            let mut view = self.load_view.lock().await;
            for (bundle, data) in hydrated {
                // placement may have materialized the bundle in the meantime
                view.bundle_data.entry(bundle).or_insert(data);
            }
            for snapshot in &snapshots {
                for (bundle, stats) in &snapshot.stats {
                    if let Some(data) = view.bundle_data.get_mut(bundle) {
                        data.update(stats);
                    }
                }
            }
        }

        // Retire preallocations whose bundle now shows up in a report, then
        // rebuild the namespace fanout. Lock order is placement before load
        // view, so the view lock was dropped above.
        let mut promised_keys: HashMap<String, Vec<String>> = HashMap::new();
        {
            let mut placement = self.placement.lock().await;
            for snapshot in &snapshots {
                for bundle in snapshot.stats.keys() {
                    if let Some(promised_to) = placement.clear_settled(bundle) {
                        debug!(
                            bundle = %bundle,
                            reported_by = %snapshot.broker,
                            promised_to = %promised_to,
                            "preallocated bundle settled"
                        );
                    }
                }
            }
            for snapshot in &snapshots {
                let promised = placement.preallocated_keys(&snapshot.broker);
                placement.rebuild_fanout(
                    &snapshot.broker,
                    snapshot.stats.keys().chain(promised.iter()),
                );
                promised_keys.insert(snapshot.broker.clone(), promised);
            }
        }

        // Recompute the aggregated time-average data per broker.
        {
            let mut view = self.load_view.lock().await;
            for snapshot in &snapshots {
                let promised = promised_keys
                    .get(&snapshot.broker)
                    .cloned()
                    .unwrap_or_default();
                let mut aggregate = TimeAverageBrokerData::default();
                aggregate.reset(
                    snapshot.stats.keys().chain(promised.iter()),
                    &view.bundle_data,
                    &self.default_stats,
                );
                if let Some(state) = view.broker_states.get_mut(&snapshot.broker) {
                    state.time_average_data = aggregate;
                }
            }
        }

        self.last_bundle_data_update
            .store(now_millis(), Ordering::SeqCst);
    }

    /// Bundle data from the load view, or hydrated from the store, or the
    /// defaults for a never-seen bundle.
    async fn materialize_bundle_data(&self, bundle: &str) -> BundleData {
        if let Some(data) = self.load_view.lock().await.bundle_data.get(bundle) {
            return data.clone();
        }
        let data = self.bundle_data_or_default(bundle).await;
        self.load_view
            .lock()
            .await
            .bundle_data
            .insert(bundle.to_string(), data.clone());
        data
    }

    async fn bundle_data_or_default(&self, bundle: &str) -> BundleData {
        let bundle_path = join_path(&[BUNDLE_DATA_ROOT, bundle]);
        match self.store.get_json::<BundleData>(&bundle_path).await {
            Ok(Some(data)) => return data,
            Ok(None) => {}
            Err(e) => warn!(bundle = %bundle, error = %e, "error reading persisted bundle data"),
        }

        let quota_path = join_path(&[RESOURCE_QUOTA_ROOT, bundle]);
        match self.store.get_json::<ResourceQuota>(&quota_path).await {
            Ok(Some(quota)) => return BundleData::from_resource_quota(&quota),
            Ok(None) => {}
            Err(e) => warn!(bundle = %bundle, error = %e, "error reading legacy resource quota"),
        }

        BundleData::with_default_stats(NUM_SHORT_SAMPLES, NUM_LONG_SAMPLES, &self.default_stats)
    }
}

#[cfg(test)]
#[path = "manager_test.rs"]
mod tests;

//! Native host probe built on sysinfo
//!
//! Works on Linux, macOS, and Windows platforms.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use sysinfo::{CpuRefreshKind, MemoryRefreshKind, Networks, RefreshKind, System};
use tokio::sync::Mutex;

use super::HostUsage;
use crate::load_report::{ResourceUsage, SystemResourceUsage};

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

pub struct NativeHostUsage {
    system: Arc<Mutex<System>>,
    prev_snapshot: Arc<Mutex<NetworkSnapshot>>,
    /// Bandwidth limit used for the percentage computation; 0 disables the
    /// bandwidth components.
    nic_limit_bytes_per_sec: f64,
}

#[derive(Debug, Clone)]
struct NetworkSnapshot {
    timestamp: Instant,
    rx_bytes: u64,
    tx_bytes: u64,
}

impl NativeHostUsage {
    pub fn new(override_nic_speed_gbps: Option<f64>) -> Self {
        let system = System::new_with_specifics(
            RefreshKind::nothing()
                .with_cpu(CpuRefreshKind::everything())
                .with_memory(MemoryRefreshKind::everything()),
        );

        // 1 Gbps = 125_000_000 bytes/s
        let nic_limit_bytes_per_sec = override_nic_speed_gbps
            .map(|gbps| gbps * 125_000_000.0)
            .unwrap_or(0.0);

        Self {
            system: Arc::new(Mutex::new(system)),
            prev_snapshot: Arc::new(Mutex::new(NetworkSnapshot {
                timestamp: Instant::now(),
                rx_bytes: 0,
                tx_bytes: 0,
            })),
            nic_limit_bytes_per_sec,
        }
    }

    async fn cpu_usage(&self) -> ResourceUsage {
        let mut system = self.system.lock().await;

        // Two refreshes bracketing a short wait, per sysinfo guidance
        system.refresh_cpu_all();
        tokio::time::sleep(Duration::from_millis(200)).await;
        system.refresh_cpu_all();

        let cpus = system.cpus();
        if cpus.is_empty() {
            return ResourceUsage::new(0.0, 100.0);
        }
        let total: f32 = cpus.iter().map(|cpu| cpu.cpu_usage()).sum();
        ResourceUsage::new((total / cpus.len() as f32) as f64, 100.0)
    }

    async fn memory_usage(&self) -> ResourceUsage {
        let mut system = self.system.lock().await;
        system.refresh_memory();
        ResourceUsage::new(
            system.used_memory() as f64 / BYTES_PER_MIB,
            system.total_memory() as f64 / BYTES_PER_MIB,
        )
    }

    async fn bandwidth_usage(&self) -> (ResourceUsage, ResourceUsage) {
        let networks = Networks::new_with_refreshed_list();

        let mut total_rx = 0u64;
        let mut total_tx = 0u64;
        for (_, network) in &networks {
            total_rx += network.total_received();
            total_tx += network.total_transmitted();
        }

        let mut prev = self.prev_snapshot.lock().await;
        let now = Instant::now();
        let elapsed = now.duration_since(prev.timestamp).as_secs_f64();
        if elapsed == 0.0 {
            return (
                ResourceUsage::new(0.0, self.nic_limit_bytes_per_sec),
                ResourceUsage::new(0.0, self.nic_limit_bytes_per_sec),
            );
        }

        let rx_rate = if prev.rx_bytes > 0 {
            total_rx.saturating_sub(prev.rx_bytes) as f64 / elapsed
        } else {
            0.0
        };
        let tx_rate = if prev.tx_bytes > 0 {
            total_tx.saturating_sub(prev.tx_bytes) as f64 / elapsed
        } else {
            0.0
        };

        prev.rx_bytes = total_rx;
        prev.tx_bytes = total_tx;
        prev.timestamp = now;

        (
            ResourceUsage::new(rx_rate, self.nic_limit_bytes_per_sec),
            ResourceUsage::new(tx_rate, self.nic_limit_bytes_per_sec),
        )
    }
}

#[async_trait]
impl HostUsage for NativeHostUsage {
    async fn system_resource_usage(&self) -> Result<SystemResourceUsage> {
        let cpu = self.cpu_usage().await;
        let memory = self.memory_usage().await;
        let (bandwidth_in, bandwidth_out) = self.bandwidth_usage().await;

        Ok(SystemResourceUsage {
            cpu,
            memory,
            bandwidth_in,
            bandwidth_out,
        })
    }
}

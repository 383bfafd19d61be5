//! Host resource probing
//!
//! Samples CPU, memory, and network bandwidth of the local machine into the
//! [`SystemResourceUsage`] snapshot the reporter publishes.

mod native;

pub use native::NativeHostUsage;

use anyhow::Result;
use async_trait::async_trait;

use crate::load_report::SystemResourceUsage;

/// Host probe abstraction; the broker injects an implementation.
#[async_trait]
pub trait HostUsage: Send + Sync {
    async fn system_resource_usage(&self) -> Result<SystemResourceUsage>;
}

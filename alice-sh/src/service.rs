use core::time::Duration;
use std::sync::Arc;

use alice_sh_common::{ServiceId, device::DeviceConfig};
use serde::Deserialize;

use crate::{
    Device, DeviceOptions, Error, MemoryCache, RemotePlatform, Result, StateCache,
    cache::DEFAULT_CAPACITY, device::DEFAULT_PUSH_TIMEOUT,
};

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub id: ServiceId,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    #[serde(default = "default_push_timeout_ms")]
    pub push_timeout_ms: u64,
}

fn default_cache_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_push_timeout_ms() -> u64 {
    DEFAULT_PUSH_TIMEOUT.as_millis() as u64
}

impl ServiceConfig {
    pub fn new(id: impl Into<ServiceId>) -> Self {
        Self {
            id: id.into(),
            cache_capacity: default_cache_capacity(),
            push_timeout_ms: default_push_timeout_ms(),
        }
    }
}

/// Connection to the remote platform, shared by all devices of a deployment.
///
/// Owns the process-wide value cache, which outlives the devices built from it.
pub struct Service {
    config: ServiceConfig,
    cache: Arc<MemoryCache>,
    remote: Arc<dyn RemotePlatform>,
}

impl Service {
    /// Publishes the service on the remote platform. A service that fails to publish is not
    /// usable.
    pub fn start(config: ServiceConfig, remote: Arc<dyn RemotePlatform>) -> Result<Self> {
        if let Err(err) = remote.publish(&config.id) {
            tracing::error!(service = %config.id, "Failed to publish service: {err}");
            return Err(Error::Sync(err));
        }

        tracing::info!(
            service = %config.id,
            cache_capacity = config.cache_capacity,
            "Service published",
        );

        Ok(Self {
            cache: Arc::new(MemoryCache::new(config.cache_capacity)),
            config,
            remote,
        })
    }

    pub fn id(&self) -> &ServiceId {
        &self.config.id
    }

    pub fn cache(&self) -> Arc<MemoryCache> {
        self.cache.clone()
    }

    pub fn device(&self, config: DeviceConfig) -> Arc<Device> {
        let options =
            DeviceOptions { push_timeout: Duration::from_millis(self.config.push_timeout_ms) };
        Device::with_options(config, self.cache.clone(), self.remote.clone(), options)
    }

    pub fn close(self) {
        self.cache.clear();
        self.remote.unpublish(&self.config.id);
        tracing::info!(service = %self.config.id, "Service unpublished");
    }
}

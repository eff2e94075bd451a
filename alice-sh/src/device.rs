use core::{
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};
use std::{collections::HashMap, sync::Arc};

use alice_sh_common::{
    Descriptor, DeviceId, NodeId, StateKey, StateValue,
    device::{DeviceConfig, DeviceInfo, DeviceState, Manufacturer},
};
use parking_lot::{Mutex, RwLock};

use crate::{Error, Relay, RemotePlatform, Result, StateCache, registry::Registry};

pub const DEFAULT_PUSH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy)]
pub struct DeviceOptions {
    /// Upper bound for a single push to the remote platform
    pub push_timeout: Duration,
}

impl Default for DeviceOptions {
    fn default() -> Self {
        Self { push_timeout: DEFAULT_PUSH_TIMEOUT }
    }
}

/// One physical or virtual device, shared by the handlers of its capabilities and properties.
pub struct Device {
    config: DeviceConfig,
    pub(crate) options: DeviceOptions,
    pub(crate) registry: RwLock<Registry>,
    pub(crate) cache: Arc<dyn StateCache>,
    pub(crate) remote: Arc<dyn RemotePlatform>,
    pub(crate) relay: Relay,
    // serializes outbound attempts per descriptor
    pub(crate) outbound: Mutex<HashMap<StateKey, Arc<tokio::sync::Mutex<()>>>>,
    closed: AtomicBool,
}

impl Device {
    pub fn new(
        config: DeviceConfig,
        cache: Arc<dyn StateCache>,
        remote: Arc<dyn RemotePlatform>,
    ) -> Arc<Self> {
        Self::with_options(config, cache, remote, DeviceOptions::default())
    }

    pub fn with_options(
        config: DeviceConfig,
        cache: Arc<dyn StateCache>,
        remote: Arc<dyn RemotePlatform>,
        options: DeviceOptions,
    ) -> Arc<Self> {
        tracing::debug!(device = %config.id, "Creating device");

        Arc::new(Self {
            config,
            options,
            registry: RwLock::new(Registry::new()),
            cache,
            remote,
            relay: Relay::new(),
            outbound: Mutex::new(HashMap::new()),
            closed: AtomicBool::new(false),
        })
    }

    pub fn id(&self) -> &DeviceId {
        &self.config.id
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<dyn StateCache> {
        &self.cache
    }

    pub fn relay(&self) -> &Relay {
        &self.relay
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Registers a descriptor owned by the handler `owner`.
    pub fn register(&self, owner: &NodeId, descriptor: Descriptor) -> Result<()> {
        if self.is_closed() {
            return Err(Error::DeviceClosed(self.id().clone()));
        }

        let key = descriptor.key();
        let replaced = self.registry.write().set_descriptor(owner.clone(), descriptor)?;

        tracing::debug!(
            device = %self.id(),
            %key,
            %owner,
            replaced = replaced.is_some(),
            "Registered descriptor",
        );

        Ok(())
    }

    /// Removes the descriptor at `key` if `owner` still owns it.
    pub fn unregister(&self, key: &StateKey, owner: &NodeId) -> Option<Descriptor> {
        let removed = self.registry.write().remove_owned(key, owner);

        if removed.is_some() {
            self.release_outbound_lock(key);
            tracing::debug!(device = %self.id(), %key, %owner, "Removed descriptor");
        }

        removed
    }

    pub fn descriptor(&self, key: &StateKey) -> Option<Descriptor> {
        self.registry.read().get(key).cloned()
    }

    /// The value currently visible for `key`, which may still be awaiting confirmation.
    pub fn value(&self, key: &StateKey) -> Option<StateValue> {
        self.registry.read().value(key).cloned()
    }

    pub fn committed_value(&self, key: &StateKey) -> Option<StateValue> {
        self.registry.read().committed(key).cloned()
    }

    pub fn descriptor_count(&self) -> usize {
        self.registry.read().len()
    }

    pub fn info(&self) -> DeviceInfo {
        let (capabilities, properties) = self.registry.read().serialize_all();

        DeviceInfo {
            id: self.config.id.clone(),
            name: self.config.name.clone(),
            description: self.config.description.clone(),
            room: self.config.room.clone(),
            device_type: self.config.device_type.clone(),
            capabilities,
            properties,
            device_info: Manufacturer {
                manufacturer: self.config.manufacturer.clone(),
                model: self.config.model.clone(),
            },
        }
    }

    pub fn state(&self) -> DeviceState {
        let (capabilities, properties) = self.registry.read().serialize_states();
        DeviceState { id: self.config.id.clone(), capabilities, properties }
    }

    /// State of the retrievable descriptors, for answering a platform query.
    pub fn query_state(&self) -> DeviceState {
        let (capabilities, properties) =
            self.registry.read().serialize_states_where(|d| d.retrievable);
        DeviceState { id: self.config.id.clone(), capabilities, properties }
    }

    /// Rejects further registrations and releases every descriptor.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        let released = {
            let mut registry = self.registry.write();
            let len = registry.len();
            registry.clear();
            len
        };
        // locks held by attempts still in flight stay until those attempts finish
        self.outbound.lock().retain(|_, lock| Arc::strong_count(lock) > 1);

        tracing::info!(device = %self.id(), released, "Device closed");
    }

    pub(crate) fn outbound_lock(&self, key: &StateKey) -> Arc<tokio::sync::Mutex<()>> {
        self.outbound.lock().entry(key.clone()).or_default().clone()
    }

    /// Drops the lock for `key` unless an attempt holds or waits on it, so a descriptor
    /// registered again under the same key still queues behind that attempt.
    fn release_outbound_lock(&self, key: &StateKey) {
        let mut outbound = self.outbound.lock();
        if outbound.get(key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            outbound.remove(key);
        }
    }
}

impl core::fmt::Debug for Device {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Device")
            .field("id", &self.config.id)
            .field("descriptors", &self.descriptor_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}

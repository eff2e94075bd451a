use std::sync::Arc;

use alice_sh::{
    Device, MemoryCache, RemotePlatform, SyncError,
    common::device::{DeviceConfig, DeviceInfo, DeviceState},
};
use async_trait::async_trait;
use parking_lot::Mutex;

/// Records pushes; fails them while `failing` is set.
#[derive(Default)]
pub struct Recorder {
    pub infos: Mutex<Vec<DeviceInfo>>,
    pub states: Mutex<Vec<DeviceState>>,
    pub failing: Mutex<Option<SyncError>>,
}

impl Recorder {
    pub fn fail(&self, err: SyncError) {
        *self.failing.lock() = Some(err);
    }

    pub fn recover(&self) {
        *self.failing.lock() = None;
    }

    pub fn state_pushes(&self) -> usize {
        self.states.lock().len()
    }

    fn outcome(&self) -> Result<(), SyncError> {
        match self.failing.lock().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RemotePlatform for Recorder {
    async fn push_device_info(&self, info: &DeviceInfo) -> Result<(), SyncError> {
        self.infos.lock().push(info.clone());
        self.outcome()
    }

    async fn push_state(&self, state: &DeviceState) -> Result<(), SyncError> {
        self.states.lock().push(state.clone());
        self.outcome()
    }
}

pub fn setup() -> (Arc<Device>, Arc<MemoryCache>, Arc<Recorder>) {
    let cache = Arc::new(MemoryCache::default());
    let remote = Arc::new(Recorder::default());
    let device = Device::new(DeviceConfig::new("lamp", "Lamp"), cache.clone(), remote.clone());
    (device, cache, remote)
}

pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

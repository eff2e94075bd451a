use std::sync::Arc;

use alice_sh_common::device::{DeviceInfo, DeviceState};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Semaphore;

use crate::{RemotePlatform, SyncError};

/// Remote platform double that records pushes and fails, stalls or blocks on request.
#[derive(Default)]
pub struct ScriptedRemote {
    inner: Mutex<Script>,
}

#[derive(Default)]
struct Script {
    infos: Vec<DeviceInfo>,
    states: Vec<DeviceState>,
    failure: Option<SyncError>,
    stalled: bool,
    gate: Option<Arc<Semaphore>>,
}

pub struct Gate(Arc<Semaphore>);

impl Gate {
    pub fn release(self) {
        self.0.close();
    }
}

impl ScriptedRemote {
    pub fn fail_with(&self, err: SyncError) {
        self.inner.lock().failure = Some(err);
    }

    pub fn stall(&self) {
        self.inner.lock().stalled = true;
    }

    /// Blocks every push until the returned gate is released.
    pub fn hold(&self) -> Gate {
        let semaphore = Arc::new(Semaphore::new(0));
        self.inner.lock().gate = Some(semaphore.clone());
        Gate(semaphore)
    }

    pub fn info_pushes(&self) -> usize {
        self.inner.lock().infos.len()
    }

    pub fn state_pushes(&self) -> usize {
        self.inner.lock().states.len()
    }

    pub fn last_state(&self) -> Option<DeviceState> {
        self.inner.lock().states.last().cloned()
    }

    async fn respond(&self) -> Result<(), SyncError> {
        let (stalled, gate) = {
            let script = self.inner.lock();
            (script.stalled, script.gate.clone())
        };

        if stalled {
            core::future::pending::<()>().await;
        }
        if let Some(gate) = gate {
            // closed when released
            let _ = gate.acquire().await;
        }

        match self.inner.lock().failure.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RemotePlatform for ScriptedRemote {
    async fn push_device_info(&self, info: &DeviceInfo) -> Result<(), SyncError> {
        self.inner.lock().infos.push(info.clone());
        self.respond().await
    }

    async fn push_state(&self, state: &DeviceState) -> Result<(), SyncError> {
        self.inner.lock().states.push(state.clone());
        self.respond().await
    }
}

/// Lets spawned tasks on the current-thread test runtime run to completion.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

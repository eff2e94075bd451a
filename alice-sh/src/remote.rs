use alice_sh_common::{ServiceId, device::{DeviceInfo, DeviceState}};
use async_trait::async_trait;

use crate::SyncError;

/// The platform devices are synchronized with.
///
/// Implementations own the transport; every call may fail or stall, and callers bound pushes
/// with their own timeout.
#[async_trait]
pub trait RemotePlatform: Send + Sync {
    /// Announces the full set of capabilities and properties of a device.
    async fn push_device_info(&self, info: &DeviceInfo) -> Result<(), SyncError>;

    /// Reports the current state of a device.
    async fn push_state(&self, state: &DeviceState) -> Result<(), SyncError>;

    /// Makes a service reachable for incoming platform requests.
    fn publish(&self, _service: &ServiceId) -> Result<(), SyncError> {
        Ok(())
    }

    fn unpublish(&self, _service: &ServiceId) {}
}

//! Device state synchronization core.
//!
//! Capability and property handlers share a [`Device`], which keeps a [`Registry`] of their
//! descriptors, mirrors committed values into a shared [`StateCache`], pushes local changes to
//! a [`RemotePlatform`] with rollback on failure, and relays remote changes back to the
//! handlers.

use core::time::Duration;

pub use alice_sh_common as common;
use alice_sh_common::{StateKey, ValidationError};

pub mod cache;
pub mod device;
pub mod handlers;
pub mod log;
pub mod registry;
pub mod relay;
pub mod remote;
pub mod service;
mod sync;
#[cfg(test)]
mod testing;

pub use self::{
    cache::{MemoryCache, StateCache},
    device::{Device, DeviceOptions},
    handlers::{Handler, HandlerConfig, OutputMessage, Status},
    registry::Registry,
    relay::{Relay, Subscription},
    remote::RemotePlatform,
    service::{Service, ServiceConfig},
    sync::Outcome,
};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("sync error: {0}")]
    Sync(#[from] SyncError),
    #[error("device {0} is closed")]
    DeviceClosed(common::DeviceId),
    #[error("no descriptor registered for {0}")]
    UnknownDescriptor(StateKey),
    #[error("serde json error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}

/// Failure of a push to the remote platform.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    #[error("remote platform unreachable: {0}")]
    Network(String),
    #[error("push timed out after {0:?}")]
    Timeout(Duration),
    #[error("remote platform rejected the request: {0}")]
    Rejected(String),
}

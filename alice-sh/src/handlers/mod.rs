//! Handlers bind one statically configured capability or property to a [`Device`].
//!
//! A handler derives its descriptor from its config at start, seeds the value from the
//! shared cache, forwards local input to the synchronizer and relays remote changes to its
//! output channel.

use core::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};
use std::sync::{Arc, Weak};

use alice_sh_common::{
    Descriptor, DescriptorState, DescriptorType, NodeId, Parameters, StateChange, StateKey,
    StateValue, ValidationError,
};
use compact_str::CompactString;
use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::{mpsc, watch};

use crate::{Device, Outcome, Result, Subscription};

pub mod color;
pub mod event;
pub mod on_off;
pub mod range;

const STATUS_TEXT_MAX: usize = 32;
const STATUS_HOLD: Duration = Duration::from_millis(3000);
const ERROR_STATUS_HOLD: Duration = Duration::from_millis(5000);

/// Static configuration of a handler kind.
pub trait HandlerConfig {
    /// Derives the descriptor template. Fails on inconsistent configuration.
    fn template(&self) -> Result<Template>;
}

/// Everything needed to register a descriptor except its current value.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub kind: DescriptorType,
    pub instance: CompactString,
    pub parameters: Parameters,
    pub retrievable: bool,
    pub reportable: bool,
    /// Used when the cache holds no usable value
    pub default: Option<StateValue>,
}

impl Template {
    pub fn key(&self) -> StateKey {
        StateKey::new(self.kind, self.instance.clone())
    }

    fn into_descriptor(self, value: Option<StateValue>) -> Descriptor {
        Descriptor {
            kind: self.kind,
            retrievable: self.retrievable,
            reportable: self.reportable,
            parameters: self.parameters,
            state: DescriptorState { instance: self.instance, value },
        }
    }
}

/// Diagnostic state of a handler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Status {
    #[default]
    Idle,
    Pending(CompactString),
    Ok,
    Error(CompactString),
}

impl Status {
    /// How long the status is shown before falling back to [`Status::Idle`].
    fn hold(&self) -> Option<Duration> {
        match self {
            Status::Idle => None,
            Status::Pending(_) | Status::Ok => Some(STATUS_HOLD),
            Status::Error(_) => Some(ERROR_STATUS_HOLD),
        }
    }
}

/// Status channel of one handler. Every update schedules its own reset to idle; a later
/// update cancels the pending reset.
struct StatusBoard {
    tx: watch::Sender<Status>,
    generation: AtomicU64,
}

impl StatusBoard {
    fn new() -> Arc<Self> {
        let (tx, _) = watch::channel(Status::Idle);
        Arc::new(Self { tx, generation: AtomicU64::new(0) })
    }

    fn subscribe(&self) -> watch::Receiver<Status> {
        self.tx.subscribe()
    }

    /// Publishes `status` and returns the one it replaced.
    fn show(self: &Arc<Self>, status: Status) -> Status {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let hold = status.hold();
        let previous = self.tx.send_replace(status);

        // without a runtime the status simply stays
        if let (Some(hold), Ok(handle)) = (hold, tokio::runtime::Handle::try_current()) {
            handle.spawn(Self::reset_after(Arc::downgrade(self), generation, hold));
        }

        previous
    }

    async fn reset_after(board: Weak<Self>, generation: u64, hold: Duration) {
        tokio::time::sleep(hold).await;

        let Some(board) = board.upgrade() else {
            return;
        };
        board.tx.send_if_modified(|status| {
            if board.generation.load(Ordering::Acquire) != generation {
                return false;
            }
            *status = Status::Idle;
            true
        });
    }
}

/// A remote change delivered to the handler.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputMessage {
    pub payload: StateValue,
    #[serde(rename = "type")]
    pub kind: DescriptorType,
    pub instance: CompactString,
}

pub struct Handler {
    id: NodeId,
    device: Arc<Device>,
    key: StateKey,
    status: Arc<StatusBoard>,
    subscription: Option<Subscription>,
    closed: bool,
}

impl Handler {
    /// Registers the handler's descriptor on `device` and announces the new descriptor set.
    ///
    /// A failing announcement is logged and shown on the status channel, the handler still
    /// starts.
    pub async fn start(
        id: impl Into<NodeId>,
        config: &impl HandlerConfig,
        device: Arc<Device>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<OutputMessage>)> {
        let id = id.into();
        let template = config.template()?;
        let key = template.key();

        let cached = device.cache.get(&key.cache_key(&id)).filter(|value| {
            let usable = template.parameters.validate(&key.instance, value).is_ok();
            if !usable {
                tracing::debug!(handler = %id, %key, %value, "Discarding unusable cached value");
            }
            usable
        });
        let value = cached.or_else(|| template.default.clone());

        device.register(&id, template.into_descriptor(value))?;

        let status = StatusBoard::new();
        let (tx, rx) = mpsc::unbounded_channel();

        let subscription = device.relay.subscribe({
            let key = key.clone();
            let status = status.clone();
            move |change: &StateChange| {
                if change.key() != key {
                    return;
                }

                status.show(Status::Pending(status_text(change.value())));
                // the receiver may be gone, the change is applied either way
                let _ = tx.send(OutputMessage {
                    payload: change.value().clone(),
                    kind: change.kind,
                    instance: change.state.instance.clone(),
                });
            }
        });

        let handler = Self {
            id,
            device,
            key,
            status,
            subscription: Some(subscription),
            closed: false,
        };

        tracing::info!(
            handler = %handler.id,
            device = %handler.device.id(),
            key = %handler.key,
            "Handler started",
        );

        if let Err(err) = handler.device.push_device_info().await {
            tracing::error!(handler = %handler.id, "Failed to push device info: {err}");
            handler.status.show(Status::Error(err.to_string().into()));
        }

        Ok((handler, rx))
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn key(&self) -> &StateKey {
        &self.key
    }

    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }

    pub fn value(&self) -> Option<StateValue> {
        self.device.value(&self.key)
    }

    pub fn status(&self) -> watch::Receiver<Status> {
        self.status.subscribe()
    }

    /// Applies a local input payload.
    pub async fn input(&self, payload: serde_json::Value) -> Result<Outcome> {
        let candidate = match serde_json::from_value::<StateValue>(payload) {
            Ok(value) => value,
            Err(err) => {
                let err = crate::Error::from(ValidationError::Payload(err.to_string().into()));
                self.status.show(Status::Error(err.to_string().into()));
                return Err(err);
            }
        };

        let text = status_text(&candidate);
        let previous = self.status.show(Status::Pending(text));

        match self.device.set_state(&self.key, candidate).await {
            Ok(Outcome::Unchanged) => {
                self.status.show(previous);
                Ok(Outcome::Unchanged)
            }
            Ok(Outcome::Committed) => {
                self.status.show(Status::Ok);
                Ok(Outcome::Committed)
            }
            Err(err) => {
                tracing::error!(
                    handler = %self.id,
                    key = %self.key,
                    "Failed to apply input: {err}",
                );
                self.status.show(Status::Error(err.to_string().into()));
                Err(err)
            }
        }
    }

    /// Detaches the handler from its device.
    ///
    /// With `removed` set the handler is gone for good: its cached value is dropped and the
    /// reduced descriptor set is pushed. Push failures are logged only.
    pub async fn close(mut self, removed: bool) {
        self.detach();

        if removed {
            self.device.cache.delete(&self.key.cache_key(&self.id));

            let (info, state) =
                futures::join!(self.device.push_device_info(), self.device.push_state());
            if let Err(err) = info {
                tracing::warn!(handler = %self.id, "Failed to push device info on removal: {err}");
            }
            if let Err(err) = state {
                tracing::warn!(handler = %self.id, "Failed to push state on removal: {err}");
            }
        }

        tracing::info!(handler = %self.id, removed, "Handler closed");
    }

    fn detach(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        drop(self.subscription.take());
        self.device.unregister(&self.key, &self.id);
    }
}

impl Drop for Handler {
    fn drop(&mut self) {
        self.detach();
    }
}

impl core::fmt::Debug for Handler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Handler")
            .field("id", &self.id)
            .field("device", self.device.id())
            .field("key", &self.key)
            .finish()
    }
}

fn status_text(value: &StateValue) -> CompactString {
    let text = value.to_string();
    match text.char_indices().nth(STATUS_TEXT_MAX) {
        Some((end, _)) => format!("{}...", &text[..end]).into(),
        None => text.into(),
    }
}

/// Accepts a number either as is or as a decimal string.
pub(crate) fn lenient_u32<'de, D: Deserializer<'de>>(de: D) -> Result<Option<u32>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u32),
        Text(String),
    }

    match Option::<Raw>::deserialize(de)? {
        None => Ok(None),
        Some(Raw::Number(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Raw::Text(s)) => s.trim().parse().map(Some).map_err(serde::de::Error::custom),
    }
}

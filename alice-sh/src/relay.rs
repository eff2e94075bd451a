use core::sync::atomic::{AtomicU64, Ordering};
use std::{
    collections::BTreeMap,
    sync::{Arc, Weak},
};

use alice_sh_common::StateChange;
use parking_lot::Mutex;

pub(crate) type Listener = Arc<dyn Fn(&StateChange) + Send + Sync>;

/// Delivers remote-originated state changes to the handlers of one device.
///
/// Delivery is synchronous and in emission order. Listeners are detached by dropping the
/// [`Subscription`] returned from [`Relay::subscribe`].
#[derive(Default)]
pub struct Relay {
    inner: Arc<RelayInner>,
}

#[derive(Default)]
struct RelayInner {
    next_id: AtomicU64,
    listeners: Mutex<BTreeMap<u64, Listener>>,
}

impl Relay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &self,
        listener: impl Fn(&StateChange) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners.lock().insert(id, Arc::new(listener));

        tracing::trace!(id, "Relay listener attached");

        Subscription { id, relay: Arc::downgrade(&self.inner) }
    }

    /// Calls every listener attached at the time of the call, returning how many were reached.
    ///
    /// A listener released while the emission is in progress is skipped.
    pub fn emit(&self, change: &StateChange) -> usize {
        let ids = self.inner.listeners.lock().keys().copied().collect::<Vec<_>>();

        let mut delivered = 0;
        for id in ids {
            // not holding the lock while calling out, listeners may subscribe or unsubscribe
            let listener = self.inner.listeners.lock().get(&id).cloned();
            if let Some(listener) = listener {
                listener(change);
                delivered += 1;
            }
        }

        delivered
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }
}

/// Keeps a relay listener attached for as long as it is alive.
#[must_use = "dropping a subscription detaches the listener immediately"]
pub struct Subscription {
    id: u64,
    relay: Weak<RelayInner>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(relay) = self.relay.upgrade() {
            // dropped after the lock is released
            let listener = relay.listeners.lock().remove(&self.id);
            drop(listener);
            tracing::trace!(id = self.id, "Relay listener detached");
        }
    }
}

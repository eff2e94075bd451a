use std::sync::Arc;

use alice_sh_common::{StateChange, StateKey, StateValue};

use crate::{Device, Error, Result, SyncError};

/// Result of a local state change that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The candidate equals the committed value, nothing was pushed
    Unchanged,
    /// The remote platform accepted the candidate
    Committed,
}

impl Device {
    /// Applies a locally originated value: validate, set speculatively, push, then commit or
    /// roll back.
    ///
    /// Attempts for the same descriptor run one at a time.
    pub async fn set_state(&self, key: &StateKey, candidate: StateValue) -> Result<Outcome> {
        self.validate(key, &candidate)?;

        let lock = self.outbound_lock(key);
        let _guard = lock.lock().await;

        let owner = {
            let mut registry = self.registry.write();
            let Some(owner) = registry.owner(key).cloned() else {
                return Err(Error::UnknownDescriptor(key.clone()));
            };

            if registry.committed(key) == Some(&candidate) {
                tracing::trace!(device = %self.id(), %key, "Value unchanged, not pushing");
                return Ok(Outcome::Unchanged);
            }

            registry.update_local_state(key, Some(candidate.clone()));
            owner
        };

        tracing::debug!(device = %self.id(), %key, value = %candidate, "Pushing state");

        // The descriptor may be removed or handed to another owner while the push is in
        // flight. Only the owner that started the attempt may commit or revert it.
        match self.push_state().await {
            Ok(()) => {
                let committed =
                    self.registry.write().commit_owned(key, &owner, candidate.clone());
                if committed {
                    self.cache.set(&key.cache_key(&owner), candidate);
                } else {
                    tracing::debug!(
                        device = %self.id(),
                        %key,
                        %owner,
                        "Descriptor removed or replaced during push",
                    );
                }
                Ok(Outcome::Committed)
            }
            Err(err) => {
                // restores whatever is committed now, which includes remote changes that
                // landed during the push
                let rolled_back = self.registry.write().revert_owned(key, &owner, &candidate);

                tracing::warn!(
                    device = %self.id(),
                    %key,
                    value = %candidate,
                    rolled_back,
                    "Failed to push state: {err}",
                );

                Err(err)
            }
        }
    }

    /// Applies a change received from the remote platform.
    ///
    /// Returns false if no matching descriptor is registered.
    pub fn apply_remote(self: &Arc<Self>, change: &StateChange) -> bool {
        let key = change.key();

        let (owner, reportable) = {
            let mut registry = self.registry.write();
            let Some(reportable) = registry.get(&key).map(|d| d.reportable) else {
                tracing::debug!(
                    device = %self.id(),
                    %key,
                    "Ignoring change for unknown descriptor",
                );
                return false;
            };
            let Some(owner) = registry.commit(&key, change.value().clone()) else {
                return false;
            };
            (owner, reportable)
        };

        tracing::debug!(
            device = %self.id(),
            %key,
            value = %change.value(),
            "Applied remote change",
        );

        self.cache.set(&key.cache_key(&owner), change.value().clone());
        self.relay.emit(change);

        if reportable {
            self.confirm();
        }

        true
    }

    /// Pushes the full descriptor set.
    pub async fn push_device_info(&self) -> Result<()> {
        let info = self.info();
        self.bounded(self.remote.push_device_info(&info)).await
    }

    /// Pushes the current state of every descriptor.
    pub async fn push_state(&self) -> Result<()> {
        let state = self.state();
        self.bounded(self.remote.push_state(&state)).await
    }

    fn validate(&self, key: &StateKey, candidate: &StateValue) -> Result<()> {
        let registry = self.registry.read();
        let descriptor = registry.get(key).ok_or_else(|| Error::UnknownDescriptor(key.clone()))?;
        descriptor.parameters.validate(&key.instance, candidate)?;
        Ok(())
    }

    async fn bounded(
        &self,
        push: impl Future<Output = core::result::Result<(), SyncError>>,
    ) -> Result<()> {
        let timeout = self.options.push_timeout;
        match tokio::time::timeout(timeout, push).await {
            Ok(res) => res.map_err(Error::Sync),
            Err(_) => Err(Error::Sync(SyncError::Timeout(timeout))),
        }
    }

    // Fire and forget; the outcome is only logged.
    fn confirm(self: &Arc<Self>) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(device = %self.id(), "No async runtime, skipping confirmation push");
            return;
        };

        let device = Arc::clone(self);
        handle.spawn(async move {
            if let Err(err) = device.push_state().await {
                tracing::warn!(device = %device.id(), "Failed to confirm remote change: {err}");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use core::time::Duration;

    use alice_sh_common::{
        Descriptor, DescriptorState, DescriptorType, Hsv, NodeId, Parameters,
        capabilities::color_setting::{ColorModel, ColorSettingParameters},
        device::DeviceConfig,
        properties::event::{EventParameters, EventValue},
    };

    use super::*;
    use crate::{DeviceOptions, MemoryCache, StateCache, testing::ScriptedRemote};

    fn hsv_descriptor() -> Descriptor {
        Descriptor {
            kind: DescriptorType::ColorSetting,
            retrievable: true,
            reportable: false,
            parameters: Parameters::ColorSetting(ColorSettingParameters {
                color_model: Some(ColorModel::Hsv),
                ..Default::default()
            }),
            state: DescriptorState { instance: "hsv".into(), value: Some(Hsv::default().into()) },
        }
    }

    fn event_descriptor() -> Descriptor {
        Descriptor {
            kind: DescriptorType::Event,
            retrievable: true,
            reportable: true,
            parameters: Parameters::Event(EventParameters {
                instance: "X".into(),
                events: vec![
                    EventValue { value: "open".into() },
                    EventValue { value: "close".into() },
                ],
            }),
            state: DescriptorState { instance: "X".into(), value: None },
        }
    }

    fn setup(remote: &Arc<ScriptedRemote>) -> (Arc<Device>, Arc<MemoryCache>) {
        let cache = Arc::new(MemoryCache::default());
        let device = Device::with_options(
            DeviceConfig::new("lamp", "Lamp"),
            cache.clone(),
            remote.clone(),
            DeviceOptions { push_timeout: Duration::from_millis(100) },
        );
        (device, cache)
    }

    #[tokio::test]
    async fn commit_writes_cache() {
        let remote = Arc::new(ScriptedRemote::default());
        let (device, cache) = setup(&remote);
        let owner = NodeId::from("n1");
        let key = hsv_descriptor().key();
        device.register(&owner, hsv_descriptor()).unwrap();

        let value = StateValue::Hsv(Hsv::new(120, 50, 80));
        assert_eq!(device.set_state(&key, value.clone()).await.unwrap(), Outcome::Committed);

        assert_eq!(device.value(&key), Some(value.clone()));
        assert_eq!(device.committed_value(&key), Some(value.clone()));
        assert_eq!(cache.get(&key.cache_key(&owner)), Some(value.clone()));
        assert_eq!(remote.state_pushes(), 1);

        let pushed = remote.last_state().unwrap();
        assert_eq!(pushed.find(&key).map(|c| c.value()), Some(&value));
    }

    #[tokio::test]
    async fn equal_candidate_is_not_pushed() {
        let remote = Arc::new(ScriptedRemote::default());
        let (device, _) = setup(&remote);
        let key = hsv_descriptor().key();
        device.register(&"n1".into(), hsv_descriptor()).unwrap();

        let outcome = device.set_state(&key, Hsv::default().into()).await.unwrap();
        assert_eq!(outcome, Outcome::Unchanged);
        assert_eq!(remote.state_pushes(), 0);
    }

    #[tokio::test]
    async fn failed_push_rolls_back() {
        let remote = Arc::new(ScriptedRemote::default());
        let (device, cache) = setup(&remote);
        let key = hsv_descriptor().key();
        device.register(&"n1".into(), hsv_descriptor()).unwrap();

        remote.fail_with(SyncError::Network("connection refused".into()));
        let res = device.set_state(&key, Hsv::new(120, 50, 80).into()).await;

        assert!(matches!(res, Err(Error::Sync(SyncError::Network(_)))));
        assert_eq!(device.value(&key), Some(StateValue::Hsv(Hsv::default())));
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_push_times_out() {
        let remote = Arc::new(ScriptedRemote::default());
        let (device, _) = setup(&remote);
        let key = hsv_descriptor().key();
        device.register(&"n1".into(), hsv_descriptor()).unwrap();

        remote.stall();
        let res = device.set_state(&key, Hsv::new(1, 1, 1).into()).await;

        assert!(matches!(res, Err(Error::Sync(SyncError::Timeout(_)))));
        assert_eq!(device.value(&key), Some(StateValue::Hsv(Hsv::default())));
    }

    #[tokio::test]
    async fn invalid_candidate_is_rejected() {
        let remote = Arc::new(ScriptedRemote::default());
        let (device, _) = setup(&remote);
        let key = event_descriptor().key();
        device.register(&"n1".into(), event_descriptor()).unwrap();

        let res = device.set_state(&key, "unknown".into()).await;
        assert!(matches!(res, Err(Error::Validation(_))));
        assert_eq!(device.value(&key), None);
        assert_eq!(remote.state_pushes(), 0);

        let missing = StateKey::new(DescriptorType::OnOff, "on");
        assert!(matches!(
            device.set_state(&missing, true.into()).await,
            Err(Error::UnknownDescriptor(_))
        ));
    }

    #[tokio::test]
    async fn remote_change_is_applied_and_confirmed() {
        let remote = Arc::new(ScriptedRemote::default());
        let (device, cache) = setup(&remote);
        let owner = NodeId::from("n1");
        let key = event_descriptor().key();
        device.register(&owner, event_descriptor()).unwrap();

        let change = StateChange::new(DescriptorType::Event, "X", "close".into());
        assert!(device.apply_remote(&change));

        assert_eq!(device.value(&key), Some(StateValue::text("close")));
        assert_eq!(cache.get(&key.cache_key(&owner)), Some(StateValue::text("close")));

        crate::testing::settle().await;
        assert_eq!(remote.state_pushes(), 1);

        let unknown = StateChange::new(DescriptorType::Event, "Y", "close".into());
        assert!(!device.apply_remote(&unknown));
    }

    #[tokio::test]
    async fn push_after_removal_does_not_commit() {
        let remote = Arc::new(ScriptedRemote::default());
        let (device, cache) = setup(&remote);
        let owner = NodeId::from("n1");
        let key = hsv_descriptor().key();
        device.register(&owner, hsv_descriptor()).unwrap();

        let gate = remote.hold();
        let push = tokio::spawn({
            let device = device.clone();
            let key = key.clone();
            async move { device.set_state(&key, Hsv::new(5, 5, 5).into()).await }
        });
        crate::testing::settle().await;

        device.unregister(&key, &owner);
        gate.release();

        assert_eq!(push.await.unwrap().unwrap(), Outcome::Committed);
        assert!(cache.is_empty());
        assert!(device.descriptor(&key).is_none());
    }

    #[tokio::test]
    async fn remote_change_during_failed_push_is_kept() {
        let remote = Arc::new(ScriptedRemote::default());
        let (device, cache) = setup(&remote);
        let owner = NodeId::from("n1");
        let key = hsv_descriptor().key();
        device.register(&owner, hsv_descriptor()).unwrap();

        let value = StateValue::Hsv(Hsv::new(120, 50, 80));
        let gate = remote.hold();
        let push = tokio::spawn({
            let (device, key, value) = (device.clone(), key.clone(), value.clone());
            async move { device.set_state(&key, value).await }
        });
        crate::testing::settle().await;

        // the platform reports the same value while the push is still out, then the push fails
        let change = StateChange::new(DescriptorType::ColorSetting, "hsv", value.clone());
        assert!(device.apply_remote(&change));
        remote.fail_with(SyncError::Network("connection reset".into()));
        gate.release();

        assert!(push.await.unwrap().is_err());
        assert_eq!(device.value(&key), Some(value.clone()));
        assert_eq!(device.committed_value(&key), Some(value.clone()));
        assert_eq!(cache.get(&key.cache_key(&owner)), Some(value.clone()));
        assert_eq!(device.set_state(&key, value).await.unwrap(), Outcome::Unchanged);
    }

    #[tokio::test]
    async fn replacement_owner_waits_for_stale_push() {
        let remote = Arc::new(ScriptedRemote::default());
        let (device, cache) = setup(&remote);
        let (old, new) = (NodeId::from("old"), NodeId::from("new"));
        let key = hsv_descriptor().key();
        device.register(&old, hsv_descriptor()).unwrap();

        let gate = remote.hold();
        let stale = tokio::spawn({
            let (device, key) = (device.clone(), key.clone());
            async move { device.set_state(&key, Hsv::new(5, 5, 5).into()).await }
        });
        crate::testing::settle().await;

        device.unregister(&key, &old);
        device.register(&new, hsv_descriptor()).unwrap();
        let fresh = tokio::spawn({
            let (device, key) = (device.clone(), key.clone());
            async move { device.set_state(&key, Hsv::new(7, 7, 7).into()).await }
        });
        crate::testing::settle().await;

        // queued behind the stale attempt
        assert_eq!(remote.state_pushes(), 1);
        assert_eq!(device.value(&key), Some(StateValue::Hsv(Hsv::default())));

        gate.release();
        assert_eq!(stale.await.unwrap().unwrap(), Outcome::Committed);
        assert_eq!(fresh.await.unwrap().unwrap(), Outcome::Committed);

        assert_eq!(remote.state_pushes(), 2);
        assert_eq!(device.committed_value(&key), Some(StateValue::Hsv(Hsv::new(7, 7, 7))));
        assert_eq!(cache.get(&key.cache_key(&old)), None);
        assert_eq!(cache.get(&key.cache_key(&new)), Some(StateValue::Hsv(Hsv::new(7, 7, 7))));
    }

    #[tokio::test]
    async fn stale_failure_leaves_replacement_untouched() {
        let remote = Arc::new(ScriptedRemote::default());
        let (device, _) = setup(&remote);
        let (old, new) = (NodeId::from("old"), NodeId::from("new"));
        let key = hsv_descriptor().key();
        device.register(&old, hsv_descriptor()).unwrap();

        let gate = remote.hold();
        let stale = tokio::spawn({
            let (device, key) = (device.clone(), key.clone());
            async move { device.set_state(&key, Hsv::new(5, 5, 5).into()).await }
        });
        crate::testing::settle().await;

        device.unregister(&key, &old);
        let mut replacement = hsv_descriptor();
        replacement.state.value = Some(Hsv::new(5, 5, 5).into());
        device.register(&new, replacement).unwrap();

        remote.fail_with(SyncError::Network("connection reset".into()));
        gate.release();

        assert!(stale.await.unwrap().is_err());
        assert_eq!(device.value(&key), Some(StateValue::Hsv(Hsv::new(5, 5, 5))));
        assert_eq!(device.committed_value(&key), Some(StateValue::Hsv(Hsv::new(5, 5, 5))));
    }
}

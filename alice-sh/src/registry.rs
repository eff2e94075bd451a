use std::collections::{BTreeMap, btree_map::Entry as MapEntry};

use alice_sh_common::{Descriptor, DescriptorInfo, NodeId, StateChange, StateKey, StateValue};

use crate::{Error, Result};

/// The descriptors of one device, keyed by `(type, instance)`.
///
/// Pure bookkeeping; the registry never performs I/O.
#[derive(Default)]
pub struct Registry {
    entries: BTreeMap<StateKey, Entry>,
}

struct Entry {
    owner: NodeId,
    descriptor: Descriptor,
    /// Last value confirmed with the remote platform (or seeded at registration)
    committed: Option<StateValue>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `descriptor` on behalf of `owner`, replacing any descriptor with the same
    /// key. Returns the replaced descriptor.
    pub fn set_descriptor(
        &mut self,
        owner: NodeId,
        descriptor: Descriptor,
    ) -> Result<Option<Descriptor>> {
        if descriptor.parameters.descriptor_type() != descriptor.kind {
            return Err(Error::Configuration(format!(
                "{} parameters given for a {} descriptor",
                descriptor.parameters.descriptor_type(),
                descriptor.kind,
            )));
        }

        if !descriptor.parameters.supports(&descriptor.state.instance) {
            return Err(Error::Configuration(format!(
                "{} does not enable instance {:?}",
                descriptor.kind, descriptor.state.instance,
            )));
        }

        let committed = descriptor.state.value.clone();
        let entry = Entry { owner, descriptor, committed };

        Ok(match self.entries.entry(entry.descriptor.key()) {
            MapEntry::Occupied(mut slot) => {
                let previous = core::mem::replace(slot.get_mut(), entry);
                Some(previous.descriptor)
            }
            MapEntry::Vacant(slot) => {
                slot.insert(entry);
                None
            }
        })
    }

    /// Removes a descriptor. Unknown keys are ignored.
    pub fn remove_descriptor(&mut self, key: &StateKey) -> Option<Descriptor> {
        self.entries.remove(key).map(|e| e.descriptor)
    }

    /// Removes a descriptor only if it is still registered by `owner`.
    pub fn remove_owned(&mut self, key: &StateKey, owner: &NodeId) -> Option<Descriptor> {
        match self.entries.get(key) {
            Some(entry) if &entry.owner == owner => self.remove_descriptor(key),
            _ => None,
        }
    }

    /// Sets the visible state of a descriptor without touching its committed value.
    /// Returns false if no such descriptor exists.
    pub fn update_local_state(&mut self, key: &StateKey, value: Option<StateValue>) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.descriptor.state.value = value;
                true
            }
            None => false,
        }
    }

    /// Marks `value` as confirmed and makes it the visible state. Returns the owner of the
    /// descriptor so the caller can derive its cache key.
    pub fn commit(&mut self, key: &StateKey, value: StateValue) -> Option<NodeId> {
        let entry = self.entries.get_mut(key)?;
        entry.descriptor.state.value = Some(value.clone());
        entry.committed = Some(value);
        Some(entry.owner.clone())
    }

    /// Like [`Registry::commit`], but only while `owner` still holds the descriptor.
    pub fn commit_owned(&mut self, key: &StateKey, owner: &NodeId, value: StateValue) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) if &entry.owner == owner => {
                entry.descriptor.state.value = Some(value.clone());
                entry.committed = Some(value);
                true
            }
            _ => false,
        }
    }

    /// Makes the committed value visible again, provided `owner` still holds the descriptor
    /// and the visible value is still `candidate`.
    pub fn revert_owned(&mut self, key: &StateKey, owner: &NodeId, candidate: &StateValue) -> bool {
        match self.entries.get_mut(key) {
            Some(entry)
                if &entry.owner == owner
                    && entry.descriptor.state.value.as_ref() == Some(candidate) =>
            {
                entry.descriptor.state.value = entry.committed.clone();
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, key: &StateKey) -> Option<&Descriptor> {
        self.entries.get(key).map(|e| &e.descriptor)
    }

    pub fn value(&self, key: &StateKey) -> Option<&StateValue> {
        self.get(key)?.state.value.as_ref()
    }

    pub fn committed(&self, key: &StateKey) -> Option<&StateValue> {
        self.entries.get(key)?.committed.as_ref()
    }

    pub fn owner(&self, key: &StateKey) -> Option<&NodeId> {
        self.entries.get(key).map(|e| &e.owner)
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &Descriptor> {
        self.entries.values().map(|e| &e.descriptor)
    }

    /// Capability and property definitions, in that order, as announced upstream.
    pub fn serialize_all(&self) -> (Vec<DescriptorInfo>, Vec<DescriptorInfo>) {
        self.descriptors()
            .map(Descriptor::info)
            .partition(|info| !info.kind.is_property())
    }

    /// Current capability and property states. Descriptors without a value are skipped.
    pub fn serialize_states(&self) -> (Vec<StateChange>, Vec<StateChange>) {
        self.serialize_states_where(|_| true)
    }

    pub(crate) fn serialize_states_where(
        &self,
        filter: impl Fn(&Descriptor) -> bool,
    ) -> (Vec<StateChange>, Vec<StateChange>) {
        self.descriptors()
            .filter(|d| filter(d))
            .filter_map(Descriptor::report)
            .partition(|change| !change.kind.is_property())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

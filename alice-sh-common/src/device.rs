//! Payloads pushed to the remote platform

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::{DescriptorInfo, DeviceId, StateChange, StateKey};

pub const DEFAULT_DEVICE_TYPE: &str = "devices.types.other";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub id: DeviceId,
    pub name: CompactString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<CompactString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<CompactString>,
    #[serde(rename = "type", default = "default_device_type")]
    pub device_type: CompactString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<CompactString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<CompactString>,
}

fn default_device_type() -> CompactString {
    CompactString::const_new(DEFAULT_DEVICE_TYPE)
}

impl DeviceConfig {
    pub fn new(id: impl Into<DeviceId>, name: impl Into<CompactString>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            room: None,
            device_type: default_device_type(),
            manufacturer: None,
            model: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceInfo {
    pub id: DeviceId,
    pub name: CompactString,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<CompactString>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<CompactString>,
    #[serde(rename = "type")]
    pub device_type: CompactString,
    pub capabilities: Vec<DescriptorInfo>,
    pub properties: Vec<DescriptorInfo>,
    pub device_info: Manufacturer,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Manufacturer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<CompactString>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<CompactString>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceState {
    pub id: DeviceId,
    pub capabilities: Vec<StateChange>,
    pub properties: Vec<StateChange>,
}

impl DeviceState {
    pub fn find(&self, key: &StateKey) -> Option<&StateChange> {
        let list = if key.kind.is_property() { &self.properties } else { &self.capabilities };
        list.iter().find(|c| c.kind == key.kind && c.state.instance == key.instance)
    }
}

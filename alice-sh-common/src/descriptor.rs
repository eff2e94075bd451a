use core::fmt::{self, Display};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::{DescriptorType, NodeId, Parameters, StateValue};

/// Identifies a descriptor within a device.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateKey {
    pub kind: DescriptorType,
    pub instance: CompactString,
}

impl StateKey {
    pub fn new(kind: DescriptorType, instance: impl Into<CompactString>) -> Self {
        Self { kind, instance: instance.into() }
    }

    /// Key of this descriptor's entry in the shared value cache.
    pub fn cache_key(&self, owner: &NodeId) -> String {
        format!("{owner}-{}-{}", self.kind, self.instance)
    }
}

impl Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.instance)
    }
}

/// Registered definition of a capability or property: static parameters plus current state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Descriptor {
    #[serde(rename = "type")]
    pub kind: DescriptorType,
    pub retrievable: bool,
    pub reportable: bool,
    pub parameters: Parameters,
    pub state: DescriptorState,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptorState {
    pub instance: CompactString,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<StateValue>,
}

impl Descriptor {
    pub fn key(&self) -> StateKey {
        StateKey::new(self.kind, self.state.instance.clone())
    }

    pub fn info(&self) -> DescriptorInfo {
        DescriptorInfo {
            kind: self.kind,
            retrievable: self.retrievable,
            reportable: self.reportable,
            parameters: self.parameters.clone(),
        }
    }

    /// Current state as reported upstream, if there is a value yet.
    pub fn report(&self) -> Option<StateChange> {
        let value = self.state.value.clone()?;
        Some(StateChange::new(self.kind, self.state.instance.clone(), value))
    }
}

/// Descriptor without state, as announced in the device info.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptorInfo {
    #[serde(rename = "type")]
    pub kind: DescriptorType,
    pub retrievable: bool,
    pub reportable: bool,
    pub parameters: Parameters,
}

/// A `(type, instance, value)` triple, either reported upstream or received from the remote
/// platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateChange {
    #[serde(rename = "type")]
    pub kind: DescriptorType,
    pub state: InstanceState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceState {
    pub instance: CompactString,
    pub value: StateValue,
}

impl StateChange {
    pub fn new(
        kind: DescriptorType,
        instance: impl Into<CompactString>,
        value: StateValue,
    ) -> Self {
        Self { kind, state: InstanceState { instance: instance.into(), value } }
    }

    pub fn key(&self) -> StateKey {
        StateKey::new(self.kind, self.state.instance.clone())
    }

    pub fn instance(&self) -> &str {
        &self.state.instance
    }

    pub fn value(&self) -> &StateValue {
        &self.state.value
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        Hsv,
        capabilities::color_setting::{ColorModel, ColorSettingParameters},
    };

    #[test]
    fn cache_key_format() {
        let key = StateKey::new(DescriptorType::Event, "X");
        assert_eq!(key.cache_key(&NodeId::from("a1b2")), "a1b2-devices.properties.event-X");
    }

    #[test]
    fn descriptor_format() {
        let descriptor = Descriptor {
            kind: DescriptorType::ColorSetting,
            retrievable: true,
            reportable: false,
            parameters: Parameters::ColorSetting(ColorSettingParameters {
                color_model: Some(ColorModel::Hsv),
                ..Default::default()
            }),
            state: DescriptorState {
                instance: "hsv".into(),
                value: Some(Hsv::new(0, 0, 0).into()),
            },
        };

        assert_eq!(
            serde_json::to_value(&descriptor).unwrap(),
            json!({
                "type": "devices.capabilities.color_setting",
                "retrievable": true,
                "reportable": false,
                "parameters": { "color_model": "hsv" },
                "state": { "instance": "hsv", "value": { "h": 0, "s": 0, "v": 0 } },
            })
        );

        assert_eq!(
            serde_json::to_value(descriptor.info()).unwrap(),
            json!({
                "type": "devices.capabilities.color_setting",
                "retrievable": true,
                "reportable": false,
                "parameters": { "color_model": "hsv" },
            })
        );
    }

    #[test]
    fn state_change_serde() {
        let change: StateChange = serde_json::from_value(json!({
            "type": "devices.properties.event",
            "state": { "instance": "X", "value": "close" },
        }))
        .unwrap();

        assert_eq!(change, StateChange::new(DescriptorType::Event, "X", StateValue::text("close")));
        assert_eq!(change.key(), StateKey::new(DescriptorType::Event, "X"));
    }
}

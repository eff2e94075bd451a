use core::{
    fmt::{self, Display},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::{StateValue, ValidationError, properties::event::EventParameters};

pub mod color_setting;
pub mod on_off;
pub mod range;

use self::{color_setting::ColorSettingParameters, on_off::OnOffParameters, range::RangeParameters};

pub mod ids {
    pub const ON_OFF: &str = "devices.capabilities.on_off";
    pub const COLOR_SETTING: &str = "devices.capabilities.color_setting";
    pub const MODE: &str = "devices.capabilities.mode";
    pub const RANGE: &str = "devices.capabilities.range";
    pub const TOGGLE: &str = "devices.capabilities.toggle";

    pub const FLOAT: &str = "devices.properties.float";
    pub const EVENT: &str = "devices.properties.event";
}

/// Category of a descriptor. Capabilities can be controlled, properties are only observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DescriptorType {
    #[serde(rename = "devices.capabilities.on_off")]
    OnOff,
    #[serde(rename = "devices.capabilities.color_setting")]
    ColorSetting,
    #[serde(rename = "devices.capabilities.mode")]
    Mode,
    #[serde(rename = "devices.capabilities.range")]
    Range,
    #[serde(rename = "devices.capabilities.toggle")]
    Toggle,
    #[serde(rename = "devices.properties.float")]
    Float,
    #[serde(rename = "devices.properties.event")]
    Event,
}

impl DescriptorType {
    pub const fn as_str(self) -> &'static str {
        match self {
            DescriptorType::OnOff => ids::ON_OFF,
            DescriptorType::ColorSetting => ids::COLOR_SETTING,
            DescriptorType::Mode => ids::MODE,
            DescriptorType::Range => ids::RANGE,
            DescriptorType::Toggle => ids::TOGGLE,
            DescriptorType::Float => ids::FLOAT,
            DescriptorType::Event => ids::EVENT,
        }
    }

    pub const fn is_property(self) -> bool {
        matches!(self, DescriptorType::Float | DescriptorType::Event)
    }
}

impl Display for DescriptorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DescriptorType {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            ids::ON_OFF => DescriptorType::OnOff,
            ids::COLOR_SETTING => DescriptorType::ColorSetting,
            ids::MODE => DescriptorType::Mode,
            ids::RANGE => DescriptorType::Range,
            ids::TOGGLE => DescriptorType::Toggle,
            ids::FLOAT => DescriptorType::Float,
            ids::EVENT => DescriptorType::Event,
            _ => return Err("unknown capability or property type"),
        })
    }
}

/// Legal value domain of a descriptor. Serialized as the bare `parameters` object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Parameters {
    OnOff(OnOffParameters),
    ColorSetting(ColorSettingParameters),
    Range(RangeParameters),
    Event(EventParameters),
}

impl Parameters {
    pub fn descriptor_type(&self) -> DescriptorType {
        match self {
            Parameters::OnOff(_) => DescriptorType::OnOff,
            Parameters::ColorSetting(_) => DescriptorType::ColorSetting,
            Parameters::Range(_) => DescriptorType::Range,
            Parameters::Event(_) => DescriptorType::Event,
        }
    }

    /// Whether `instance` is a mode these parameters actually enable.
    pub fn supports(&self, instance: &str) -> bool {
        match self {
            Parameters::OnOff(_) => instance == on_off::INSTANCE,
            Parameters::ColorSetting(p) => p.supports(instance),
            Parameters::Range(p) => p.instance == instance,
            Parameters::Event(p) => p.instance == instance,
        }
    }

    pub fn validate(&self, instance: &str, value: &StateValue) -> Result<(), ValidationError> {
        if !self.supports(instance) {
            return Err(ValidationError::UnknownInstance(instance.into()));
        }

        match self {
            Parameters::OnOff(_) => match value {
                StateValue::Bool(_) => Ok(()),
                other => Err(wrong_type(instance, "bool", other)),
            },
            Parameters::ColorSetting(p) => p.validate(instance, value),
            Parameters::Range(p) => p.validate(value),
            Parameters::Event(p) => p.validate(value),
        }
    }
}

pub(crate) fn wrong_type(
    instance: &str,
    expected: &'static str,
    got: &StateValue,
) -> ValidationError {
    ValidationError::WrongType { instance: instance.into(), expected, got: got.kind_name() }
}

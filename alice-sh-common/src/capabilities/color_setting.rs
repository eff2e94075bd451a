//! Light color, color temperature and preset scenes
//!
//! Several modes may be enabled at once; each one contributes to the parameters, and the
//! descriptor's instance names the mode its state is currently in.
//!
//! ```plain
//! { "type": "devices.capabilities.color_setting",
//!   "parameters": { "color_model": "hsv", "temperature_k": { "min": 2700, "max": 6500 } },
//!   "state": { "instance": "temperature_k", "value": 4500 } }
//! ```

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use super::wrong_type;
use crate::{Hsv, StateValue, ValidationError};

pub const HSV: &str = "hsv";
pub const RGB: &str = "rgb";
pub const TEMPERATURE_K: &str = "temperature_k";
pub const SCENE: &str = "scene";

pub const DEFAULT_TEMPERATURE_K: f64 = 4500.0;
const RGB_MAX: f64 = 0xFF_FFFF as f64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorModel {
    Hsv,
    Rgb,
}

impl ColorModel {
    pub const fn instance(self) -> &'static str {
        match self {
            ColorModel::Hsv => HSV,
            ColorModel::Rgb => RGB,
        }
    }

    pub fn default_value(self) -> StateValue {
        match self {
            ColorModel::Hsv => StateValue::Hsv(Hsv::default()),
            ColorModel::Rgb => StateValue::Number(0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureRange {
    pub min: u32,
    pub max: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: CompactString,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorScenes {
    pub scenes: Vec<Scene>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColorSettingParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_model: Option<ColorModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_k: Option<TemperatureRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_scene: Option<ColorScenes>,
}

impl ColorSettingParameters {
    pub fn is_empty(&self) -> bool {
        self.color_model.is_none() && self.temperature_k.is_none() && self.color_scene.is_none()
    }

    pub fn supports(&self, instance: &str) -> bool {
        match instance {
            HSV => self.color_model == Some(ColorModel::Hsv),
            RGB => self.color_model == Some(ColorModel::Rgb),
            TEMPERATURE_K => self.temperature_k.is_some(),
            SCENE => self.color_scene.is_some(),
            _ => false,
        }
    }

    /// The mode a freshly registered descriptor starts in, with its default value.
    ///
    /// When several modes are enabled the last one wins, in the order color model,
    /// temperature, scene.
    pub fn active_instance(&self) -> Option<(&'static str, StateValue)> {
        if let Some(scenes) = &self.color_scene
            && let Some(first) = scenes.scenes.first()
        {
            return Some((SCENE, StateValue::Text(first.id.clone())));
        }

        if self.temperature_k.is_some() {
            return Some((TEMPERATURE_K, StateValue::Number(DEFAULT_TEMPERATURE_K)));
        }

        self.color_model.map(|model| (model.instance(), model.default_value()))
    }

    pub fn validate(&self, instance: &str, value: &StateValue) -> Result<(), ValidationError> {
        match (instance, value) {
            (HSV, StateValue::Hsv(Hsv { h, s, v })) => {
                if *h > 360 {
                    return Err(ValidationError::OutOfRange {
                        value: *h as f64,
                        min: 0.0,
                        max: 360.0,
                    });
                }
                for c in [*s, *v] {
                    if c > 100 {
                        return Err(ValidationError::OutOfRange {
                            value: c as f64,
                            min: 0.0,
                            max: 100.0,
                        });
                    }
                }
                Ok(())
            }
            (HSV, other) => Err(wrong_type(instance, "hsv", other)),
            (RGB, StateValue::Number(n)) => {
                if n.fract() != 0.0 || !(0.0..=RGB_MAX).contains(n) {
                    return Err(ValidationError::OutOfRange { value: *n, min: 0.0, max: RGB_MAX });
                }
                Ok(())
            }
            (RGB, other) => Err(wrong_type(instance, "number", other)),
            (TEMPERATURE_K, StateValue::Number(n)) => {
                let range = self
                    .temperature_k
                    .ok_or_else(|| ValidationError::UnknownInstance(instance.into()))?;
                let (min, max) = (range.min as f64, range.max as f64);
                if !(min..=max).contains(n) {
                    return Err(ValidationError::OutOfRange { value: *n, min, max });
                }
                Ok(())
            }
            (TEMPERATURE_K, other) => Err(wrong_type(instance, "number", other)),
            (SCENE, StateValue::Text(id)) => {
                let allowed = self
                    .color_scene
                    .as_ref()
                    .is_some_and(|s| s.scenes.iter().any(|scene| &scene.id == id));
                if !allowed {
                    return Err(ValidationError::NotAllowed { value: id.clone() });
                }
                Ok(())
            }
            (SCENE, other) => Err(wrong_type(instance, "string", other)),
            _ => Err(ValidationError::UnknownInstance(instance.into())),
        }
    }
}

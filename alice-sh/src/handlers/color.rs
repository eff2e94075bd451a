use alice_sh_common::{
    DescriptorType, Parameters,
    capabilities::color_setting::{
        ColorModel, ColorScenes, ColorSettingParameters, Scene, TemperatureRange,
    },
};
use compact_str::CompactString;
use serde::Deserialize;

use super::{HandlerConfig, Template, lenient_u32};
use crate::{Error, Result};

pub const DEFAULT_TEMPERATURE_MIN: u32 = 2700;
pub const DEFAULT_TEMPERATURE_MAX: u32 = 6500;

/// Color setting handler: color model, color temperature and scenes, each optional.
#[derive(Debug, Clone, Deserialize)]
pub struct ColorConfig {
    /// Report remote changes back to the platform
    #[serde(default)]
    pub response: bool,
    #[serde(default)]
    pub color_support: bool,
    #[serde(default = "default_scheme")]
    pub scheme: ColorModel,
    #[serde(default)]
    pub temperature_k: bool,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub temperature_min: Option<u32>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub temperature_max: Option<u32>,
    #[serde(default)]
    pub color_scene: Vec<CompactString>,
}

fn default_scheme() -> ColorModel {
    ColorModel::Hsv
}

impl HandlerConfig for ColorConfig {
    fn template(&self) -> Result<Template> {
        if !self.color_support && !self.temperature_k && self.color_scene.is_empty() {
            return Err(Error::Configuration("at least one parameter must be enabled".into()));
        }

        let temperature_k = if self.temperature_k {
            let min = self.temperature_min.unwrap_or(DEFAULT_TEMPERATURE_MIN);
            let max = self.temperature_max.unwrap_or(DEFAULT_TEMPERATURE_MAX);
            if min >= max {
                return Err(Error::Configuration(format!(
                    "temperature range {min}..{max} is empty"
                )));
            }
            Some(TemperatureRange { min, max })
        } else {
            None
        };

        let parameters = ColorSettingParameters {
            color_model: self.color_support.then_some(self.scheme),
            temperature_k,
            color_scene: (!self.color_scene.is_empty()).then(|| ColorScenes {
                scenes: self.color_scene.iter().map(|id| Scene { id: id.clone() }).collect(),
            }),
        };

        let (instance, default) = parameters
            .active_instance()
            .ok_or_else(|| Error::Configuration("no color mode enabled".into()))?;

        Ok(Template {
            kind: DescriptorType::ColorSetting,
            instance: instance.into(),
            parameters: Parameters::ColorSetting(parameters),
            retrievable: true,
            reportable: self.response,
            default: Some(default),
        })
    }
}

#[cfg(test)]
mod tests {
    use alice_sh_common::{Hsv, StateValue};
    use serde_json::json;

    use super::*;

    fn config(value: serde_json::Value) -> ColorConfig {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn requires_a_mode() {
        let res = config(json!({ "response": true })).template();
        assert!(matches!(res, Err(Error::Configuration(_))));
    }

    #[test]
    fn hsv_only() {
        let template =
            config(json!({ "color_support": true, "scheme": "hsv" })).template().unwrap();

        assert_eq!(template.instance, "hsv");
        assert_eq!(template.default, Some(StateValue::Hsv(Hsv::default())));
        assert!(!template.reportable);
        assert_eq!(
            serde_json::to_value(&template.parameters).unwrap(),
            json!({ "color_model": "hsv" })
        );
    }

    #[test]
    fn rgb_defaults_to_black() {
        let template =
            config(json!({ "color_support": true, "scheme": "rgb" })).template().unwrap();
        assert_eq!(template.instance, "rgb");
        assert_eq!(template.default, Some(StateValue::Number(0.0)));
    }

    #[test]
    fn last_enabled_mode_wins() {
        let template = config(json!({
            "color_support": true,
            "temperature_k": true,
            "temperature_min": "2000",
            "temperature_max": 9000,
        }))
        .template()
        .unwrap();

        assert_eq!(template.instance, "temperature_k");
        assert_eq!(template.default, Some(StateValue::Number(4500.0)));
        assert_eq!(
            serde_json::to_value(&template.parameters).unwrap(),
            json!({ "color_model": "hsv", "temperature_k": { "min": 2000, "max": 9000 } })
        );

        let template = config(json!({
            "color_support": true,
            "temperature_k": true,
            "color_scene": ["party", "night"],
        }))
        .template()
        .unwrap();

        assert_eq!(template.instance, "scene");
        assert_eq!(template.default, Some(StateValue::text("party")));
    }

    #[test]
    fn rejects_inverted_temperature_range() {
        let res = config(json!({
            "temperature_k": true,
            "temperature_min": 6500,
            "temperature_max": 2700,
        }))
        .template();
        assert!(matches!(res, Err(Error::Configuration(_))));

        assert!(
            serde_json::from_value::<ColorConfig>(json!({ "temperature_min": "warm" })).is_err()
        );
    }
}

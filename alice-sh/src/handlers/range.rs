use core::cmp::Ordering;

use alice_sh_common::{
    DescriptorType, Parameters, StateValue,
    capabilities::range::{Bounds, RangeParameters},
};
use compact_str::CompactString;
use serde::Deserialize;

use super::{HandlerConfig, Template};
use crate::{Error, Result};

/// Numeric range handler (brightness, volume, ...). Starts at `min` when nothing is cached.
#[derive(Debug, Clone, Deserialize)]
pub struct RangeConfig {
    pub instance: CompactString,
    #[serde(default)]
    pub unit: Option<CompactString>,
    pub min: f64,
    pub max: f64,
    #[serde(default = "default_precision")]
    pub precision: f64,
    #[serde(default = "default_random_access")]
    pub random_access: bool,
    #[serde(default)]
    pub response: bool,
}

fn default_precision() -> f64 {
    1.0
}

fn default_random_access() -> bool {
    true
}

impl HandlerConfig for RangeConfig {
    fn template(&self) -> Result<Template> {
        if self.min.partial_cmp(&self.max) != Some(Ordering::Less) {
            return Err(Error::Configuration(format!(
                "range {} must have min < max, got {}..{}",
                self.instance, self.min, self.max
            )));
        }
        if self.precision.partial_cmp(&0.0) != Some(Ordering::Greater) {
            return Err(Error::Configuration(format!(
                "range {} must have a positive precision",
                self.instance
            )));
        }

        Ok(Template {
            kind: DescriptorType::Range,
            instance: self.instance.clone(),
            parameters: Parameters::Range(RangeParameters {
                instance: self.instance.clone(),
                unit: self.unit.clone(),
                random_access: self.random_access,
                range: Bounds { min: self.min, max: self.max, precision: self.precision },
            }),
            retrievable: true,
            reportable: self.response,
            default: Some(StateValue::Number(self.min)),
        })
    }
}

use alice_sh_common::{
    DescriptorType, Parameters, StateValue,
    capabilities::on_off::{self, OnOffParameters},
};
use serde::Deserialize;

use super::{HandlerConfig, Template};
use crate::Result;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OnOffConfig {
    #[serde(default)]
    pub response: bool,
    #[serde(default)]
    pub split: bool,
}

impl HandlerConfig for OnOffConfig {
    fn template(&self) -> Result<Template> {
        Ok(Template {
            kind: DescriptorType::OnOff,
            instance: on_off::INSTANCE.into(),
            parameters: Parameters::OnOff(OnOffParameters { split: self.split }),
            retrievable: true,
            reportable: self.response,
            default: Some(StateValue::Bool(false)),
        })
    }
}

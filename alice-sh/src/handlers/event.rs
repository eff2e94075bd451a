use alice_sh_common::{
    DescriptorType, Parameters,
    properties::event::{EventParameters, EventValue},
};
use compact_str::CompactString;
use serde::Deserialize;

use super::{HandlerConfig, Template};
use crate::{Error, Result};

/// Event property handler. Events carry no default, the property stays empty until the
/// first event.
#[derive(Debug, Clone, Deserialize)]
pub struct EventConfig {
    pub instance: CompactString,
    pub events: Vec<CompactString>,
}

impl HandlerConfig for EventConfig {
    fn template(&self) -> Result<Template> {
        if self.events.is_empty() {
            return Err(Error::Configuration(format!(
                "event property {} has no events",
                self.instance
            )));
        }

        Ok(Template {
            kind: DescriptorType::Event,
            instance: self.instance.clone(),
            parameters: Parameters::Event(EventParameters {
                instance: self.instance.clone(),
                events: self
                    .events
                    .iter()
                    .map(|value| EventValue { value: value.clone() })
                    .collect(),
            }),
            retrievable: true,
            reportable: true,
            default: None,
        })
    }
}

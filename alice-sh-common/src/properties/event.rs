//! Discrete events reported by a device (door opened, button pressed, ...)
//!
//! ```plain
//! { "type": "devices.properties.event",
//!   "parameters": {
//!     "instance": "open",
//!     "events": [{ "value": "opened" }, { "value": "closed" }] },
//!   "state": { "instance": "open", "value": "closed" } }
//! ```

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::{StateValue, ValidationError, capabilities::wrong_type};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventValue {
    pub value: CompactString,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventParameters {
    pub instance: CompactString,
    pub events: Vec<EventValue>,
}

impl EventParameters {
    pub fn allows(&self, value: &str) -> bool {
        self.events.iter().any(|ev| ev.value == value)
    }

    pub fn validate(&self, value: &StateValue) -> Result<(), ValidationError> {
        match value {
            StateValue::Text(s) if self.allows(s) => Ok(()),
            StateValue::Text(s) => Err(ValidationError::NotAllowed { value: s.clone() }),
            other => Err(wrong_type(&self.instance, "string", other)),
        }
    }
}

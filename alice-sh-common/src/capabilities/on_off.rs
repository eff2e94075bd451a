//! Something that can be turned on and off
//!
//! A single `on` instance carrying a boolean.
//!
//! ```plain
//! { "type": "devices.capabilities.on_off", "parameters": { "split": false },
//!   "state": { "instance": "on", "value": true } }
//! ```

use serde::{Deserialize, Serialize};

pub const INSTANCE: &str = "on";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OnOffParameters {
    /// Separate "turn on" and "turn off" commands on the platform side
    pub split: bool,
}

use core::fmt::{self, Display};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Current value of a capability or property instance.
///
/// The variant in use is dictated by the descriptor's type and instance; see
/// [`Parameters::validate`](crate::Parameters::validate).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateValue {
    Bool(bool),
    Number(f64),
    /// Free text or a member of an enumerated set (scene id, event value, mode)
    Text(CompactString),
    Hsv(Hsv),
}

/// Hue (0-360), saturation (0-100), value (0-100)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Hsv {
    pub h: u16,
    pub s: u8,
    pub v: u8,
}

impl Hsv {
    pub const fn new(h: u16, s: u8, v: u8) -> Self {
        Self { h, s, v }
    }
}

impl StateValue {
    pub fn text(s: impl Into<CompactString>) -> Self {
        StateValue::Text(s.into())
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            StateValue::Bool(_) => "bool",
            StateValue::Number(_) => "number",
            StateValue::Text(_) => "string",
            StateValue::Hsv(_) => "hsv",
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match *self {
            StateValue::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            StateValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl From<bool> for StateValue {
    fn from(value: bool) -> Self {
        StateValue::Bool(value)
    }
}

impl From<f64> for StateValue {
    fn from(value: f64) -> Self {
        StateValue::Number(value)
    }
}

impl From<&str> for StateValue {
    fn from(value: &str) -> Self {
        StateValue::Text(value.into())
    }
}

impl From<Hsv> for StateValue {
    fn from(value: Hsv) -> Self {
        StateValue::Hsv(value)
    }
}

impl Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateValue::Bool(b) => write!(f, "{b}"),
            StateValue::Number(n) => write!(f, "{n}"),
            StateValue::Text(s) => f.write_str(s),
            StateValue::Hsv(Hsv { h, s, v }) => write!(f, "{{h:{h},s:{s},v:{v}}}"),
        }
    }
}

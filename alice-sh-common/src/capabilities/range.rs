//! A numeric value within bounds (brightness, volume, temperature, ...)

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use super::wrong_type;
use crate::{StateValue, ValidationError};

const STEP_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
    pub precision: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeParameters {
    pub instance: CompactString,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<CompactString>,
    pub random_access: bool,
    pub range: Bounds,
}

impl RangeParameters {
    pub fn validate(&self, value: &StateValue) -> Result<(), ValidationError> {
        let StateValue::Number(n) = *value else {
            return Err(wrong_type(&self.instance, "number", value));
        };

        let Bounds { min, max, precision } = self.range;
        if !(min..=max).contains(&n) {
            return Err(ValidationError::OutOfRange { value: n, min, max });
        }

        // values have to sit on the grid of `precision` sized steps starting at `min`
        if precision > 0.0 {
            let steps = (n - min) / precision;
            if (steps - steps.round()).abs() > STEP_TOLERANCE {
                return Err(ValidationError::OffStep { value: n, min, precision });
            }
        }

        Ok(())
    }
}

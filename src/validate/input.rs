//! Validator inputs
//!
//! A validator accepts either a native [`Quantity`] or the wire pair
//! `[magnitude, unit]`. Anything else is an input-shape error.

use std::fmt;

use serde::de::{self, Deserialize, Deserializer, SeqAccess, Visitor};
use serde_json::Value;

use crate::error::{QuantityError, QuantityResult};
use crate::magnitude::{Magnitude, RawMagnitude};
use crate::units::{Quantity, UnitRegistry};

/// Input accepted by the scalar and array validators
#[derive(Debug, Clone, PartialEq)]
pub enum QuantityInput {
    Native(Quantity),
    Pair { magnitude: Magnitude, unit: String },
}

impl QuantityInput {
    pub fn pair(magnitude: Magnitude, unit: impl Into<String>) -> Self {
        Self::Pair {
            magnitude,
            unit: unit.into(),
        }
    }

    /// Read a `[magnitude, unit]` pair from a JSON value
    pub fn from_value(value: &Value) -> QuantityResult<Self> {
        let items = value.as_array().ok_or_else(|| {
            QuantityError::input_shape(format!("expected [magnitude, unit], got {}", kind_of(value)))
        })?;

        let [magnitude, unit] = items.as_slice() else {
            return Err(QuantityError::input_shape(format!(
                "expected exactly 2 elements, got {}",
                items.len()
            )));
        };

        let unit = unit.as_str().ok_or_else(|| {
            QuantityError::input_shape(format!("unit must be a string, got {}", kind_of(unit)))
        })?;
        let raw = RawMagnitude::deserialize(magnitude)
            .map_err(|e| QuantityError::input_shape(e.to_string()))?;

        Ok(Self::pair(Magnitude::from_raw(&raw)?, unit))
    }

    /// Resolve a pair's unit; a native quantity passes through
    pub fn into_quantity(self, registry: &UnitRegistry) -> QuantityResult<Quantity> {
        match self {
            Self::Native(quantity) => Ok(quantity),
            Self::Pair { magnitude, unit } => Quantity::from_pair(registry, magnitude, &unit),
        }
    }
}

impl From<Quantity> for QuantityInput {
    fn from(quantity: Quantity) -> Self {
        Self::Native(quantity)
    }
}

impl From<WirePair> for QuantityInput {
    fn from(pair: WirePair) -> Self {
        Self::Pair {
            magnitude: pair.magnitude,
            unit: pair.unit,
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// `[magnitude, unit]` decoded from any serde format
#[derive(Debug, Clone, PartialEq)]
pub struct WirePair {
    pub magnitude: Magnitude,
    pub unit: String,
}

impl<'de> Deserialize<'de> for WirePair {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_seq(WirePairVisitor)
    }
}

struct WirePairVisitor;

impl<'de> Visitor<'de> for WirePairVisitor {
    type Value = WirePair;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a two-element sequence [magnitude, unit]")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let raw: RawMagnitude = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        let unit: String = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(1, &self))?;
        if seq.next_element::<de::IgnoredAny>()?.is_some() {
            return Err(de::Error::custom(QuantityError::input_shape(
                "expected exactly 2 elements, got more",
            )));
        }
        let magnitude = Magnitude::from_raw(&raw).map_err(de::Error::custom)?;
        Ok(WirePair { magnitude, unit })
    }
}

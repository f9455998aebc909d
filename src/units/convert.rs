//! Unit Conversion
//!
//! Conversion between units of one dimension is a single multiplication by
//! the ratio of their scales. There are no affine units in the table, so no
//! offsets are involved.

use super::quantity::Unit;
use super::registry::UnitRegistry;
use crate::error::{QuantityError, QuantityResult};

/// Factor such that `value_to = value_from * factor`
pub fn conversion_factor(from: &Unit, to: &Unit) -> QuantityResult<f64> {
    if !from.is_compatible(to) {
        return Err(QuantityError::DimensionMismatch {
            from: from.dimension(),
            to: to.dimension(),
        });
    }
    Ok(from.scale() / to.scale())
}

/// Check if two unit strings resolve to the same dimension
pub fn are_compatible(registry: &UnitRegistry, a: &str, b: &str) -> QuantityResult<bool> {
    let a = registry.resolve(a)?;
    let b = registry.resolve(b)?;
    Ok(a.is_compatible(&b))
}

/// Convert a plain real value between two named units
pub fn convert_value(registry: &UnitRegistry, value: f64, from: &str, to: &str) -> QuantityResult<f64> {
    let from = registry.resolve(from)?;
    let to = registry.resolve(to)?;
    if from.name() == to.name() {
        return Ok(value);
    }
    Ok(value * conversion_factor(&from, &to)?)
}

//! Quantity validators
//!
//! A validator is built once per parametrization (reference unit, element
//! type and, for arrays, shape) and applied to any number of inputs. Every
//! check stops the call at its first failure:
//!
//! 1. input coercion (pair to quantity, unit resolution)
//! 2. dimension against the reference unit
//! 3. shape (arrays only)
//! 4. element type through the cast policy
//!
//! Validated quantities keep the unit they were given in; conversion to the
//! reference unit happens only on encode.

pub mod array;
pub mod input;
pub mod scalar;

pub use array::ArrayQuantityType;
pub use input::{QuantityInput, WirePair};
pub use scalar::ScalarQuantityType;

use crate::codec::Encoded;
use crate::dtype::{Dtype, NumericKind, cast_to};
use crate::error::{QuantityError, QuantityResult};
use crate::units::{Quantity, Unit};

/// Dimension check against a reference unit
pub(crate) fn check_dimension(reference: &Unit, quantity: &Quantity) -> QuantityResult<()> {
    if quantity.check_dimension(reference.dimension()) {
        Ok(())
    } else {
        Err(QuantityError::Dimension {
            expected: reference.dimension(),
            actual: quantity.dimension(),
        })
    }
}

/// Reject NaN and infinite elements, which have no wire encoding
pub(crate) fn check_finite(quantity: &Quantity) -> QuantityResult<()> {
    if quantity.magnitude().is_finite() {
        Ok(())
    } else {
        Err(QuantityError::input_shape(
            "magnitude contains NaN or infinite values",
        ))
    }
}

/// Run the cast policy on a quantity's magnitude
pub(crate) fn check_dtype(dtype: Dtype, quantity: Quantity) -> QuantityResult<Quantity> {
    let (magnitude, unit) = quantity.into_parts();
    let magnitude = cast_to(dtype, magnitude)?;
    Ok(Quantity::new(magnitude, unit))
}

/// Integer fields must hold values that stay integral in the reference unit
pub(crate) fn check_encodable(
    reference: &Unit,
    dtype: Dtype,
    quantity: &Quantity,
) -> QuantityResult<()> {
    if dtype.kind() != NumericKind::Integer {
        return Ok(());
    }
    encode_validated(reference, dtype, quantity).map(|_| ())
}

/// Convert a validated quantity to the reference unit and re-apply the cast
/// policy to the converted magnitude
///
/// Scaling turns integer data into floats; for an integer field those are
/// brought back to the declared type when every value is integral.
pub(crate) fn encode_validated(
    reference: &Unit,
    dtype: Dtype,
    quantity: &Quantity,
) -> QuantityResult<Encoded> {
    let (magnitude, unit) = quantity.convert_to(reference)?.into_parts();
    let magnitude = match (dtype.kind(), magnitude.dtype().kind()) {
        (NumericKind::Integer, NumericKind::Float) => {
            magnitude.to_integral(dtype).ok_or(QuantityError::DtypeCast {
                from: magnitude.dtype(),
                to: dtype,
            })?
        }
        _ => cast_to(dtype, magnitude)?,
    };
    Ok(Encoded {
        magnitude,
        unit: unit.name().to_string(),
    })
}

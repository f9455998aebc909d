//! Dimension-checked physical quantities
//!
//! Quantity fields pair a magnitude with a unit. A field's type fixes the
//! dimension of its unit, the element type of its magnitude and, for arrays,
//! the magnitude's shape. Validation accepts any unit of the right dimension
//! and keeps it; encoding converts to the field's reference unit and writes
//! the wire pair `[magnitude, "unit"]`.
//!
//! # Modules
//!
//! - [`units`]: dimensions, the unit registry, runtime quantities
//! - [`dtype`] and [`magnitude`]: element types, the cast policy, numeric data
//! - [`shape`]: the array shape grammar
//! - [`validate`]: scalar and array validators
//! - [`codec`]: canonical encoding and typed quantity fields
//! - [`schema`]: JSON schema fragments and a structural conformance check
//! - [`params`]: the 4D-STEM parameter record

pub mod codec;
pub mod dtype;
pub mod error;
pub mod magnitude;
pub mod params;
pub mod schema;
pub mod shape;
pub mod units;
pub mod validate;

pub use codec::{AnyShape, ArrayQuantity, Encoded, ScalarQuantity, Shape};
pub use dtype::{Dtype, Element, ExactElement, NumericKind};
pub use error::{QuantityError, QuantityResult, RegistryError, ShapeSpecError};
pub use magnitude::{Magnitude, Number};
pub use params::{DocumentError, FieldError, RecordError, Simple4DSTEMParams};
pub use shape::{Axis, ShapeSpec};
pub use units::{Dimension, Quantity, Unit, UnitRegistry};
pub use validate::{ArrayQuantityType, QuantityInput, ScalarQuantityType};

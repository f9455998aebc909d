//! Error types
//!
//! Every failure is local to one call and carried as data. Validators stop
//! at the first failing check; aggregation across record fields happens in
//! [`crate::params::RecordError`].

use miette::Diagnostic;
use thiserror::Error;

use crate::dtype::Dtype;
use crate::units::dimension::Dimension;

/// Result type for quantity operations.
pub type QuantityResult<T> = Result<T, QuantityError>;

/// Failure of a single validation, conversion or encoding call
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum QuantityError {
    /// Input is neither a quantity nor a well-formed `[magnitude, unit]` pair
    #[error("Malformed quantity input: {reason}")]
    #[diagnostic(
        code(Q0001),
        help("Quantities are written as a two-element sequence: [magnitude, \"unit\"].")
    )]
    InputShape { reason: String },

    /// Unit string not present in the unit table
    #[error("Unknown unit: `{unit}`")]
    #[diagnostic(
        code(Q0002),
        help("Unit names are case-sensitive, e.g. \"meter\", \"mm\", \"degree\", \"pixel\".")
    )]
    UnknownUnit { unit: String },

    /// Resolved dimension differs from the declared reference dimension
    #[error("Dimensionality must be {expected}, got {actual}")]
    #[diagnostic(code(Q0003))]
    Dimension {
        expected: Dimension,
        actual: Dimension,
    },

    /// Conversion between units of different dimensions
    #[error("Cannot convert from {from} to {to}: incompatible dimensions")]
    #[diagnostic(code(Q0004))]
    DimensionMismatch { from: Dimension, to: Dimension },

    /// Array rank or axis sizes do not satisfy the declared shape
    #[error("Shape mismatch: expected ({expected}), got {}", format_shape(.actual))]
    #[diagnostic(code(Q0005))]
    ShapeMismatch { expected: String, actual: Vec<usize> },

    /// Element kind mismatch that a single widening cast cannot resolve
    #[error("Cannot cast element type `{from}` to `{to}`")]
    #[diagnostic(
        code(Q0006),
        help("Only integer to floating-point widening is applied automatically.")
    )]
    DtypeCast { from: Dtype, to: Dtype },
}

impl QuantityError {
    pub(crate) fn input_shape(reason: impl Into<String>) -> Self {
        Self::InputShape {
            reason: reason.into(),
        }
    }
}

/// Render an array shape as `(3, 2)`
pub fn format_shape(shape: &[usize]) -> String {
    let dims: Vec<String> = shape.iter().map(|d| d.to_string()).collect();
    if dims.len() == 1 {
        format!("({},)", dims[0])
    } else {
        format!("({})", dims.join(", "))
    }
}

/// Failure to parse a shape specification string
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ShapeSpecError {
    #[error("Empty axis at position {position} in shape `{spec}`")]
    #[diagnostic(code(S0001))]
    EmptyAxis { spec: String, position: usize },

    #[error("Invalid axis `{axis}` in shape `{spec}`")]
    #[diagnostic(
        code(S0002),
        help("Axes are a size (`2`), a labelled size (`2 rows`), `*`, a variable (`N`), or a final `...`.")
    )]
    InvalidAxis { spec: String, axis: String },

    #[error("`...` may only appear as the last axis in shape `{spec}`")]
    #[diagnostic(code(S0003))]
    MisplacedEllipsis { spec: String },
}

/// Failure to build or extend a unit table
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum RegistryError {
    #[error("IO error: {0}")]
    #[diagnostic(code(U0001))]
    Io(String),

    #[error("Parse error: {0}")]
    #[diagnostic(code(U0002))]
    Parse(String),

    #[error("Unit `{name}` is already defined")]
    #[diagnostic(code(U0003))]
    Duplicate { name: String },

    #[error("Unit `{name}` has invalid scale {scale}")]
    #[diagnostic(code(U0004), help("Scales must be finite and strictly positive."))]
    InvalidScale { name: String, scale: f64 },
}

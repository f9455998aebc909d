//! Element data types and the cast policy
//!
//! Each element tag maps through a static descriptor table to a numeric kind
//! and bit width. The cast policy decides whether a magnitude can be accepted
//! as declared: identical or same-width data passes, width-agnostic literals
//! are re-tagged when representable, integers may be widened to floats once,
//! and everything else is rejected.

use std::fmt;
use std::str::FromStr;

use num_complex::{Complex32, Complex64};
use serde::{Deserialize, Serialize};

use crate::error::{QuantityError, QuantityResult};
use crate::magnitude::{Magnitude, Number};

/// Basic numeric kind of an element type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericKind {
    Integer,
    Float,
    Complex,
}

impl fmt::Display for NumericKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => write!(f, "integer"),
            Self::Float => write!(f, "floating-point"),
            Self::Complex => write!(f, "complex"),
        }
    }
}

/// Element type tag
///
/// `Int`, `Float` and `Complex` are width-agnostic literals, which is what a
/// wire document produces: `3` is an `Int`, `0.5` a `Float`. The remaining
/// tags are fixed-width machine types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dtype {
    Int,
    Float,
    Complex,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Complex64,
    Complex128,
}

/// Kind, width and literal-ness of an element type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DtypeDescriptor {
    pub kind: NumericKind,
    pub bits: u8,
    /// Width-agnostic literal (may be re-tagged to any width of its kind)
    pub native: bool,
    pub signed: bool,
}

const fn desc(kind: NumericKind, bits: u8, native: bool, signed: bool) -> DtypeDescriptor {
    DtypeDescriptor {
        kind,
        bits,
        native,
        signed,
    }
}

use NumericKind::{Complex as C, Float as F, Integer as I};

/// Indexed by `Dtype as usize`; order must follow the enum declaration.
const DESCRIPTORS: [(Dtype, &str, DtypeDescriptor); 15] = [
    (Dtype::Int, "int", desc(I, 64, true, true)),
    (Dtype::Float, "float", desc(F, 64, true, true)),
    (Dtype::Complex, "complex", desc(C, 128, true, true)),
    (Dtype::Int8, "int8", desc(I, 8, false, true)),
    (Dtype::Int16, "int16", desc(I, 16, false, true)),
    (Dtype::Int32, "int32", desc(I, 32, false, true)),
    (Dtype::Int64, "int64", desc(I, 64, false, true)),
    (Dtype::UInt8, "uint8", desc(I, 8, false, false)),
    (Dtype::UInt16, "uint16", desc(I, 16, false, false)),
    (Dtype::UInt32, "uint32", desc(I, 32, false, false)),
    (Dtype::UInt64, "uint64", desc(I, 64, false, false)),
    (Dtype::Float32, "float32", desc(F, 32, false, true)),
    (Dtype::Float64, "float64", desc(F, 64, false, true)),
    (Dtype::Complex64, "complex64", desc(C, 64, false, true)),
    (Dtype::Complex128, "complex128", desc(C, 128, false, true)),
];

impl Dtype {
    /// Look up the static descriptor for this tag
    #[inline]
    pub fn descriptor(self) -> DtypeDescriptor {
        DESCRIPTORS[self as usize].2
    }

    #[inline]
    pub fn kind(self) -> NumericKind {
        self.descriptor().kind
    }

    pub fn name(self) -> &'static str {
        DESCRIPTORS[self as usize].1
    }

    /// Inclusive value range for integer tags, clamped to the `i64` storage
    pub fn int_range(self) -> Option<(i64, i64)> {
        let d = self.descriptor();
        if d.kind != NumericKind::Integer {
            return None;
        }
        Some(match (d.signed, d.bits) {
            (true, 8) => (i8::MIN as i64, i8::MAX as i64),
            (true, 16) => (i16::MIN as i64, i16::MAX as i64),
            (true, 32) => (i32::MIN as i64, i32::MAX as i64),
            (false, 8) => (0, u8::MAX as i64),
            (false, 16) => (0, u16::MAX as i64),
            (false, 32) => (0, u32::MAX as i64),
            (false, _) => (0, i64::MAX),
            (true, _) => (i64::MIN, i64::MAX),
        })
    }

    /// Single precision float storage (Float32 and the parts of Complex64)
    #[inline]
    pub(crate) fn is_single_precision(self) -> bool {
        matches!(self, Dtype::Float32 | Dtype::Complex64)
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dtype {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let alias = match s {
            "double" => Some(Dtype::Float64),
            "single" => Some(Dtype::Float32),
            _ => None,
        };
        alias
            .or_else(|| {
                DESCRIPTORS
                    .iter()
                    .find(|(_, name, _)| *name == s)
                    .map(|(dtype, _, _)| *dtype)
            })
            .ok_or_else(|| format!("unknown element type `{}`", s))
    }
}

/// Rust element types usable as quantity magnitudes
pub trait Element: Copy + Send + Sync + 'static {
    const DTYPE: Dtype;

    /// `None` if the value does not fit the storage of its kind
    fn try_to_number(self) -> Option<Number>;
}

/// Element types whose every value fits the storage of its kind
pub trait ExactElement: Element {
    fn to_number(self) -> Number;
}

macro_rules! exact_element {
    ($($ty:ty => $dtype:ident, |$v:ident| $convert:expr);* $(;)?) => {
        $(
            impl Element for $ty {
                const DTYPE: Dtype = Dtype::$dtype;

                #[inline]
                fn try_to_number(self) -> Option<Number> {
                    Some(self.to_number())
                }
            }

            impl ExactElement for $ty {
                #[inline]
                fn to_number(self) -> Number {
                    let $v = self;
                    $convert
                }
            }
        )*
    };
}

exact_element!(
    i8 => Int8, |v| Number::Int(v as i64);
    i16 => Int16, |v| Number::Int(v as i64);
    i32 => Int32, |v| Number::Int(v as i64);
    i64 => Int64, |v| Number::Int(v);
    u8 => UInt8, |v| Number::Int(v as i64);
    u16 => UInt16, |v| Number::Int(v as i64);
    u32 => UInt32, |v| Number::Int(v as i64);
    f32 => Float32, |v| Number::Float(v as f64);
    f64 => Float64, |v| Number::Float(v);
    Complex32 => Complex64, |v| Number::Complex(Complex64::new(v.re as f64, v.im as f64));
    Complex64 => Complex128, |v| Number::Complex(v);
);

// Integer storage is i64, so the top half of u64 is unrepresentable.
impl Element for u64 {
    const DTYPE: Dtype = Dtype::UInt64;

    #[inline]
    fn try_to_number(self) -> Option<Number> {
        i64::try_from(self).ok().map(Number::Int)
    }
}

/// Accept `magnitude` as `declared`, widening integers to floats at most once
pub fn cast_to(declared: Dtype, magnitude: Magnitude) -> QuantityResult<Magnitude> {
    let actual = magnitude.dtype();
    if actual == declared {
        return Ok(magnitude);
    }

    let want = declared.descriptor();
    let have = actual.descriptor();
    let reject = || QuantityError::DtypeCast {
        from: actual,
        to: declared,
    };

    if want.kind == have.kind {
        // Same width is the same machine type; a literal may take any width
        // that holds all of its values.
        if (want.bits == have.bits && want.signed == have.signed) || have.native {
            return magnitude.retag(declared).ok_or_else(reject);
        }
        return Err(reject());
    }

    if have.kind == NumericKind::Integer && want.kind == NumericKind::Float {
        let widened = magnitude.widen(declared);
        tracing::debug!(from = %actual, to = %declared, "widening integer magnitude");
        if widened.dtype() == declared {
            return Ok(widened);
        }
    }

    Err(reject())
}

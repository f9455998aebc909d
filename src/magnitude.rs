//! Numeric magnitudes
//!
//! A magnitude is a scalar or a rectangular N-dimensional array of a single
//! numeric kind, tagged with its element [`Dtype`]. Scalars are stored as
//! rank-0 arrays so that scaling, re-tagging and widening are written once.

use std::fmt;

use ndarray::{ArrayD, ArrayViewD, Axis, IxDyn};
use num_complex::Complex64;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::dtype::{Dtype, Element, ExactElement, NumericKind};
use crate::error::{QuantityError, QuantityResult};

/// A single numeric value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
    Complex(Complex64),
}

impl Number {
    pub fn kind(&self) -> NumericKind {
        match self {
            Self::Int(_) => NumericKind::Integer,
            Self::Float(_) => NumericKind::Float,
            Self::Complex(_) => NumericKind::Complex,
        }
    }

    fn to_i64(self) -> i64 {
        match self {
            Self::Int(v) => v,
            Self::Float(v) => v as i64,
            Self::Complex(c) => c.re as i64,
        }
    }

    fn to_f64(self) -> f64 {
        match self {
            Self::Int(v) => v as f64,
            Self::Float(v) => v,
            Self::Complex(c) => c.re,
        }
    }

    fn to_complex(self) -> Complex64 {
        match self {
            Self::Complex(c) => c,
            other => Complex64::new(other.to_f64(), 0.0),
        }
    }
}

fn unrepresentable<T: Element>() -> QuantityError {
    QuantityError::input_shape(format!(
        "`{}` value does not fit 64-bit signed integer storage",
        T::DTYPE
    ))
}

/// Width-agnostic literal tag for a numeric kind
fn literal_dtype(kind: NumericKind) -> Dtype {
    match kind {
        NumericKind::Integer => Dtype::Int,
        NumericKind::Float => Dtype::Float,
        NumericKind::Complex => Dtype::Complex,
    }
}

#[inline]
fn round_single(v: f64) -> f64 {
    v as f32 as f64
}

/// Element storage, one container per numeric kind
#[derive(Debug, Clone, PartialEq)]
pub enum Values {
    Int(ArrayD<i64>),
    Float(ArrayD<f64>),
    Complex(ArrayD<Complex64>),
}

impl Values {
    fn collect(kind: NumericKind, numbers: &ArrayD<Number>) -> Self {
        match kind {
            NumericKind::Integer => Self::Int(numbers.mapv(Number::to_i64)),
            NumericKind::Float => Self::Float(numbers.mapv(Number::to_f64)),
            NumericKind::Complex => Self::Complex(numbers.mapv(Number::to_complex)),
        }
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            Self::Int(a) => a.shape(),
            Self::Float(a) => a.shape(),
            Self::Complex(a) => a.shape(),
        }
    }

    pub fn kind(&self) -> NumericKind {
        match self {
            Self::Int(_) => NumericKind::Integer,
            Self::Float(_) => NumericKind::Float,
            Self::Complex(_) => NumericKind::Complex,
        }
    }
}

/// Scalar or array magnitude with its element type
///
/// The numeric kind of the storage always matches the kind of `dtype`.
#[derive(Debug, Clone, PartialEq)]
pub struct Magnitude {
    values: Values,
    dtype: Dtype,
    scalar: bool,
}

impl Magnitude {
    /// Scalar magnitude from a Rust number
    pub fn scalar<T: ExactElement>(value: T) -> Self {
        Self::from_number(value.to_number(), T::DTYPE)
    }

    /// Scalar magnitude from any element type, failing if the value does
    /// not fit the storage of its kind
    pub fn try_scalar<T: Element>(value: T) -> QuantityResult<Self> {
        let number = value.try_to_number().ok_or_else(|| unrepresentable::<T>())?;
        Ok(Self::from_number(number, T::DTYPE))
    }

    /// Scalar magnitude from a width-agnostic literal
    pub fn literal(value: Number) -> Self {
        Self::from_number(value, literal_dtype(value.kind()))
    }

    /// Array magnitude from an `ndarray` of Rust numbers
    pub fn array<T: ExactElement>(values: ArrayD<T>) -> Self {
        let numbers = values.mapv(|v| v.to_number());
        Self::from_numbers(numbers, T::DTYPE)
    }

    /// Array magnitude from any element type, failing if a value does not
    /// fit the storage of its kind
    pub fn try_array<T: Element>(values: ArrayD<T>) -> QuantityResult<Self> {
        let mut numbers = ArrayD::from_elem(values.raw_dim(), Number::Int(0));
        for (slot, value) in numbers.iter_mut().zip(values.iter()) {
            *slot = value.try_to_number().ok_or_else(|| unrepresentable::<T>())?;
        }
        Ok(Self::from_numbers(numbers, T::DTYPE))
    }

    fn from_numbers(numbers: ArrayD<Number>, dtype: Dtype) -> Self {
        Self {
            values: Values::collect(dtype.kind(), &numbers),
            dtype,
            scalar: false,
        }
    }

    pub(crate) fn from_number(value: Number, dtype: Dtype) -> Self {
        debug_assert_eq!(value.kind(), dtype.kind());
        let numbers = ArrayD::from_elem(IxDyn(&[]), value);
        Self {
            values: Values::collect(dtype.kind(), &numbers),
            dtype,
            scalar: true,
        }
    }

    /// Build a magnitude from decoded wire data
    ///
    /// Nested sequences must be rectangular. Mixed integer and float leaves
    /// give a float array; any complex leaf gives a complex array. An empty
    /// sequence is a float array of shape `(0,)`.
    pub fn from_raw(raw: &RawMagnitude) -> QuantityResult<Self> {
        if let RawMagnitude::Number(n) = raw {
            return Ok(Self::literal(*n));
        }

        let shape = raw.leading_shape();
        let mut leaves = Vec::new();
        if !raw.flatten_into(&shape, &mut leaves) {
            return Err(QuantityError::input_shape(
                "magnitude is a ragged nested sequence",
            ));
        }

        let kind = leaves
            .iter()
            .map(Number::kind)
            .max_by_key(|k| match k {
                NumericKind::Integer => 0,
                NumericKind::Float => 1,
                NumericKind::Complex => 2,
            })
            .unwrap_or(NumericKind::Float);

        let numbers = ArrayD::from_shape_vec(IxDyn(&shape), leaves)
            .map_err(|e| QuantityError::input_shape(e.to_string()))?;

        Ok(Self {
            values: Values::collect(kind, &numbers),
            dtype: literal_dtype(kind),
            scalar: false,
        })
    }

    #[inline]
    pub fn dtype(&self) -> Dtype {
        self.dtype
    }

    #[inline]
    pub fn is_scalar(&self) -> bool {
        self.scalar
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        self.values.shape()
    }

    #[inline]
    pub fn values(&self) -> &Values {
        &self.values
    }

    /// Scalar value, if this is a scalar
    pub fn as_number(&self) -> Option<Number> {
        if !self.scalar {
            return None;
        }
        match &self.values {
            Values::Int(a) => a.first().map(|v| Number::Int(*v)),
            Values::Float(a) => a.first().map(|v| Number::Float(*v)),
            Values::Complex(a) => a.first().map(|v| Number::Complex(*v)),
        }
    }

    /// Real scalar value as `f64`
    pub fn as_f64(&self) -> Option<f64> {
        match self.as_number()? {
            Number::Int(v) => Some(v as f64),
            Number::Float(v) => Some(v),
            Number::Complex(_) => None,
        }
    }

    /// Real elements as an `f64` array
    pub fn to_f64_array(&self) -> Option<ArrayD<f64>> {
        match &self.values {
            Values::Int(a) => Some(a.mapv(|v| v as f64)),
            Values::Float(a) => Some(a.clone()),
            Values::Complex(_) => None,
        }
    }

    /// Whether every element is finite (real and imaginary parts alike)
    pub fn is_finite(&self) -> bool {
        match &self.values {
            Values::Int(_) => true,
            Values::Float(a) => a.iter().all(|v| v.is_finite()),
            Values::Complex(a) => a.iter().all(|c| c.is_finite()),
        }
    }

    /// Float data back to the integer type `to`
    ///
    /// Each value is snapped to the nearest integer when it lies within
    /// float rounding noise of it. Returns `None` if a value is not integral
    /// or falls outside the range of `to`.
    pub(crate) fn to_integral(&self, to: Dtype) -> Option<Self> {
        let (lo, hi) = to.int_range()?;
        let Values::Float(a) = &self.values else {
            return None;
        };
        let mut ints = ArrayD::zeros(a.raw_dim());
        for (slot, v) in ints.iter_mut().zip(a.iter()) {
            let rounded = v.round();
            let tolerance = 4.0 * f64::EPSILON * v.abs().max(1.0);
            if !v.is_finite() || (v - rounded).abs() > tolerance {
                return None;
            }
            // i64::MAX as f64 is 2^63, one past the largest i64
            if rounded < lo as f64 || rounded > hi as f64 || rounded >= i64::MAX as f64 {
                return None;
            }
            *slot = rounded as i64;
        }
        Some(Self {
            values: Values::Int(ints),
            dtype: to,
            scalar: self.scalar,
        })
    }

    /// Re-tag to another element type of the same kind
    ///
    /// Returns `None` if any value falls outside the target range.
    pub(crate) fn retag(&self, to: Dtype) -> Option<Self> {
        if to.kind() != self.dtype.kind() {
            return None;
        }
        let single = to.is_single_precision();
        let values = match &self.values {
            Values::Int(a) => {
                let (lo, hi) = to.int_range()?;
                if a.iter().any(|v| *v < lo || *v > hi) {
                    return None;
                }
                Values::Int(a.clone())
            }
            Values::Float(a) if single => {
                let rounded = a.mapv(round_single);
                if a.iter().zip(rounded.iter()).any(|(x, y)| x.is_finite() && !y.is_finite()) {
                    return None;
                }
                Values::Float(rounded)
            }
            Values::Complex(a) if single => {
                let rounded = a.mapv(|c| Complex64::new(round_single(c.re), round_single(c.im)));
                if a.iter().zip(rounded.iter()).any(|(x, y)| x.is_finite() && !y.is_finite()) {
                    return None;
                }
                Values::Complex(rounded)
            }
            other => other.clone(),
        };
        Some(Self {
            values,
            dtype: to,
            scalar: self.scalar,
        })
    }

    /// Integer to floating-point widening
    pub(crate) fn widen(&self, to: Dtype) -> Self {
        match (&self.values, to.kind()) {
            (Values::Int(a), NumericKind::Float) => {
                let single = to.is_single_precision();
                let values = a.mapv(|v| if single { round_single(v as f64) } else { v as f64 });
                Self {
                    values: Values::Float(values),
                    dtype: to,
                    scalar: self.scalar,
                }
            }
            _ => self.clone(),
        }
    }

    /// Multiply every element by `factor`
    ///
    /// A factor of exactly one leaves the magnitude untouched. Integers
    /// become floats; float and complex data keep their element type.
    pub(crate) fn scaled(&self, factor: f64) -> Self {
        if factor == 1.0 {
            return self.clone();
        }
        let single = self.dtype.is_single_precision();
        let round = |v: f64| if single { round_single(v) } else { v };
        let (values, dtype) = match &self.values {
            Values::Int(a) => {
                let dtype = if self.dtype.descriptor().native {
                    Dtype::Float
                } else {
                    Dtype::Float64
                };
                (Values::Float(a.mapv(|v| v as f64 * factor)), dtype)
            }
            Values::Float(a) => (Values::Float(a.mapv(|v| round(v * factor))), self.dtype),
            Values::Complex(a) => (
                Values::Complex(a.mapv(|c| {
                    let c = c * factor;
                    Complex64::new(round(c.re), round(c.im))
                })),
                self.dtype,
            ),
        };
        Self {
            values,
            dtype,
            scalar: self.scalar,
        }
    }
}

impl fmt::Display for Magnitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.values, self.as_number()) {
            (_, Some(Number::Int(v))) => write!(f, "{}", v),
            (_, Some(Number::Float(v))) => write!(f, "{}", v),
            (_, Some(Number::Complex(c))) => write!(f, "{}", c),
            (Values::Int(a), None) => write!(f, "{}", a),
            (Values::Float(a), None) => write!(f, "{}", a),
            (Values::Complex(a), None) => write!(f, "{}", a),
        }
    }
}

// =============================================================================
// Serialization
// =============================================================================

trait Leaf {
    fn serialize_leaf<S: Serializer>(&self, serializer: S, single: bool)
    -> Result<S::Ok, S::Error>;
}

impl Leaf for i64 {
    fn serialize_leaf<S: Serializer>(&self, serializer: S, _: bool) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(*self)
    }
}

impl Leaf for f64 {
    fn serialize_leaf<S: Serializer>(
        &self,
        serializer: S,
        single: bool,
    ) -> Result<S::Ok, S::Error> {
        if single {
            serializer.serialize_f32(*self as f32)
        } else {
            serializer.serialize_f64(*self)
        }
    }
}

/// Complex numbers go on the wire as `{"real": x, "imag": y}`
impl Leaf for Complex64 {
    fn serialize_leaf<S: Serializer>(
        &self,
        serializer: S,
        single: bool,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        if single {
            map.serialize_entry("real", &(self.re as f32))?;
            map.serialize_entry("imag", &(self.im as f32))?;
        } else {
            map.serialize_entry("real", &self.re)?;
            map.serialize_entry("imag", &self.im)?;
        }
        map.end()
    }
}

struct Nested<'a, T> {
    view: ArrayViewD<'a, T>,
    single: bool,
}

impl<T: Leaf> Serialize for Nested<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.view.ndim() == 0 {
            return match self.view.first() {
                Some(leaf) => leaf.serialize_leaf(serializer, self.single),
                None => Err(serde::ser::Error::custom("rank-0 array without element")),
            };
        }
        let mut seq = serializer.serialize_seq(Some(self.view.len_of(Axis(0))))?;
        for sub in self.view.outer_iter() {
            seq.serialize_element(&Nested {
                view: sub,
                single: self.single,
            })?;
        }
        seq.end()
    }
}

impl Serialize for Magnitude {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let single = self.dtype.is_single_precision();
        match &self.values {
            Values::Int(a) => Nested {
                view: a.view(),
                single,
            }
            .serialize(serializer),
            Values::Float(a) => Nested {
                view: a.view(),
                single,
            }
            .serialize(serializer),
            Values::Complex(a) => Nested {
                view: a.view(),
                single,
            }
            .serialize(serializer),
        }
    }
}

// =============================================================================
// Wire decoding
// =============================================================================

/// Untyped magnitude as read from a document
#[derive(Debug, Clone, PartialEq)]
pub enum RawMagnitude {
    Number(Number),
    Seq(Vec<RawMagnitude>),
}

impl RawMagnitude {
    /// Shape implied by following the first element at every level
    fn leading_shape(&self) -> Vec<usize> {
        let mut shape = Vec::new();
        let mut node = self;
        while let RawMagnitude::Seq(items) = node {
            shape.push(items.len());
            match items.first() {
                Some(first) => node = first,
                None => break,
            }
        }
        shape
    }

    fn flatten_into(&self, shape: &[usize], out: &mut Vec<Number>) -> bool {
        match (self, shape.split_first()) {
            (RawMagnitude::Number(n), None) => {
                out.push(*n);
                true
            }
            (RawMagnitude::Seq(items), Some((len, rest))) if items.len() == *len => {
                items.iter().all(|item| item.flatten_into(rest, out))
            }
            _ => false,
        }
    }
}

impl<'de> Deserialize<'de> for RawMagnitude {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RawMagnitudeVisitor)
    }
}

struct RawMagnitudeVisitor;

impl<'de> Visitor<'de> for RawMagnitudeVisitor {
    type Value = RawMagnitude;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a number, a complex {real, imag} map, or a nested sequence of numbers")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(RawMagnitude::Number(Number::Int(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        i64::try_from(v)
            .map(|v| RawMagnitude::Number(Number::Int(v)))
            .map_err(|_| E::custom(format!("integer {} out of range", v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(RawMagnitude::Number(Number::Float(v)))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(RawMagnitude::Seq(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut real = None;
        let mut imag = None;
        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "real" => real = Some(map.next_value::<f64>()?),
                "imag" => imag = Some(map.next_value::<f64>()?),
                other => return Err(de::Error::unknown_field(other, &["real", "imag"])),
            }
        }
        let real = real.ok_or_else(|| de::Error::missing_field("real"))?;
        let imag = imag.ok_or_else(|| de::Error::missing_field("imag"))?;
        Ok(RawMagnitude::Number(Number::Complex(Complex64::new(real, imag))))
    }
}

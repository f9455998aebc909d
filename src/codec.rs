//! Canonical encoding and typed quantity fields
//!
//! [`ScalarQuantity`] and [`ArrayQuantity`] fix their reference unit, shape
//! and element type as type parameters, so a record field declares its
//! contract in its type:
//!
//! ```
//! use libertem_schema::codec::ScalarQuantity;
//! use libertem_schema::units::si::Meter;
//!
//! type Length = ScalarQuantity<Meter, f64>;
//! let registry = libertem_schema::UnitRegistry::standard();
//! let length = Length::from_str_pair(&registry, "2 m").unwrap();
//! let encoded = serde_json::to_string(&length).unwrap();
//! assert_eq!(encoded, "[2.0,\"meter\"]");
//! ```
//!
//! Their serde impls go through [`UnitRegistry::global`], since serde offers
//! no way to pass a registry into `Deserialize`. Everything else takes the
//! registry explicitly.
//!
//! The validator of each field type is built on first use and shared by
//! every later call.

use std::any::TypeId;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{OnceLock, PoisonError, RwLock};

use rustc_hash::FxHashMap;

use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{self, Serialize, SerializeTuple, Serializer};
use serde_json::Value;

use crate::dtype::Element;
use crate::error::{QuantityError, QuantityResult};
use crate::magnitude::{Magnitude, Number};
use crate::shape::ShapeSpec;
use crate::units::{Quantity, ReferenceUnit, UnitRegistry};
use crate::validate::{ArrayQuantityType, QuantityInput, ScalarQuantityType, WirePair};

/// Wire pair `[magnitude, unit]` with the magnitude in the reference unit
#[derive(Debug, Clone, PartialEq)]
pub struct Encoded {
    pub magnitude: Magnitude,
    pub unit: String,
}

impl Encoded {
    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

impl Serialize for Encoded {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.magnitude)?;
        tuple.serialize_element(&self.unit)?;
        tuple.end()
    }
}

/// Compile-time array shape
///
/// Implement with [`define_shape!`](crate::define_shape).
pub trait Shape: 'static {
    fn spec() -> &'static ShapeSpec;
}

/// Declare a marker type implementing [`Shape`] from a shape literal
///
/// ```
/// libertem_schema::define_shape!(pub Matrix2 = "2 rows, 2 cols");
/// ```
#[macro_export]
macro_rules! define_shape {
    ($(#[$meta:meta])* $vis:vis $name:ident = $spec:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
        $vis struct $name;

        impl $crate::codec::Shape for $name {
            fn spec() -> &'static $crate::shape::ShapeSpec {
                static SPEC: ::std::sync::OnceLock<$crate::shape::ShapeSpec> =
                    ::std::sync::OnceLock::new();
                SPEC.get_or_init(|| {
                    $crate::shape::ShapeSpec::parse($spec)
                        .unwrap_or_else(|e| panic!("invalid shape literal {:?}: {}", $spec, e))
                })
            }
        }
    };
}

define_shape!(
    /// Array of any rank and size
    pub AnyShape = "..."
);

// =============================================================================
// Validator cache
// =============================================================================

type ValidatorCache<V> = OnceLock<RwLock<FxHashMap<TypeId, &'static V>>>;

static SCALAR_TYPES: ValidatorCache<ScalarQuantityType> = OnceLock::new();
static ARRAY_TYPES: ValidatorCache<ArrayQuantityType> = OnceLock::new();

/// Validator for field type `F`, built once per process
///
/// Entries are leaked; there is one per field type in the program.
fn cached_validator<F: 'static, V: Send + Sync>(
    cache: &'static ValidatorCache<V>,
    build: impl FnOnce() -> V,
) -> &'static V {
    let slots = cache.get_or_init(Default::default);
    let key = TypeId::of::<F>();

    let hit = slots
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&key)
        .copied();
    if let Some(validator) = hit {
        return validator;
    }

    let mut slots = slots.write().unwrap_or_else(PoisonError::into_inner);
    *slots.entry(key).or_insert_with(|| {
        tracing::debug!(field = std::any::type_name::<F>(), "building field validator");
        Box::leak(Box::new(build()))
    })
}

// =============================================================================
// Scalar fields
// =============================================================================

/// Validated scalar quantity with reference unit `R` and element type `E`
pub struct ScalarQuantity<R: ReferenceUnit, E: Element = f64> {
    quantity: Quantity,
    _marker: PhantomData<fn() -> (R, E)>,
}

impl<R: ReferenceUnit, E: Element> ScalarQuantity<R, E> {
    /// Validator for this parametrization
    pub fn value_type() -> &'static ScalarQuantityType {
        cached_validator::<Self, _>(&SCALAR_TYPES, || ScalarQuantityType::of::<R>(E::DTYPE))
    }

    pub fn new(registry: &UnitRegistry, input: impl Into<QuantityInput>) -> QuantityResult<Self> {
        let quantity = Self::value_type().validate(registry, input)?;
        Ok(Self {
            quantity,
            _marker: PhantomData,
        })
    }

    /// Validate `value` given in `unit`
    pub fn with_unit(registry: &UnitRegistry, value: E, unit: &str) -> QuantityResult<Self> {
        Self::new(registry, QuantityInput::pair(Magnitude::try_scalar(value)?, unit))
    }

    /// Parse `"<number> <unit>"`
    pub fn from_str_pair(registry: &UnitRegistry, s: &str) -> QuantityResult<Self> {
        let s = s.trim();
        let (number, unit) = s.split_once(char::is_whitespace).unwrap_or((s, ""));
        let number = number
            .parse::<i64>()
            .map(Number::Int)
            .or_else(|_| number.parse::<f64>().map(Number::Float))
            .map_err(|_| QuantityError::input_shape(format!("`{}` is not a number", number)))?;
        Self::new(
            registry,
            QuantityInput::pair(Magnitude::literal(number), unit.trim()),
        )
    }

    pub fn decode(registry: &UnitRegistry, value: &Value) -> QuantityResult<Self> {
        Self::new(registry, QuantityInput::from_value(value)?)
    }

    pub fn quantity(&self) -> &Quantity {
        &self.quantity
    }

    pub fn into_quantity(self) -> Quantity {
        self.quantity
    }

    pub fn encode(&self) -> QuantityResult<Encoded> {
        Self::value_type().encode(&self.quantity)
    }

    /// Real value expressed in the reference unit
    pub fn to_reference(&self) -> QuantityResult<f64> {
        let converted = self.quantity.convert_to(&R::unit())?;
        converted
            .magnitude()
            .as_f64()
            .ok_or_else(|| QuantityError::input_shape("complex magnitude has no real value"))
    }

    pub fn json_schema() -> Value {
        Self::value_type().json_schema()
    }
}

impl<R: ReferenceUnit, E: Element> Clone for ScalarQuantity<R, E> {
    fn clone(&self) -> Self {
        Self {
            quantity: self.quantity.clone(),
            _marker: PhantomData,
        }
    }
}

impl<R: ReferenceUnit, E: Element> PartialEq for ScalarQuantity<R, E> {
    fn eq(&self, other: &Self) -> bool {
        self.quantity == other.quantity
    }
}

impl<R: ReferenceUnit, E: Element> fmt::Debug for ScalarQuantity<R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ScalarQuantity").field(&self.quantity).finish()
    }
}

impl<R: ReferenceUnit, E: Element> fmt::Display for ScalarQuantity<R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.quantity, f)
    }
}

impl<R: ReferenceUnit, E: Element> Serialize for ScalarQuantity<R, E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.encode()
            .map_err(ser::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de, R: ReferenceUnit, E: Element> Deserialize<'de> for ScalarQuantity<R, E> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let pair = WirePair::deserialize(deserializer)?;
        Self::new(UnitRegistry::global(), pair).map_err(de::Error::custom)
    }
}

// =============================================================================
// Array fields
// =============================================================================

/// Validated array quantity with reference unit `R`, shape `S` and element
/// type `E`
pub struct ArrayQuantity<R: ReferenceUnit, S: Shape = AnyShape, E: Element = f64> {
    quantity: Quantity,
    _marker: PhantomData<fn() -> (R, S, E)>,
}

impl<R: ReferenceUnit, S: Shape, E: Element> ArrayQuantity<R, S, E> {
    pub fn value_type() -> &'static ArrayQuantityType {
        cached_validator::<Self, _>(&ARRAY_TYPES, || {
            ArrayQuantityType::of::<R>(S::spec().clone(), E::DTYPE)
        })
    }

    pub fn new(registry: &UnitRegistry, input: impl Into<QuantityInput>) -> QuantityResult<Self> {
        let quantity = Self::value_type().validate(registry, input)?;
        Ok(Self {
            quantity,
            _marker: PhantomData,
        })
    }

    pub fn with_unit(
        registry: &UnitRegistry,
        values: ndarray::ArrayD<E>,
        unit: &str,
    ) -> QuantityResult<Self> {
        Self::new(registry, QuantityInput::pair(Magnitude::try_array(values)?, unit))
    }

    pub fn decode(registry: &UnitRegistry, value: &Value) -> QuantityResult<Self> {
        Self::new(registry, QuantityInput::from_value(value)?)
    }

    pub fn quantity(&self) -> &Quantity {
        &self.quantity
    }

    pub fn into_quantity(self) -> Quantity {
        self.quantity
    }

    pub fn encode(&self) -> QuantityResult<Encoded> {
        Self::value_type().encode(&self.quantity)
    }

    pub fn json_schema() -> Value {
        Self::value_type().json_schema()
    }
}

impl<R: ReferenceUnit, S: Shape, E: Element> Clone for ArrayQuantity<R, S, E> {
    fn clone(&self) -> Self {
        Self {
            quantity: self.quantity.clone(),
            _marker: PhantomData,
        }
    }
}

impl<R: ReferenceUnit, S: Shape, E: Element> PartialEq for ArrayQuantity<R, S, E> {
    fn eq(&self, other: &Self) -> bool {
        self.quantity == other.quantity
    }
}

impl<R: ReferenceUnit, S: Shape, E: Element> fmt::Debug for ArrayQuantity<R, S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ArrayQuantity").field(&self.quantity).finish()
    }
}

impl<R: ReferenceUnit, S: Shape, E: Element> Serialize for ArrayQuantity<R, S, E> {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        self.encode()
            .map_err(ser::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de, R: ReferenceUnit, S: Shape, E: Element> Deserialize<'de> for ArrayQuantity<R, S, E> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let pair = WirePair::deserialize(deserializer)?;
        Self::new(UnitRegistry::global(), pair).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtype::Dtype;
    use crate::units::si::{Degree, Meter, Millimeter, Pixel, Radian};
    use crate::units::{Dimension, UnitDef, UnitRegistryBuilder};
    use approx::assert_relative_eq;
    use ndarray::arr2;

    define_shape!(Matrix2 = "2 rows, 2 cols");

    type Length = ScalarQuantity<Meter, f64>;
    type Rotation = ArrayQuantity<Degree, Matrix2, f32>;

    #[test]
    fn test_encoded_serializes_as_pair() {
        let encoded = Encoded {
            magnitude: Magnitude::scalar(1.5f64),
            unit: "meter".to_string(),
        };
        assert_eq!(serde_json::to_string(&encoded).unwrap(), "[1.5,\"meter\"]");
        assert_eq!(
            encoded.to_value().unwrap(),
            serde_json::json!([1.5, "meter"])
        );
    }

    #[test]
    fn test_scalar_serde_round_trip() {
        let length: Length = serde_json::from_str("[10000, \"angstrom\"]").unwrap();
        assert_eq!(length.quantity().unit().name(), "angstrom");

        let json = serde_json::to_value(&length).unwrap();
        assert_eq!(json[1], "meter");
        assert_relative_eq!(json[0].as_f64().unwrap(), 1e-6, max_relative = 1e-12);

        let again: Length = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(serde_json::to_value(&again).unwrap(), json);
    }

    #[test]
    fn test_scalar_deserialize_rejects_wrong_dimension() {
        let err = serde_json::from_str::<Length>("[0.0015, \"degree\"]").unwrap_err();
        assert!(err.to_string().contains("Dimensionality must be"));
    }

    #[test]
    fn test_scalar_deserialize_rejects_third_element() {
        assert!(serde_json::from_str::<Length>("[1.5, \"meter\", \"extra\"]").is_err());
    }

    #[test]
    fn test_from_str_pair() {
        let reg = UnitRegistry::standard();
        let angle = ScalarQuantity::<Radian>::from_str_pair(&reg, "20 mrad").unwrap();
        assert_relative_eq!(angle.to_reference().unwrap(), 0.02, max_relative = 1e-12);
        assert!(ScalarQuantity::<Radian>::from_str_pair(&reg, "x rad").is_err());

        let count = ScalarQuantity::<Pixel, i32>::from_str_pair(&reg, "7 px").unwrap();
        assert_eq!(count.quantity().magnitude().dtype(), Dtype::Int32);
    }

    #[test]
    fn test_from_str_pair_uses_given_registry() {
        let reg = UnitRegistryBuilder::standard()
            .define(UnitDef::new("fathom", Some("ftm"), Dimension::LENGTH, 1.8288))
            .unwrap()
            .build();
        let depth = Length::from_str_pair(&reg, "2 ftm").unwrap();
        assert_relative_eq!(depth.to_reference().unwrap(), 3.6576, max_relative = 1e-12);

        let err = Length::from_str_pair(&UnitRegistry::standard(), "2 ftm").unwrap_err();
        assert!(matches!(err, QuantityError::UnknownUnit { .. }));
    }

    #[test]
    fn test_validator_built_once_per_field_type() {
        assert!(std::ptr::eq(Length::value_type(), Length::value_type()));
        assert!(std::ptr::eq(Rotation::value_type(), Rotation::value_type()));

        let single = ScalarQuantity::<Meter, f32>::value_type();
        assert!(!std::ptr::eq(single, Length::value_type()));
        assert_eq!(single.dtype(), Dtype::Float32);
        assert_eq!(Length::value_type().dtype(), Dtype::Float64);
        assert_eq!(Rotation::value_type().shape().to_string(), "2 rows, 2 cols");
    }

    #[test]
    fn test_u64_field_rejects_unrepresentable_value() {
        let reg = UnitRegistry::standard();
        type Count = ScalarQuantity<Pixel, u64>;
        let err = Count::with_unit(&reg, u64::MAX, "px").unwrap_err();
        assert!(matches!(err, QuantityError::InputShape { .. }));

        let count = Count::with_unit(&reg, 4096, "px").unwrap();
        assert_eq!(serde_json::to_string(&count).unwrap(), "[4096,\"pixel\"]");
    }

    #[test]
    fn test_with_unit() {
        let reg = UnitRegistry::standard();
        let length = ScalarQuantity::<Millimeter>::with_unit(&reg, 2.5, "cm").unwrap();
        assert_relative_eq!(length.to_reference().unwrap(), 25.0, max_relative = 1e-12);
        assert_eq!(length.encode().unwrap().unit, "millimeter");
    }

    #[test]
    fn test_array_field() {
        let reg = UnitRegistry::standard();
        let rot = Rotation::with_unit(&reg, arr2(&[[90.0f32, 0.0], [0.0, 90.0]]).into_dyn(), "deg")
            .unwrap();
        let json = serde_json::to_value(&rot).unwrap();
        assert_eq!(json, serde_json::json!([[[90.0, 0.0], [0.0, 90.0]], "degree"]));

        let err = Rotation::decode(&reg, &serde_json::json!([[1.0, 2.0, 3.0], "deg"])).unwrap_err();
        assert!(matches!(err, QuantityError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_any_shape() {
        let reg = UnitRegistry::standard();
        let any = ArrayQuantity::<Meter>::decode(&reg, &serde_json::json!([[[1], [2]], "m"]));
        assert!(any.is_ok());
        assert_eq!(AnyShape::spec().to_string(), "...");
    }
}

//! Scalar quantity validator

use serde_json::Value;

use super::input::QuantityInput;
use super::{check_dimension, check_dtype, check_encodable, check_finite, encode_validated};
use crate::codec::Encoded;
use crate::dtype::Dtype;
use crate::error::{QuantityError, QuantityResult, format_shape};
use crate::schema;
use crate::units::{Quantity, ReferenceUnit, Unit, UnitRegistry};

/// Validator for a single value with a unit of a fixed dimension
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarQuantityType {
    reference: Unit,
    dtype: Dtype,
}

impl ScalarQuantityType {
    pub fn new(reference: Unit, dtype: Dtype) -> Self {
        Self { reference, dtype }
    }

    /// Validator whose reference is a compile-time unit marker
    pub fn of<R: ReferenceUnit>(dtype: Dtype) -> Self {
        Self::new(R::unit(), dtype)
    }

    /// Validator whose reference unit is looked up by name
    pub fn named(registry: &UnitRegistry, reference: &str, dtype: Dtype) -> QuantityResult<Self> {
        Ok(Self::new(registry.resolve(reference)?, dtype))
    }

    pub fn reference(&self) -> &Unit {
        &self.reference
    }

    pub fn dtype(&self) -> Dtype {
        self.dtype
    }

    /// Validate a native quantity or a `(magnitude, unit)` pair
    ///
    /// The result keeps the unit it was given in.
    pub fn validate(
        &self,
        registry: &UnitRegistry,
        input: impl Into<QuantityInput>,
    ) -> QuantityResult<Quantity> {
        let quantity = input.into().into_quantity(registry)?;
        self.check(quantity)
    }

    fn check(&self, quantity: Quantity) -> QuantityResult<Quantity> {
        if !quantity.magnitude().is_scalar() {
            return Err(QuantityError::input_shape(format!(
                "expected a scalar magnitude, got an array of shape {}",
                format_shape(quantity.magnitude().shape())
            )));
        }
        check_finite(&quantity)?;
        check_dimension(&self.reference, &quantity)?;
        let quantity = check_dtype(self.dtype, quantity)?;
        check_encodable(&self.reference, self.dtype, &quantity)?;
        Ok(quantity)
    }

    /// Canonical wire pair, in the reference unit
    pub fn encode(&self, quantity: &Quantity) -> QuantityResult<Encoded> {
        let validated = self.check(quantity.clone())?;
        encode_validated(&self.reference, self.dtype, &validated)
    }

    /// Validate a wire pair read from a JSON value
    pub fn decode(&self, registry: &UnitRegistry, value: &Value) -> QuantityResult<Quantity> {
        self.validate(registry, QuantityInput::from_value(value)?)
    }

    /// Structural schema for the wire pair
    pub fn json_schema(&self) -> Value {
        schema::scalar_schema(self.reference.name(), self.dtype)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::magnitude::{Magnitude, Number};
    use crate::units::Dimension;
    use crate::units::si::{Centimeter, Meter, Millimeter, Pixel, Radian};
    use approx::assert_relative_eq;
    use serde_json::json;

    fn length() -> ScalarQuantityType {
        ScalarQuantityType::of::<Meter>(Dtype::Float64)
    }

    #[test]
    fn test_pair_keeps_original_unit() {
        let reg = UnitRegistry::standard();
        let q = length()
            .validate(&reg, QuantityInput::pair(Magnitude::scalar(1.5f64), "mm"))
            .unwrap();
        assert_eq!(q.unit().name(), "millimeter");
        assert_eq!(q.magnitude().as_f64(), Some(1.5));
    }

    #[test]
    fn test_angle_rejected_for_length() {
        let reg = UnitRegistry::standard();
        let err = length()
            .validate(&reg, QuantityInput::pair(Magnitude::scalar(0.0015f64), "degree"))
            .unwrap_err();
        assert_eq!(
            err,
            QuantityError::Dimension {
                expected: Dimension::LENGTH,
                actual: Dimension::ANGLE,
            }
        );
    }

    #[test]
    fn test_pixel_and_angle_are_distinct() {
        let reg = UnitRegistry::standard();
        let pixel = ScalarQuantityType::of::<Pixel>(Dtype::Float64);
        let err = pixel.decode(&reg, &json!([3.0, "radian"])).unwrap_err();
        assert!(matches!(err, QuantityError::Dimension { .. }));
    }

    #[test]
    fn test_angstrom_and_meter_encode_identically() {
        let reg = UnitRegistry::standard();
        let t = length();
        let a = t.decode(&reg, &json!([10000, "angstrom"])).unwrap();
        let m = t.decode(&reg, &json!([0.000001, "meter"])).unwrap();

        let ea = t.encode(&a).unwrap();
        let em = t.encode(&m).unwrap();
        assert_eq!(ea.unit, "meter");
        assert_eq!(em.unit, "meter");
        assert_relative_eq!(
            ea.magnitude.as_f64().unwrap(),
            em.magnitude.as_f64().unwrap(),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_encode_uses_declared_reference() {
        let reg = UnitRegistry::standard();
        let t = ScalarQuantityType::of::<Centimeter>(Dtype::Float64);
        let q = t.decode(&reg, &json!([0.25, "m"])).unwrap();
        let encoded = t.encode(&q).unwrap();
        assert_eq!(encoded.unit, "centimeter");
        assert_relative_eq!(encoded.magnitude.as_f64().unwrap(), 25.0);
    }

    #[test]
    fn test_int_rejects_float() {
        let reg = UnitRegistry::standard();
        let t = ScalarQuantityType::of::<Pixel>(Dtype::Int64);
        let err = t.decode(&reg, &json!([0.3, "pixel"])).unwrap_err();
        assert_eq!(
            err,
            QuantityError::DtypeCast {
                from: Dtype::Float,
                to: Dtype::Int64,
            }
        );
    }

    #[test]
    fn test_float_accepts_int() {
        let reg = UnitRegistry::standard();
        let q = length().decode(&reg, &json!([3, "meter"])).unwrap();
        assert_eq!(q.magnitude().dtype(), Dtype::Float64);
        assert_eq!(q.magnitude().as_number(), Some(Number::Float(3.0)));
    }

    #[test]
    fn test_array_magnitude_rejected() {
        let reg = UnitRegistry::standard();
        let err = length().decode(&reg, &json!([[1.0, 2.0], "meter"])).unwrap_err();
        assert!(matches!(err, QuantityError::InputShape { .. }));
    }

    #[test]
    fn test_native_quantity_input() {
        let reg = UnitRegistry::standard();
        let t = ScalarQuantityType::of::<Radian>(Dtype::Float32);
        let native = Quantity::from_pair(&reg, Magnitude::scalar(2.0f32), "mrad").unwrap();
        let q = t.validate(&reg, native).unwrap();
        assert_eq!(q.magnitude().dtype(), Dtype::Float32);
        let encoded = t.encode(&q).unwrap();
        assert_eq!(encoded.magnitude.dtype(), Dtype::Float32);
        assert_relative_eq!(encoded.magnitude.as_f64().unwrap(), 0.002, max_relative = 1e-6);
    }

    #[test]
    fn test_int_encoding_needs_exact_unit() {
        let reg = UnitRegistry::standard();
        let t = ScalarQuantityType::of::<Pixel>(Dtype::Int32);
        let q = t.decode(&reg, &json!([12, "px"])).unwrap();
        let encoded = t.encode(&q).unwrap();
        assert_eq!(encoded.magnitude.as_number(), Some(Number::Int(12)));
        assert_eq!(encoded.magnitude.dtype(), Dtype::Int32);
    }

    #[test]
    fn test_int_field_encodes_integral_conversion() {
        let reg = UnitRegistry::standard();
        let t = ScalarQuantityType::of::<Millimeter>(Dtype::Int64);
        let q = t.decode(&reg, &json!([1, "meter"])).unwrap();
        assert_eq!(q.unit().name(), "meter");

        let encoded = t.encode(&q).unwrap();
        assert_eq!(encoded.unit, "millimeter");
        assert_eq!(encoded.magnitude.dtype(), Dtype::Int64);
        assert_eq!(encoded.magnitude.as_number(), Some(Number::Int(1000)));

        let again = t.decode(&reg, &encoded.to_value().unwrap()).unwrap();
        assert_eq!(t.encode(&again).unwrap(), encoded);
    }

    #[test]
    fn test_int_field_rejects_fractional_conversion() {
        let reg = UnitRegistry::standard();
        let t = ScalarQuantityType::of::<Meter>(Dtype::Int64);
        let err = t.decode(&reg, &json!([1, "mm"])).unwrap_err();
        assert_eq!(
            err,
            QuantityError::DtypeCast {
                from: Dtype::Float64,
                to: Dtype::Int64,
            }
        );

        let native = Quantity::from_pair(&reg, Magnitude::scalar(3i64), "cm").unwrap();
        assert!(matches!(
            t.validate(&reg, native),
            Err(QuantityError::DtypeCast { .. })
        ));
    }

    #[test]
    fn test_int_field_rejects_out_of_range_conversion() {
        let reg = UnitRegistry::standard();
        let t = ScalarQuantityType::of::<Millimeter>(Dtype::UInt8);
        assert!(t.decode(&reg, &json!([0.2, "meter"])).is_err());
        assert!(t.decode(&reg, &json!([1, "meter"])).is_err());
        assert!(t.decode(&reg, &json!([25, "cm"])).is_ok());
    }

    #[test]
    fn test_non_finite_rejected() {
        let reg = UnitRegistry::standard();
        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let native = Quantity::from_pair(&reg, Magnitude::scalar(value), "mm").unwrap();
            let err = length().validate(&reg, native.clone()).unwrap_err();
            assert!(matches!(err, QuantityError::InputShape { .. }), "{:?}", err);
            assert!(length().encode(&native).is_err());
        }

        let complex = ScalarQuantityType::of::<Meter>(Dtype::Complex128);
        let native = Quantity::from_pair(
            &reg,
            Magnitude::scalar(num_complex::Complex64::new(1.0, f64::NAN)),
            "m",
        )
        .unwrap();
        assert!(complex.validate(&reg, native).is_err());
    }

    #[test]
    fn test_toml_nan_rejected() {
        #[derive(serde::Deserialize)]
        struct Doc {
            q: super::super::WirePair,
        }
        let reg = UnitRegistry::standard();
        let doc: Doc = toml::from_str("q = [nan, \"meter\"]").unwrap();
        let err = length().validate(&reg, doc.q).unwrap_err();
        assert!(matches!(err, QuantityError::InputShape { .. }));
    }

    #[test]
    fn test_complex_never_narrows_to_real() {
        let reg = UnitRegistry::standard();
        let err = length()
            .decode(&reg, &json!([{ "real": 1.0, "imag": 0.0 }, "m"]))
            .unwrap_err();
        assert_eq!(
            err,
            QuantityError::DtypeCast {
                from: Dtype::Complex,
                to: Dtype::Float64,
            }
        );
    }

    #[test]
    fn test_unknown_unit() {
        let reg = UnitRegistry::standard();
        let err = length().decode(&reg, &json!([1.0, "furlong"])).unwrap_err();
        assert!(matches!(err, QuantityError::UnknownUnit { .. }));
    }
}

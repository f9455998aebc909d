//! Array quantity validator

use serde_json::Value;

use super::input::QuantityInput;
use super::{check_dimension, check_dtype, check_encodable, check_finite, encode_validated};
use crate::codec::Encoded;
use crate::dtype::Dtype;
use crate::error::QuantityResult;
use crate::schema;
use crate::shape::ShapeSpec;
use crate::units::{Quantity, ReferenceUnit, Unit, UnitRegistry};

/// Validator for an N-dimensional array with a unit of a fixed dimension
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayQuantityType {
    reference: Unit,
    shape: ShapeSpec,
    dtype: Dtype,
}

impl ArrayQuantityType {
    pub fn new(reference: Unit, shape: ShapeSpec, dtype: Dtype) -> Self {
        Self {
            reference,
            shape,
            dtype,
        }
    }

    pub fn of<R: ReferenceUnit>(shape: ShapeSpec, dtype: Dtype) -> Self {
        Self::new(R::unit(), shape, dtype)
    }

    pub fn reference(&self) -> &Unit {
        &self.reference
    }

    pub fn shape(&self) -> &ShapeSpec {
        &self.shape
    }

    pub fn dtype(&self) -> Dtype {
        self.dtype
    }

    /// Validate a native quantity or a `(magnitude, unit)` pair
    pub fn validate(
        &self,
        registry: &UnitRegistry,
        input: impl Into<QuantityInput>,
    ) -> QuantityResult<Quantity> {
        let quantity = input.into().into_quantity(registry)?;
        self.check(quantity)
    }

    fn check(&self, quantity: Quantity) -> QuantityResult<Quantity> {
        check_finite(&quantity)?;
        check_dimension(&self.reference, &quantity)?;
        self.shape.check(quantity.magnitude().shape())?;
        let quantity = check_dtype(self.dtype, quantity)?;
        check_encodable(&self.reference, self.dtype, &quantity)?;
        Ok(quantity)
    }

    /// Canonical wire pair, in the reference unit
    pub fn encode(&self, quantity: &Quantity) -> QuantityResult<Encoded> {
        let validated = self.check(quantity.clone())?;
        encode_validated(&self.reference, self.dtype, &validated)
    }

    pub fn decode(&self, registry: &UnitRegistry, value: &Value) -> QuantityResult<Quantity> {
        self.validate(registry, QuantityInput::from_value(value)?)
    }

    /// Structural schema for the wire pair, with nested arrays per axis
    pub fn json_schema(&self) -> Value {
        schema::array_schema(self.reference.name(), &self.shape, self.dtype)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QuantityError;
    use crate::magnitude::Magnitude;
    use crate::units::Dimension;
    use crate::units::si::{Meter, Nanometer, Pixel};
    use approx::assert_relative_eq;
    use ndarray::{ArrayD, IxDyn, arr2};
    use serde_json::json;

    fn matrix() -> ArrayQuantityType {
        ArrayQuantityType::of::<Meter>(ShapeSpec::parse("2 rows, 2 cols").unwrap(), Dtype::Float64)
    }

    #[test]
    fn test_matching_shape_accepted() {
        let reg = UnitRegistry::standard();
        let q = matrix().decode(&reg, &json!([[[1, 2], [3, 4]], "mm"])).unwrap();
        assert_eq!(q.magnitude().shape(), &[2, 2]);
        assert_eq!(q.magnitude().dtype(), Dtype::Float64);
        assert_eq!(q.unit().name(), "millimeter");
    }

    #[test]
    fn test_shape_mismatch() {
        let reg = UnitRegistry::standard();
        let err = matrix()
            .decode(&reg, &json!([[[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]], "meter"]))
            .unwrap_err();
        assert_eq!(
            err,
            QuantityError::ShapeMismatch {
                expected: "2 rows, 2 cols".to_string(),
                actual: vec![3, 2],
            }
        );
        assert_eq!(
            err.to_string(),
            "Shape mismatch: expected (2 rows, 2 cols), got (3, 2)"
        );
    }

    #[test]
    fn test_dimension_checked_before_shape() {
        let reg = UnitRegistry::standard();
        let err = matrix().decode(&reg, &json!([[1.0, 2.0, 3.0], "pixel"])).unwrap_err();
        assert_eq!(
            err,
            QuantityError::Dimension {
                expected: Dimension::LENGTH,
                actual: Dimension::PIXEL,
            }
        );
    }

    #[test]
    fn test_shape_checked_before_dtype() {
        let reg = UnitRegistry::standard();
        let t = ArrayQuantityType::of::<Pixel>(ShapeSpec::parse("2").unwrap(), Dtype::Int32);
        let err = t.decode(&reg, &json!([[0.5, 1.5, 2.5], "px"])).unwrap_err();
        assert!(matches!(err, QuantityError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_encode_converts_every_element() {
        let reg = UnitRegistry::standard();
        let t = ArrayQuantityType::of::<Nanometer>(ShapeSpec::parse("*").unwrap(), Dtype::Float64);
        let native = Quantity::from_pair(
            &reg,
            Magnitude::array(ArrayD::from_shape_vec(IxDyn(&[3]), vec![1.0f64, 2.0, 3.0]).unwrap()),
            "angstrom",
        )
        .unwrap();
        let encoded = t.encode(&native).unwrap();
        assert_eq!(encoded.unit, "nanometer");
        let values = encoded.magnitude.to_f64_array().unwrap();
        for (got, want) in values.iter().zip([0.1, 0.2, 0.3]) {
            assert_relative_eq!(*got, want, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_native_ndarray_input() {
        let reg = UnitRegistry::standard();
        let data = arr2(&[[1.0f32, 0.0], [0.0, 1.0]]).into_dyn();
        let q = Quantity::from_pair(&reg, Magnitude::array(data), "m").unwrap();
        let t = ArrayQuantityType::of::<Meter>(ShapeSpec::parse("N, N").unwrap(), Dtype::Float32);
        assert!(t.validate(&reg, q).is_ok());
    }

    #[test]
    fn test_int_array_encodes_integral_conversion() {
        let reg = UnitRegistry::standard();
        let t = ArrayQuantityType::of::<Nanometer>(ShapeSpec::parse("*").unwrap(), Dtype::Int32);
        let q = t.decode(&reg, &json!([[1, 2, 30], "angstrom"]));
        assert!(matches!(q, Err(QuantityError::DtypeCast { .. })));

        let q = t.decode(&reg, &json!([[1, 2, 30], "micrometer"])).unwrap();
        let encoded = t.encode(&q).unwrap();
        assert_eq!(encoded.magnitude.dtype(), Dtype::Int32);
        assert_eq!(
            serde_json::to_value(&encoded).unwrap(),
            json!([[1000, 2000, 30000], "nanometer"])
        );
    }

    #[test]
    fn test_non_finite_element_rejected() {
        let reg = UnitRegistry::standard();
        let data = ndarray::arr1(&[1.0f64, f64::NAN]).into_dyn();
        let q = Quantity::from_pair(&reg, Magnitude::array(data), "m").unwrap();
        let t = ArrayQuantityType::of::<Meter>(ShapeSpec::parse("2").unwrap(), Dtype::Float64);
        assert!(matches!(
            t.validate(&reg, q),
            Err(QuantityError::InputShape { .. })
        ));
    }

    #[test]
    fn test_float32_array_not_promoted() {
        let reg = UnitRegistry::standard();
        let data = arr2(&[[1.0f32, 0.0], [0.0, 1.0]]).into_dyn();
        let q = Quantity::from_pair(&reg, Magnitude::array(data), "m").unwrap();
        let err = matrix().validate(&reg, q).unwrap_err();
        assert_eq!(
            err,
            QuantityError::DtypeCast {
                from: Dtype::Float32,
                to: Dtype::Float64,
            }
        );
    }
}

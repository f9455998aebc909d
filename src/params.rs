//! 4D-STEM acquisition parameters
//!
//! A flat record of quantity fields. Each field validates on its own; the
//! record collects every field failure into one [`RecordError`].

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::codec::ScalarQuantity;
use crate::dtype::Element;
use crate::error::QuantityError;
use crate::units::UnitRegistry;
use crate::units::si::{self, Meter, Radian, ReferenceUnit};

pub type Length = ScalarQuantity<Meter, f64>;
pub type Angle = ScalarQuantity<Radian, f64>;
pub type Pixel = ScalarQuantity<si::Pixel, f64>;

const RECORD: &str = "Simple4DSTEMParams";

/// Geometry of a simple 4D-STEM experiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Simple4DSTEMParams {
    pub overfocus: Length,
    pub scan_pixel_pitch: Length,
    pub camera_length: Length,
    pub detector_pixel_pitch: Length,
    pub semiconv: Angle,
    pub scan_rotation: Angle,
    pub cy: Pixel,
    pub cx: Pixel,
    pub flip_y: bool,
}

/// One failing field of a record
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum FieldError {
    #[error("{field}: field required")]
    #[diagnostic(code(R0001))]
    Missing { field: &'static str },

    #[error("{field}: {source}")]
    #[diagnostic(code(R0002))]
    Invalid {
        field: &'static str,
        source: QuantityError,
    },

    #[error("{field}: expected {expected}, got {actual}")]
    #[diagnostic(code(R0003))]
    WrongType {
        field: &'static str,
        expected: &'static str,
        actual: String,
    },

    #[error("expected a table of fields, got {actual}")]
    #[diagnostic(code(R0004))]
    NotATable { actual: String },
}

impl FieldError {
    /// Field name, if the error belongs to one field
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Missing { field } | Self::Invalid { field, .. } | Self::WrongType { field, .. } => {
                Some(*field)
            }
            Self::NotATable { .. } => None,
        }
    }
}

/// Every field failure of one record validation
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
#[error("{} validation error(s) for {record}", .errors.len())]
#[diagnostic(code(R0000))]
pub struct RecordError {
    pub record: &'static str,
    #[related]
    pub errors: Vec<FieldError>,
}

/// Failure to write a record as a canonical document
#[derive(Debug, Error, Diagnostic)]
pub enum DocumentError {
    #[error("{field}: {source}")]
    #[diagnostic(code(R0005))]
    Encode {
        field: &'static str,
        source: QuantityError,
    },

    #[error("{field}: cannot serialize encoded value: {source}")]
    #[diagnostic(code(R0006))]
    Serialize {
        field: &'static str,
        source: serde_json::Error,
    },
}

fn encoded_field<R: ReferenceUnit, E: Element>(
    field: &'static str,
    quantity: &ScalarQuantity<R, E>,
) -> Result<Value, DocumentError> {
    let encoded = quantity
        .encode()
        .map_err(|source| DocumentError::Encode { field, source })?;
    encoded
        .to_value()
        .map_err(|source| DocumentError::Serialize { field, source })
}

fn quantity_field<R: ReferenceUnit, E: Element>(
    registry: &UnitRegistry,
    fields: &Map<String, Value>,
    field: &'static str,
    errors: &mut Vec<FieldError>,
) -> Option<ScalarQuantity<R, E>> {
    let Some(value) = fields.get(field) else {
        errors.push(FieldError::Missing { field });
        return None;
    };
    match ScalarQuantity::decode(registry, value) {
        Ok(quantity) => Some(quantity),
        Err(source) => {
            tracing::debug!(field, error = %source, "invalid quantity field");
            errors.push(FieldError::Invalid { field, source });
            None
        }
    }
}

fn bool_field(
    fields: &Map<String, Value>,
    field: &'static str,
    errors: &mut Vec<FieldError>,
) -> Option<bool> {
    match fields.get(field) {
        Some(Value::Bool(b)) => Some(*b),
        Some(other) => {
            errors.push(FieldError::WrongType {
                field,
                expected: "a boolean",
                actual: other.to_string(),
            });
            None
        }
        None => {
            errors.push(FieldError::Missing { field });
            None
        }
    }
}

impl Simple4DSTEMParams {
    /// Validate a decoded document, reporting every failing field
    ///
    /// Unknown fields are ignored.
    pub fn from_document(registry: &UnitRegistry, document: &Value) -> Result<Self, RecordError> {
        let Some(fields) = document.as_object() else {
            return Err(RecordError {
                record: RECORD,
                errors: vec![FieldError::NotATable {
                    actual: document.to_string(),
                }],
            });
        };

        let mut errors = Vec::new();
        let overfocus: Option<Length> = quantity_field(registry, fields, "overfocus", &mut errors);
        let scan_pixel_pitch: Option<Length> =
            quantity_field(registry, fields, "scan_pixel_pitch", &mut errors);
        let camera_length: Option<Length> =
            quantity_field(registry, fields, "camera_length", &mut errors);
        let detector_pixel_pitch: Option<Length> =
            quantity_field(registry, fields, "detector_pixel_pitch", &mut errors);
        let semiconv: Option<Angle> = quantity_field(registry, fields, "semiconv", &mut errors);
        let scan_rotation: Option<Angle> =
            quantity_field(registry, fields, "scan_rotation", &mut errors);
        let cy: Option<Pixel> = quantity_field(registry, fields, "cy", &mut errors);
        let cx: Option<Pixel> = quantity_field(registry, fields, "cx", &mut errors);
        let flip_y = bool_field(fields, "flip_y", &mut errors);

        match (
            overfocus,
            scan_pixel_pitch,
            camera_length,
            detector_pixel_pitch,
            semiconv,
            scan_rotation,
            cy,
            cx,
            flip_y,
        ) {
            (
                Some(overfocus),
                Some(scan_pixel_pitch),
                Some(camera_length),
                Some(detector_pixel_pitch),
                Some(semiconv),
                Some(scan_rotation),
                Some(cy),
                Some(cx),
                Some(flip_y),
            ) => Ok(Self {
                overfocus,
                scan_pixel_pitch,
                camera_length,
                detector_pixel_pitch,
                semiconv,
                scan_rotation,
                cy,
                cx,
                flip_y,
            }),
            _ => Err(RecordError {
                record: RECORD,
                errors,
            }),
        }
    }

    /// Canonical document with every quantity in its reference unit
    pub fn to_document(&self) -> Result<Value, DocumentError> {
        let fields = [
            ("overfocus", encoded_field("overfocus", &self.overfocus)?),
            ("scan_pixel_pitch", encoded_field("scan_pixel_pitch", &self.scan_pixel_pitch)?),
            ("camera_length", encoded_field("camera_length", &self.camera_length)?),
            (
                "detector_pixel_pitch",
                encoded_field("detector_pixel_pitch", &self.detector_pixel_pitch)?,
            ),
            ("semiconv", encoded_field("semiconv", &self.semiconv)?),
            ("scan_rotation", encoded_field("scan_rotation", &self.scan_rotation)?),
            ("cy", encoded_field("cy", &self.cy)?),
            ("cx", encoded_field("cx", &self.cx)?),
            ("flip_y", Value::Bool(self.flip_y)),
        ];
        Ok(Value::Object(
            fields
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        ))
    }

    /// JSON schema for the whole record
    pub fn json_schema() -> Value {
        json!({
            "title": RECORD,
            "type": "object",
            "properties": {
                "overfocus": Length::json_schema(),
                "scan_pixel_pitch": Length::json_schema(),
                "camera_length": Length::json_schema(),
                "detector_pixel_pitch": Length::json_schema(),
                "semiconv": Angle::json_schema(),
                "scan_rotation": Angle::json_schema(),
                "cy": Pixel::json_schema(),
                "cx": Pixel::json_schema(),
                "flip_y": { "type": "boolean" }
            },
            "required": [
                "overfocus",
                "scan_pixel_pitch",
                "camera_length",
                "detector_pixel_pitch",
                "semiconv",
                "scan_rotation",
                "cy",
                "cx",
                "flip_y"
            ]
        })
    }
}

//! JSON schema fragments for quantity encodings
//!
//! A quantity is described as a two-item array: a numeric (or nested array)
//! schema for the magnitude, then a single-value `enum` holding the reference
//! unit name. A structural validator can check the layout and the literal
//! unit, but not physical dimensions or unit conversion, so documents passing
//! the schema may still fail in-process validation.
//!
//! [`conforms`] implements the subset of JSON Schema these fragments use.

use std::cmp::Ordering;

use serde_json::{Map, Value, json};

use crate::dtype::{Dtype, NumericKind};
use crate::shape::{Axis, ShapeSpec};

/// Note attached to every emitted quantity schema
pub const STRUCTURAL_ONLY: &str = "Structural check only: the unit must be spelled exactly as the \
reference unit, and physical dimensions are not verified. In-process validation is stricter.";

/// Schema for one element of the given type
pub fn dtype_schema(dtype: Dtype) -> Value {
    match dtype.kind() {
        NumericKind::Integer => {
            let mut schema = Map::new();
            schema.insert("type".into(), json!("integer"));
            if let Some((lo, hi)) = dtype.int_range() {
                if lo > i64::MIN {
                    schema.insert("minimum".into(), json!(lo));
                }
                if hi < i64::MAX {
                    schema.insert("maximum".into(), json!(hi));
                }
            }
            Value::Object(schema)
        }
        NumericKind::Float => json!({ "type": "number" }),
        NumericKind::Complex => json!({
            "type": "object",
            "properties": {
                "real": { "type": "number" },
                "imag": { "type": "number" }
            },
            "required": ["real", "imag"],
            "additionalProperties": false
        }),
    }
}

fn axes_schema(axes: &[Axis], leaf: Value) -> Value {
    match axes.split_first() {
        None => leaf,
        // Arbitrary nesting cannot be bounded without references
        Some((Axis::Rest, _)) => json!({ "anyOf": [leaf, { "type": "array" }] }),
        Some((axis, rest)) => {
            let mut schema = Map::new();
            schema.insert("type".into(), json!("array"));
            schema.insert("items".into(), axes_schema(rest, leaf));
            if let Axis::Size { len, .. } = axis {
                schema.insert("minItems".into(), json!(len));
                schema.insert("maxItems".into(), json!(len));
            }
            Value::Object(schema)
        }
    }
}

/// Schema for a magnitude of the given shape and element type
pub fn magnitude_schema(shape: &ShapeSpec, dtype: Dtype) -> Value {
    axes_schema(shape.axes(), dtype_schema(dtype))
}

fn pair_schema(reference: &str, magnitude: Value) -> Value {
    json!({
        "type": "array",
        "description": STRUCTURAL_ONLY,
        "prefixItems": [magnitude, { "enum": [reference] }],
        "items": false,
        "minItems": 2,
        "maxItems": 2
    })
}

/// Schema for a scalar quantity encoded as `[number, reference]`
pub fn scalar_schema(reference: &str, dtype: Dtype) -> Value {
    pair_schema(reference, dtype_schema(dtype))
}

/// Schema for an array quantity encoded as `[nested, reference]`
pub fn array_schema(reference: &str, shape: &ShapeSpec, dtype: Dtype) -> Value {
    pair_schema(reference, magnitude_schema(shape, dtype))
}

// =============================================================================
// Conformance
// =============================================================================

/// Check `value` against `schema`
pub fn conforms(schema: &Value, value: &Value) -> bool {
    violations(schema, value).is_empty()
}

/// All violations, each prefixed with a JSON pointer to the offending value
pub fn violations(schema: &Value, value: &Value) -> Vec<String> {
    let mut out = Vec::new();
    check(schema, value, "", &mut out);
    out
}

fn type_matches(expected: &str, value: &Value) -> bool {
    match expected {
        "null" => value.is_null(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "string" => value.is_string(),
        "number" => value.is_number(),
        // Integral floats such as 1.0 do not count
        "integer" => value.is_i64() || value.is_u64(),
        _ => false,
    }
}

fn as_i128(value: &Value) -> Option<i128> {
    value
        .as_i64()
        .map(i128::from)
        .or_else(|| value.as_u64().map(i128::from))
}

fn compare(value: &Value, bound: &Value) -> Option<Ordering> {
    match (as_i128(value), as_i128(bound)) {
        (Some(v), Some(b)) => Some(v.cmp(&b)),
        _ => value.as_f64()?.partial_cmp(&bound.as_f64()?),
    }
}

fn check(schema: &Value, value: &Value, path: &str, out: &mut Vec<String>) {
    let schema = match schema {
        Value::Bool(true) => return,
        Value::Bool(false) => {
            out.push(format!("{}: no value allowed here", display_path(path)));
            return;
        }
        Value::Object(schema) => schema,
        _ => return,
    };
    let at = display_path(path);

    if let Some(Value::String(expected)) = schema.get("type")
        && !type_matches(expected, value)
    {
        out.push(format!("{}: expected {}, got {}", at, expected, value));
        return;
    }

    if let Some(Value::Array(allowed)) = schema.get("enum")
        && !allowed.contains(value)
    {
        out.push(format!("{}: {} is not one of {}", at, value, Value::Array(allowed.clone())));
    }

    if let Some(bound) = schema.get("minimum")
        && compare(value, bound) == Some(Ordering::Less)
    {
        out.push(format!("{}: {} is less than the minimum {}", at, value, bound));
    }
    if let Some(bound) = schema.get("maximum")
        && compare(value, bound) == Some(Ordering::Greater)
    {
        out.push(format!("{}: {} is greater than the maximum {}", at, value, bound));
    }

    if let Some(Value::Array(branches)) = schema.get("anyOf")
        && !branches.iter().any(|b| violations(b, value).is_empty())
    {
        out.push(format!("{}: matches none of the allowed forms", at));
    }

    if let Value::Array(items) = value {
        if let Some(min) = schema.get("minItems").and_then(Value::as_u64)
            && (items.len() as u64) < min
        {
            out.push(format!("{}: expected at least {} items, got {}", at, min, items.len()));
        }
        if let Some(max) = schema.get("maxItems").and_then(Value::as_u64)
            && (items.len() as u64) > max
        {
            out.push(format!("{}: expected at most {} items, got {}", at, max, items.len()));
        }

        let prefix = match schema.get("prefixItems") {
            Some(Value::Array(prefix)) => prefix.as_slice(),
            _ => &[],
        };
        for (i, item) in items.iter().enumerate() {
            let item_path = format!("{}/{}", path, i);
            match (prefix.get(i), schema.get("items")) {
                (Some(s), _) => check(s, item, &item_path, out),
                (None, Some(s)) => check(s, item, &item_path, out),
                (None, None) => {}
            }
        }
    }

    if let Value::Object(fields) = value {
        if let Some(Value::Array(required)) = schema.get("required") {
            for name in required.iter().filter_map(Value::as_str) {
                if !fields.contains_key(name) {
                    out.push(format!("{}: missing required property `{}`", at, name));
                }
            }
        }

        let properties = schema.get("properties").and_then(Value::as_object);
        for (name, field) in fields {
            let field_path = format!("{}/{}", path, name);
            match properties.and_then(|p| p.get(name)) {
                Some(s) => check(s, field, &field_path, out),
                None => {
                    if let Some(extra) = schema.get("additionalProperties") {
                        check(extra, field, &field_path, out);
                    }
                }
            }
        }
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() { "/" } else { path }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_schema_layout() {
        let schema = scalar_schema("meter", Dtype::Float64);
        assert_eq!(schema["prefixItems"][0], json!({ "type": "number" }));
        assert_eq!(schema["prefixItems"][1], json!({ "enum": ["meter"] }));
        assert_eq!(schema["minItems"], 2);
        assert_eq!(schema["maxItems"], 2);
        assert!(schema["description"].as_str().unwrap().contains("In-process"));
    }

    #[test]
    fn test_integer_bounds_for_narrow_types() {
        assert_eq!(
            dtype_schema(Dtype::UInt8),
            json!({ "type": "integer", "minimum": 0, "maximum": 255 })
        );
        assert_eq!(dtype_schema(Dtype::Int64), json!({ "type": "integer" }));
        assert_eq!(dtype_schema(Dtype::Int), json!({ "type": "integer" }));
    }

    #[test]
    fn test_scalar_conformance() {
        let schema = scalar_schema("meter", Dtype::Float64);
        assert!(conforms(&schema, &json!([1.5, "meter"])));
        assert!(conforms(&schema, &json!([2, "meter"])));
        assert!(!conforms(&schema, &json!([1.5, "meter", "extra"])));
        assert!(!conforms(&schema, &json!([1.5])));
        assert!(!conforms(&schema, &json!(["1.5", "meter"])));
        // Literal unit only: a compatible unit still fails structurally
        assert!(!conforms(&schema, &json!([1500.0, "millimeter"])));
    }

    #[test]
    fn test_integer_schema_rejects_floats() {
        let schema = scalar_schema("pixel", Dtype::Int16);
        assert!(conforms(&schema, &json!([12, "pixel"])));
        assert!(!conforms(&schema, &json!([0.3, "pixel"])));
        assert!(!conforms(&schema, &json!([40000, "pixel"])));
    }

    #[test]
    fn test_array_schema_shapes() {
        let shape = ShapeSpec::parse("2 rows, 2 cols").unwrap();
        let schema = array_schema("meter", &shape, Dtype::Float64);
        assert!(conforms(&schema, &json!([[[1, 2], [3, 4]], "meter"])));

        let violations = violations(&schema, &json!([[[1, 2], [3, 4], [5, 6]], "meter"]));
        assert_eq!(violations, vec!["/0: expected at most 2 items, got 3".to_string()]);
    }

    #[test]
    fn test_open_shape_schema() {
        let shape = ShapeSpec::parse("3, ...").unwrap();
        let schema = magnitude_schema(&shape, Dtype::Float32);
        assert!(conforms(&schema, &json!([1.0, 2.0, 3.0])));
        assert!(conforms(&schema, &json!([[1.0], [2.0], [3.0]])));
        assert!(!conforms(&schema, &json!([1.0, 2.0])));
    }

    #[test]
    fn test_complex_schema() {
        let schema = scalar_schema("volt", Dtype::Complex128);
        assert!(conforms(&schema, &json!([{ "real": 1.0, "imag": -2.0 }, "volt"])));
        assert!(!conforms(&schema, &json!([{ "real": 1.0 }, "volt"])));
        assert!(!conforms(&schema, &json!([{ "real": 1.0, "imag": 0.0, "phase": 0.0 }, "volt"])));
        assert!(!conforms(&schema, &json!([1.0, "volt"])));
    }

    #[test]
    fn test_object_properties() {
        let schema = json!({
            "type": "object",
            "properties": { "flip_y": { "type": "boolean" } },
            "required": ["flip_y"]
        });
        assert!(conforms(&schema, &json!({ "flip_y": true, "other": 1 })));
        assert_eq!(
            violations(&schema, &json!({})),
            vec!["/: missing required property `flip_y`".to_string()]
        );
        assert!(!conforms(&schema, &json!({ "flip_y": "yes" })));
    }
}

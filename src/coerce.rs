//! Type coercion and default filling ahead of validation.
//!
//! Environment variables arrive as strings, so before the validation engine
//! sees the reconstructed object every value is coerced towards its declared
//! `type`, and properties absent from the data take the schema's `default`.
//!
//! Coercion table:
//!
//! | to        | from string                  | from number | from boolean | from null |
//! |-----------|------------------------------|-------------|--------------|-----------|
//! | `number`  | numeric text                 | -           | `1` / `0`    | `0`       |
//! | `integer` | integral numeric text        | -           | `1` / `0`    | `0`       |
//! | `string`  | -                            | its text    | its text     | `""`      |
//! | `boolean` | `"true"` / `"false"`         | `1` / `0`   | -            | `false`   |
//! | `null`    | `""`                         | `0`         | `false`      | -         |
//!
//! A value that already matches one of the declared types is left alone, except
//! that an integral float (`9.0`) under `integer` is rewritten as an integer so
//! it deserializes into integer fields. With a list of types, the first
//! successful coercion wins. Values that cannot be coerced are left for the
//! validation engine to report.
//!
//! Numeric text follows JavaScript's unary `+`: surrounding whitespace is
//! ignored, `0x`, `0o` and `0b` prefixes are read as unsigned integers, and
//! `Infinity`/`NaN` are rejected since JSON cannot carry them. Integral values
//! beyond the `i64`/`u64` range (`"1e30"`) stay floats; they satisfy `integer`
//! but will not deserialize into a fixed-width integer field.

use serde_json::{Number, Value};

use crate::config::LoadOptions;

/// Coerce `data` in place towards `schema` and fill defaults, recursively.
pub fn apply(schema: &Value, data: &mut Value, options: &LoadOptions) {
    if options.coerce_types {
        coerce_node(schema, data);
    }

    match data {
        Value::Object(map) => {
            let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
                return;
            };
            for (name, property_schema) in properties {
                if options.use_defaults && !map.contains_key(name) {
                    if let Some(default) = property_schema.get("default") {
                        map.insert(name.clone(), default.clone());
                    }
                }
                if let Some(child) = map.get_mut(name) {
                    apply(property_schema, child, options);
                }
            }
        }
        Value::Array(items) => {
            if let Some(item_schema) = schema.get("items").filter(|s| s.is_object()) {
                for item in items {
                    apply(item_schema, item, options);
                }
            }
        }
        _ => {}
    }
}

fn coerce_node(schema: &Value, data: &mut Value) {
    let types: Vec<&str> = match schema.get("type") {
        Some(Value::String(t)) => vec![t.as_str()],
        Some(Value::Array(ts)) => ts.iter().filter_map(Value::as_str).collect(),
        _ => return,
    };

    if types.iter().any(|t| matches_type(data, t)) {
        if types.contains(&"integer") && !types.contains(&"number") {
            if let Some(integral) = integral_float(data) {
                *data = integral;
            }
        }
        return;
    }

    if let Some(coerced) = types.iter().find_map(|t| coerce_to(data, t)) {
        *data = coerced;
    }
}

/// Check whether a JSON value already satisfies a JSON Schema type name.
pub fn matches_type(value: &Value, type_name: &str) -> bool {
    match type_name {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => match value {
            Value::Number(n) => n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0),
            _ => false,
        },
        "boolean" => value.is_boolean(),
        "null" => value.is_null(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        _ => true,
    }
}

/// Coerce a value to a JSON Schema type, if the coercion table allows it.
pub fn coerce_to(value: &Value, type_name: &str) -> Option<Value> {
    match type_name {
        "string" => match value {
            Value::Number(n) => Some(Value::String(n.to_string())),
            Value::Bool(b) => Some(Value::String(b.to_string())),
            Value::Null => Some(Value::String(String::new())),
            _ => None,
        },
        "number" => to_number(value),
        "integer" => to_number(value).filter(|n| matches_type(n, "integer")),
        "boolean" => match value {
            Value::String(s) if s == "true" => Some(Value::Bool(true)),
            Value::String(s) if s == "false" => Some(Value::Bool(false)),
            Value::Number(n) if n.as_f64() == Some(1.0) => Some(Value::Bool(true)),
            Value::Number(n) if n.as_f64() == Some(0.0) => Some(Value::Bool(false)),
            Value::Null => Some(Value::Bool(false)),
            _ => None,
        },
        "null" => match value {
            Value::String(s) if s.is_empty() => Some(Value::Null),
            Value::Number(n) if n.as_f64() == Some(0.0) => Some(Value::Null),
            Value::Bool(false) => Some(Value::Null),
            _ => None,
        },
        _ => None,
    }
}

fn to_number(value: &Value) -> Option<Value> {
    match value {
        Value::String(s) => parse_number(s),
        Value::Bool(b) => Some(Value::Number(Number::from(i64::from(*b)))),
        Value::Null => Some(Value::Number(Number::from(0))),
        _ => None,
    }
}

/// An `f64` number with no fractional part, as an `i64` number.
fn integral_float(value: &Value) -> Option<Value> {
    let Value::Number(n) = value else {
        return None;
    };
    if !n.is_f64() {
        return None;
    }
    n.as_f64()
        .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
        .map(|f| Value::Number(Number::from(f as i64)))
}

fn parse_number(text: &str) -> Option<Value> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Some(n) = parse_radix(text) {
        return Some(Value::Number(Number::from(n)));
    }
    if let Ok(i) = text.parse::<i64>() {
        return Some(Value::Number(Number::from(i)));
    }
    if let Ok(u) = text.parse::<u64>() {
        return Some(Value::Number(Number::from(u)));
    }
    let f = text.parse::<f64>().ok().filter(|f| f.is_finite())?;
    let number = Value::Number(Number::from_f64(f)?);
    // "1e3" comes back as an integer.
    Some(integral_float(&number).unwrap_or(number))
}

/// `0x1f`, `0o17`, `0b101`. Signs are not allowed after a prefix.
fn parse_radix(text: &str) -> Option<u64> {
    let (radix, digits) = match text.get(..2)? {
        "0x" | "0X" => (16, &text[2..]),
        "0o" | "0O" => (8, &text[2..]),
        "0b" | "0B" => (2, &text[2..]),
        _ => return None,
    };
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return None;
    }
    u64::from_str_radix(digits, radix).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn coerced(schema: Value, mut data: Value) -> Value {
        apply(&schema, &mut data, &LoadOptions::default());
        data
    }

    #[test]
    fn test_numeric_string_to_integer() {
        assert_eq!(coerced(json!({"type": "integer"}), json!("9")), json!(9));
        assert_eq!(coerced(json!({"type": "integer"}), json!(" 42 ")), json!(42));
        assert_eq!(coerced(json!({"type": "integer"}), json!("1e3")), json!(1000));
    }

    #[test]
    fn test_integral_float_becomes_integer() {
        let schema = json!({"type": "integer"});

        let data = coerced(schema.clone(), json!(9.0));

        assert_eq!(data, json!(9));
        assert!(data.is_i64());
        assert_eq!(coerced(schema, json!(9.5)), json!(9.5));
        assert!(coerced(json!({"type": "number"}), json!(9.0)).is_f64());
    }

    #[test]
    fn test_prefixed_and_wide_numeric_text() {
        assert_eq!(coerced(json!({"type": "integer"}), json!("0x10")), json!(16));
        assert_eq!(coerced(json!({"type": "number"}), json!("0b101")), json!(5));
        assert_eq!(coerced(json!({"type": "integer"}), json!("0o17")), json!(15));
        assert_eq!(coerced(json!({"type": "integer"}), json!("0x")), json!("0x"));
        assert_eq!(coerced(json!({"type": "integer"}), json!("-0x10")), json!("-0x10"));
        assert_eq!(
            coerced(json!({"type": "integer"}), json!("18446744073709551615")),
            json!(u64::MAX)
        );
        assert_eq!(coerced(json!({"type": "integer"}), json!("1e30")), json!(1e30));
        assert_eq!(
            coerced(json!({"type": "number"}), json!("Infinity")),
            json!("Infinity")
        );
    }

    #[test]
    fn test_non_integral_string_stays_for_validation() {
        assert_eq!(coerced(json!({"type": "integer"}), json!("9.5")), json!("9.5"));
        assert_eq!(coerced(json!({"type": "integer"}), json!("abc")), json!("abc"));
        assert_eq!(coerced(json!({"type": "number"}), json!("")), json!(""));
    }

    #[test]
    fn test_number_from_string_and_bool() {
        assert_eq!(coerced(json!({"type": "number"}), json!("2.5")), json!(2.5));
        assert_eq!(coerced(json!({"type": "number"}), json!(true)), json!(1));
        assert_eq!(coerced(json!({"type": "number"}), json!(null)), json!(0));
        assert_eq!(coerced(json!({"type": "number"}), json!("NaN")), json!("NaN"));
    }

    #[test]
    fn test_boolean_coercion() {
        assert_eq!(coerced(json!({"type": "boolean"}), json!("true")), json!(true));
        assert_eq!(coerced(json!({"type": "boolean"}), json!("false")), json!(false));
        assert_eq!(coerced(json!({"type": "boolean"}), json!(0)), json!(false));
        assert_eq!(coerced(json!({"type": "boolean"}), json!("yes")), json!("yes"));
    }

    #[test]
    fn test_string_coercion() {
        assert_eq!(coerced(json!({"type": "string"}), json!(100)), json!("100"));
        assert_eq!(coerced(json!({"type": "string"}), json!(false)), json!("false"));
        assert_eq!(coerced(json!({"type": "string"}), json!(null)), json!(""));
    }

    #[test]
    fn test_null_coercion() {
        assert_eq!(coerced(json!({"type": "null"}), json!("")), json!(null));
        assert_eq!(coerced(json!({"type": "null"}), json!(0)), json!(null));
        assert_eq!(coerced(json!({"type": "null"}), json!("x")), json!("x"));
    }

    #[test]
    fn test_matching_type_in_union_is_kept() {
        assert_eq!(
            coerced(json!({"type": ["string", "integer"]}), json!("9")),
            json!("9")
        );
        assert_eq!(
            coerced(json!({"type": ["integer", "null"]}), json!("")),
            json!(null)
        );
    }

    #[test]
    fn test_falsy_values_are_not_replaced() {
        let schema = json!({
            "type": "object",
            "properties": {
                "timeoutInMs": { "type": "integer", "default": 1000 },
                "isEnabled": { "type": "boolean", "default": true }
            }
        });

        assert_eq!(
            coerced(schema, json!({"timeoutInMs": 0, "isEnabled": false})),
            json!({"timeoutInMs": 0, "isEnabled": false})
        );
    }

    #[test]
    fn test_defaults_fill_missing_properties() {
        let schema = json!({
            "type": "object",
            "properties": {
                "isEnabled": { "type": "boolean", "default": true },
                "database": {
                    "type": "object",
                    "properties": { "poolSize": { "type": "integer", "default": "5" } }
                }
            }
        });

        assert_eq!(
            coerced(schema, json!({"database": {}})),
            json!({"isEnabled": true, "database": {"poolSize": 5}})
        );
    }

    #[test]
    fn test_options_disable_coercion_and_defaults() {
        let schema = json!({
            "type": "object",
            "properties": {
                "port": { "type": "integer" },
                "debug": { "type": "boolean", "default": false }
            }
        });
        let options = LoadOptions::default()
            .coerce_types(false)
            .use_defaults(false);
        let mut data = json!({"port": "8080"});

        apply(&schema, &mut data, &options);

        assert_eq!(data, json!({"port": "8080"}));
    }

    #[test]
    fn test_array_items() {
        assert_eq!(
            coerced(
                json!({"type": "array", "items": {"type": "integer"}}),
                json!(["1", "2"])
            ),
            json!([1, 2])
        );
    }
}

//! Lenient conversions for loosely typed export fields.
//!
//! None of these fail: anything that cannot be interpreted maps to a fixed
//! default (`false`, `0`, `""`).

use folio_ur::Value;

use super::BytesOrText;

/// `true`, `"true"`, `"1"`, `"yes"` (trimmed, any case) and non-zero numbers
pub fn coerce_bool(value: &Value) -> bool {
    match value.untagged() {
        Value::Bool(flag) => *flag,
        Value::Text(text) => {
            let text = text.trim();
            ["true", "1", "yes"].iter().any(|truthy| text.eq_ignore_ascii_case(truthy))
        }
        Value::Integer(int) => *int != 0,
        Value::Float(float) => *float != 0.0 && !float.is_nan(),
        _ => false,
    }
}

/// Integers, finite floats (truncated toward zero) and numeric text, else `default`
pub fn coerce_number(value: &Value, default: i64) -> i64 {
    match value.untagged() {
        Value::Integer(int) => i64::try_from(*int).unwrap_or(default),
        Value::Float(float) => float_to_int(*float).unwrap_or(default),
        Value::Text(text) => parse_number(text).unwrap_or(default),
        _ => default,
    }
}

/// Native numbers only, text does not qualify
pub fn native_integer(value: &Value) -> Option<i64> {
    match value.untagged() {
        Value::Integer(int) => i64::try_from(*int).ok(),
        Value::Float(float) if float.fract() == 0.0 => float_to_int(*float),
        _ => None,
    }
}

/// Text as is, scalars stringified, bytes as lowercase hex, anything else empty
pub fn coerce_string(value: &Value) -> String {
    match value.untagged() {
        Value::Text(text) => text.clone(),
        Value::Integer(int) => int.to_string(),
        Value::Float(float) => float.to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Bytes(bytes) => hex::encode(bytes),
        _ => String::new(),
    }
}

pub fn coerce_bytes_or_text(value: &Value) -> BytesOrText {
    match value.untagged() {
        Value::Bytes(bytes) => BytesOrText::Bytes(bytes.clone()),
        other => BytesOrText::Text(coerce_string(other)),
    }
}

fn parse_number(text: &str) -> Option<i64> {
    let text = text.trim();
    if let Ok(int) = text.parse::<i64>() {
        return Some(int);
    }

    text.parse::<f64>().ok().and_then(float_to_int)
}

fn float_to_int(float: f64) -> Option<i64> {
    if !float.is_finite() {
        return None;
    }

    let truncated = float.trunc();
    if truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
        return None;
    }

    Some(truncated as i64)
}

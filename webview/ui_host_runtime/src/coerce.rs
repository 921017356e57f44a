//! Loose value coercions for host payloads.
//!
//! The host sends whatever its own dictionaries hold, so every field read goes
//! through one of these helpers instead of a strict schema.

use serde::de::{Deserialize, DeserializeOwned, Deserializer};
use serde_json::Value;

/// Truthiness as the markup layer understands it: `null`, `false`, `0`, `""`
/// and non-finite numbers are false, everything else is true.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && n.is_finite()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Truthy flag read, absent fields are false.
pub fn flag(value: Option<&Value>) -> bool {
    value.is_some_and(truthy)
}

/// Display text for a truthy value; falsy or absent values yield `None`.
pub fn text(value: Option<&Value>) -> Option<String> {
    value.filter(|v| truthy(v)).map(display)
}

/// Strict numeric read: only JSON numbers count.
pub fn number(value: Option<&Value>) -> Option<f64> {
    value
        .and_then(Value::as_f64)
        .filter(|n| n.is_finite())
}

/// `deserialize_with` hook for [`flag`].
pub fn loose_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(truthy(&value))
}

/// `deserialize_with` hook for [`text`].
pub fn loose_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(text(Some(&value)))
}

/// `deserialize_with` hook for [`number`].
pub fn loose_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(number(Some(&value)))
}

/// `deserialize_with` hook for nested sections that only count when truthy.
/// A truthy section of the wrong shape decodes to its defaults.
pub fn loose_section<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    if !truthy(&value) {
        return Ok(None);
    }
    Ok(Some(T::deserialize(&value).unwrap_or_default()))
}

/// String form of any value, with integral numbers printed without a fraction.
pub fn display(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number
            .as_f64()
            .map(format_number)
            .unwrap_or_else(|| number.to_string()),
        Value::String(text) => text.clone(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Numeric coercion with a zero fallback, used for range controls.
pub fn to_number(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(number) => number.as_f64().unwrap_or(0.0),
        Value::Bool(true) => 1.0,
        Value::String(text) => parse_number(text),
        _ => 0.0,
    };

    if parsed.is_finite() { parsed } else { 0.0 }
}

/// Parse control text as a number; blank text is zero, garbage is zero.
pub fn parse_number(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    trimmed
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .unwrap_or(0.0)
}

pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// JSON number for an outbound payload, integral values stay integers.
pub fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        Value::from(n as i64)
    } else {
        Value::from(n)
    }
}

//! Condition values.
//!
//! Values are a closed set: scalars and homogeneous arrays of scalars.
//! Anything else is rejected when the value is built.

use serde_json::Number;

use crate::error::{FilterError, FilterResult};

/// A single scalar operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// JSON `null`.
    Null,
    /// A boolean literal.
    Bool(bool),
    /// A number, kept in its JSON representation.
    Number(Number),
    /// A string literal.
    String(String),
}

/// An operand of a comparison: a scalar or a homogeneous array of scalars.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A single scalar.
    Scalar(Scalar),
    /// An array of booleans.
    Bools(Vec<bool>),
    /// An array of numbers.
    Numbers(Vec<Number>),
    /// An array of strings.
    Strings(Vec<String>),
}

impl Value {
    /// Builds a number value from a float. Non-finite floats are rejected.
    pub fn float(value: f64) -> FilterResult<Self> {
        Number::from_f64(value)
            .map(|n| Value::Scalar(Scalar::Number(n)))
            .ok_or_else(|| FilterError::unsupported_type(format!("non-finite number {value}")))
    }

    /// Returns true if the value is an array.
    pub fn is_array(&self) -> bool {
        !matches!(self, Value::Scalar(_))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Scalar(Scalar::Bool(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Scalar(Scalar::Number(value.into()))
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Scalar(Scalar::Number(value.into()))
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Scalar(Scalar::Number(value.into()))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Scalar(Scalar::String(value.to_string()))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Scalar(Scalar::String(value))
    }
}

impl From<Vec<bool>> for Value {
    fn from(values: Vec<bool>) -> Self {
        Value::Bools(values)
    }
}

impl From<Vec<i64>> for Value {
    fn from(values: Vec<i64>) -> Self {
        Value::Numbers(values.into_iter().map(Number::from).collect())
    }
}

impl From<Vec<&str>> for Value {
    fn from(values: Vec<&str>) -> Self {
        Value::Strings(values.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for Value {
    fn from(values: Vec<String>) -> Self {
        Value::Strings(values)
    }
}

impl TryFrom<&serde_json::Value> for Value {
    type Error = FilterError;

    fn try_from(json: &serde_json::Value) -> FilterResult<Self> {
        use serde_json::Value as Json;

        match json {
            Json::Null => Ok(Value::Scalar(Scalar::Null)),
            Json::Bool(b) => Ok(Value::Scalar(Scalar::Bool(*b))),
            Json::Number(n) => Ok(Value::Scalar(Scalar::Number(n.clone()))),
            Json::String(s) => Ok(Value::Scalar(Scalar::String(s.clone()))),
            Json::Array(items) => array_from_json(items),
            Json::Object(_) => Err(FilterError::unsupported_type("object")),
        }
    }
}

/// Converts a JSON array, requiring every element to share one scalar kind.
fn array_from_json(items: &[serde_json::Value]) -> FilterResult<Value> {
    use serde_json::Value as Json;

    let Some(first) = items.first() else {
        return Ok(Value::Strings(Vec::new()));
    };

    let mixed = || FilterError::unsupported_type(format!("mixed array {}", Json::from(items)));

    match first {
        Json::Bool(_) => items
            .iter()
            .map(|item| item.as_bool().ok_or_else(mixed))
            .collect::<FilterResult<Vec<_>>>()
            .map(Value::Bools),
        Json::Number(_) => items
            .iter()
            .map(|item| match item {
                Json::Number(n) => Ok(n.clone()),
                _ => Err(mixed()),
            })
            .collect::<FilterResult<Vec<_>>>()
            .map(Value::Numbers),
        Json::String(_) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(mixed))
            .collect::<FilterResult<Vec<_>>>()
            .map(Value::Strings),
        other => Err(FilterError::unsupported_type(format!(
            "array element {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalars_from_json() {
        assert_eq!(Value::try_from(&json!(true)).unwrap(), Value::from(true));
        assert_eq!(Value::try_from(&json!("a")).unwrap(), Value::from("a"));
        assert_eq!(Value::try_from(&json!(22)).unwrap(), Value::from(22i64));
        assert_eq!(
            Value::try_from(&json!(null)).unwrap(),
            Value::Scalar(Scalar::Null)
        );
    }

    #[test]
    fn test_homogeneous_arrays_from_json() {
        assert_eq!(
            Value::try_from(&json!(["Chalon", "Macon"])).unwrap(),
            Value::from(vec!["Chalon", "Macon"])
        );
        assert_eq!(
            Value::try_from(&json!([true, false])).unwrap(),
            Value::from(vec![true, false])
        );
        assert!(Value::try_from(&json!([2010, 2015.5])).unwrap().is_array());
    }

    #[test]
    fn test_mixed_array_rejected() {
        let err = Value::try_from(&json!(["foo", 1])).unwrap_err();
        assert!(matches!(err, FilterError::UnsupportedType { .. }));
    }

    #[test]
    fn test_nested_values_rejected() {
        let err = Value::try_from(&json!(["foo", {"foo": "bar"}])).unwrap_err();
        assert!(matches!(err, FilterError::UnsupportedType { .. }));

        let err = Value::try_from(&json!([[1]])).unwrap_err();
        assert!(matches!(err, FilterError::UnsupportedType { .. }));

        let err = Value::try_from(&json!({"a": 1})).unwrap_err();
        assert!(matches!(err, FilterError::UnsupportedType { .. }));
    }

    #[test]
    fn test_float_rejects_non_finite() {
        assert!(Value::float(f64::NAN).is_err());
        assert!(Value::float(1.5).is_ok());
    }
}

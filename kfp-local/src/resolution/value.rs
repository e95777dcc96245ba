// Typed Parameter Values
// Decodes raw specification literals into values of a declared parameter type

use crate::error::{KfpError, KfpResult};
use crate::parser::models::ParameterType;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// A resolved parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypedValue {
    Integer(i64),
    /// Integers above `i64::MAX`
    Unsigned(u64),
    Double(f64),
    Boolean(bool),
    String(String),
    List(Vec<Value>),
    Struct(Map<String, Value>),
}

impl TypedValue {
    /// The parameter type this value satisfies
    pub fn parameter_type(&self) -> ParameterType {
        match self {
            TypedValue::Integer(_) | TypedValue::Unsigned(_) => ParameterType::Integer,
            TypedValue::Double(_) => ParameterType::Double,
            TypedValue::Boolean(_) => ParameterType::Boolean,
            TypedValue::String(_) => ParameterType::String,
            TypedValue::List(_) => ParameterType::List,
            TypedValue::Struct(_) => ParameterType::Struct,
        }
    }

    /// Take a value produced by an upstream task as-is, inferring its kind
    pub fn from_output(raw: Value) -> KfpResult<Self> {
        match raw {
            Value::Number(n) => Ok(integral(&n)
                .unwrap_or_else(|| TypedValue::Double(n.as_f64().unwrap_or(f64::NAN)))),
            Value::Bool(b) => Ok(TypedValue::Boolean(b)),
            Value::String(s) => Ok(TypedValue::String(s)),
            Value::Array(items) => Ok(TypedValue::List(items)),
            Value::Object(fields) => Ok(TypedValue::Struct(fields)),
            Value::Null => Err(KfpError::ParameterValueMismatch {
                expected: ParameterType::Unspecified,
                found: "null",
            }),
        }
    }
}

impl From<i64> for TypedValue {
    fn from(n: i64) -> Self {
        TypedValue::Integer(n)
    }
}

impl From<f64> for TypedValue {
    fn from(n: f64) -> Self {
        TypedValue::Double(n)
    }
}

impl From<bool> for TypedValue {
    fn from(b: bool) -> Self {
        TypedValue::Boolean(b)
    }
}

impl From<&str> for TypedValue {
    fn from(s: &str) -> Self {
        TypedValue::String(s.to_string())
    }
}

impl From<String> for TypedValue {
    fn from(s: String) -> Self {
        TypedValue::String(s)
    }
}

/// Decode a raw literal according to its declared type.
///
/// Integers and doubles share the numeric literal; an integer drops the
/// fractional part.
pub fn extract_typed_value(raw: &Value, param_type: &ParameterType) -> KfpResult<TypedValue> {
    let mismatch = || KfpError::ParameterValueMismatch {
        expected: param_type.clone(),
        found: json_kind(raw),
    };

    match param_type {
        ParameterType::Integer => match raw {
            Value::Number(n) => Ok(integral(n).unwrap_or_else(|| {
                TypedValue::Integer(n.as_f64().map_or(0, |f| f.trunc() as i64))
            })),
            _ => Err(mismatch()),
        },
        ParameterType::Double => raw.as_f64().map(TypedValue::Double).ok_or_else(mismatch),
        ParameterType::Boolean => raw.as_bool().map(TypedValue::Boolean).ok_or_else(mismatch),
        ParameterType::String => raw
            .as_str()
            .map(|s| TypedValue::String(s.to_string()))
            .ok_or_else(mismatch),
        ParameterType::List => raw
            .as_array()
            .map(|items| TypedValue::List(items.clone()))
            .ok_or_else(mismatch),
        ParameterType::Struct => raw
            .as_object()
            .map(|fields| TypedValue::Struct(fields.clone()))
            .ok_or_else(mismatch),
        ParameterType::TaskFinalStatus | ParameterType::Unspecified | ParameterType::Unknown(_) => {
            Err(KfpError::UnsupportedParameterType(param_type.clone()))
        }
    }
}

fn integral(n: &Number) -> Option<TypedValue> {
    n.as_i64()
        .map(TypedValue::Integer)
        .or_else(|| n.as_u64().map(TypedValue::Unsigned))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "struct",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_value_kinds() {
        let cases = [
            (json!(42.5), ParameterType::Integer),
            (json!(42.5), ParameterType::Double),
            (json!(false), ParameterType::Boolean),
            (json!("foo"), ParameterType::String),
            (json!([1, 2, 3]), ParameterType::List),
            (json!({"a": 1, "b": 2}), ParameterType::Struct),
        ];

        for (raw, param_type) in cases {
            let value = extract_typed_value(&raw, &param_type).unwrap();
            assert_eq!(value.parameter_type(), param_type, "decoding {}", raw);
        }
    }

    #[test]
    fn test_extract_numbers() {
        assert_eq!(
            extract_typed_value(&json!(42.5), &ParameterType::Integer).unwrap(),
            TypedValue::Integer(42)
        );
        assert_eq!(
            extract_typed_value(&json!(-1.9), &ParameterType::Integer).unwrap(),
            TypedValue::Integer(-1)
        );
        assert_eq!(
            extract_typed_value(&json!(1000), &ParameterType::Double).unwrap(),
            TypedValue::Double(1000.0)
        );
    }

    #[test]
    fn test_extract_mismatch() {
        let err = extract_typed_value(&json!("7"), &ParameterType::Integer).unwrap_err();
        assert_eq!(err.to_string(), "expected a NUMBER_INTEGER value, found string");
    }

    #[test]
    fn test_extract_unsupported_type() {
        for param_type in [
            ParameterType::Unspecified,
            ParameterType::TaskFinalStatus,
            ParameterType::Unknown("INT".to_string()),
        ] {
            assert!(matches!(
                extract_typed_value(&json!(1), &param_type),
                Err(KfpError::UnsupportedParameterType(_))
            ));
        }
    }

    #[test]
    fn test_from_output_keeps_value() {
        assert_eq!(TypedValue::from_output(json!(7)).unwrap(), TypedValue::Integer(7));
        assert_eq!(
            TypedValue::from_output(json!(0.25)).unwrap(),
            TypedValue::Double(0.25)
        );
        assert_eq!(
            TypedValue::from_output(json!({"average": 1.0})).unwrap(),
            TypedValue::Struct(json!({"average": 1.0}).as_object().unwrap().clone())
        );
        assert!(TypedValue::from_output(json!(null)).is_err());
    }

    #[test]
    fn test_large_integers_stay_exact() {
        let big = json!(u64::MAX);
        assert_eq!(
            TypedValue::from_output(big.clone()).unwrap(),
            TypedValue::Unsigned(u64::MAX)
        );
        assert_eq!(
            extract_typed_value(&big, &ParameterType::Integer).unwrap(),
            TypedValue::Unsigned(u64::MAX)
        );
        assert_eq!(
            serde_json::to_string(&TypedValue::Unsigned(u64::MAX)).unwrap(),
            "18446744073709551615"
        );
    }

    #[test]
    fn test_serializes_as_plain_json() {
        let values = vec![
            TypedValue::Integer(1000),
            TypedValue::Double(42.0),
            TypedValue::from("001"),
            TypedValue::List(vec![json!("foo"), json!("bar")]),
        ];
        assert_eq!(
            serde_json::to_string(&values).unwrap(),
            r#"[1000,42.0,"001",["foo","bar"]]"#
        );
    }
}

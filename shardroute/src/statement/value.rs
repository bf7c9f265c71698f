use std::cmp::Ordering;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Literal or bound SQL value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Integer(i64),
    Text(String),
}

impl Value {
    /// Compare two values of the same type. Values of different
    /// types (and NULLs) are not comparable.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Get the value as an integer, parsing text if necessary.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(value) => Some(*value),
            Value::Text(text) => text.trim().parse().ok(),
            Value::Null => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(value) => write!(f, "{}", value),
            Value::Text(text) => write!(f, "{}", text),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value as i64)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

/// Value in a statement: written inline or bound
/// to a parameter placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionValue {
    Literal(Value),
    /// Zero-based index into the bound parameters.
    Parameter(usize),
}

impl ConditionValue {
    /// Get the value, looking up bound parameters if needed.
    pub fn resolve<'a>(&'a self, parameters: &'a [Value]) -> Option<&'a Value> {
        match self {
            ConditionValue::Literal(value) => Some(value),
            ConditionValue::Parameter(index) => parameters.get(*index),
        }
    }

    pub fn parameter(&self) -> Option<usize> {
        match self {
            ConditionValue::Parameter(index) => Some(*index),
            ConditionValue::Literal(_) => None,
        }
    }
}

impl From<Value> for ConditionValue {
    fn from(value: Value) -> Self {
        ConditionValue::Literal(value)
    }
}

impl From<i64> for ConditionValue {
    fn from(value: i64) -> Self {
        ConditionValue::Literal(value.into())
    }
}

impl From<i32> for ConditionValue {
    fn from(value: i32) -> Self {
        ConditionValue::Literal(value.into())
    }
}

impl From<&str> for ConditionValue {
    fn from(value: &str) -> Self {
        ConditionValue::Literal(value.into())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_compare_same_type_only() {
        assert_eq!(
            Value::from(1).compare(&Value::from(2)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Value::from("b").compare(&Value::from("a")),
            Some(Ordering::Greater)
        );
        assert_eq!(Value::from(1).compare(&Value::from("1")), None);
        assert_eq!(Value::Null.compare(&Value::Null), None);
    }

    #[test]
    fn test_resolve_parameter() {
        let parameters = vec![Value::from(10), Value::from("x")];
        assert_eq!(
            ConditionValue::Parameter(1).resolve(&parameters),
            Some(&Value::from("x"))
        );
        assert_eq!(ConditionValue::Parameter(2).resolve(&parameters), None);
        assert_eq!(
            ConditionValue::from(5).resolve(&parameters),
            Some(&Value::from(5))
        );
    }

    #[test]
    fn test_deserialize_untagged() {
        let values: Vec<Value> = serde_json::from_str(r#"[null, 1, "a"]"#).unwrap();
        assert_eq!(values, vec![Value::Null, Value::from(1), Value::from("a")]);
    }
}

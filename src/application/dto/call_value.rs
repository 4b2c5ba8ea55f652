//! Untyped values carried by remote calls
//!
//! Clients send positional and keyword arguments as plain JSON. A `CallValue`
//! is the decoded form before the dispatcher coerces it into typed arguments,
//! and also the shape of every value sent back.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::Vec3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CallValue {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<CallValue>),
    Map(BTreeMap<String, CallValue>),
}

impl CallValue {
    /// Integer view; a float without a fractional part also qualifies
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CallValue::Int(value) => Some(*value),
            CallValue::Float(value)
                if value.fract() == 0.0
                    && *value >= i64::MIN as f64
                    && *value < i64::MAX as f64 =>
            {
                Some(*value as i64)
            }
            _ => None,
        }
    }

    /// Float view; integers are widened
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CallValue::Float(value) => Some(*value),
            CallValue::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CallValue::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[CallValue]> {
        match self {
            CallValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// A list of exactly three numbers, read as (x, y, z)
    pub fn as_triple(&self) -> Option<Vec3> {
        match self.as_list()? {
            [x, y, z] => Some(Vec3::new(x.as_f64()?, y.as_f64()?, z.as_f64()?)),
            _ => None,
        }
    }

    /// A list whose every element is an integer
    pub fn as_int_list(&self) -> Option<Vec<i64>> {
        self.as_list()?.iter().map(CallValue::as_i64).collect()
    }

    /// Short name of the value's shape, used in diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            CallValue::None => "none",
            CallValue::Bool(_) => "bool",
            CallValue::Int(_) => "int",
            CallValue::Float(_) => "float",
            CallValue::Str(_) => "string",
            CallValue::List(_) => "list",
            CallValue::Map(_) => "map",
        }
    }
}

impl From<i64> for CallValue {
    fn from(value: i64) -> Self {
        CallValue::Int(value)
    }
}

impl From<f64> for CallValue {
    fn from(value: f64) -> Self {
        CallValue::Float(value)
    }
}

impl From<bool> for CallValue {
    fn from(value: bool) -> Self {
        CallValue::Bool(value)
    }
}

impl From<String> for CallValue {
    fn from(value: String) -> Self {
        CallValue::Str(value)
    }
}

impl From<&str> for CallValue {
    fn from(value: &str) -> Self {
        CallValue::Str(value.to_string())
    }
}

impl<T: Into<CallValue>> From<Vec<T>> for CallValue {
    fn from(items: Vec<T>) -> Self {
        CallValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<CallValue>> From<Option<T>> for CallValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(CallValue::None, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_json_shapes() {
        let value: CallValue =
            serde_json::from_str(r#"[1, 2.5, "name", true, null, [1, 2, 3], {"objectID": 9}]"#)
                .unwrap();

        let items = value.as_list().unwrap();
        assert_eq!(items[0], CallValue::Int(1));
        assert_eq!(items[1], CallValue::Float(2.5));
        assert_eq!(items[2], CallValue::Str("name".to_string()));
        assert_eq!(items[3], CallValue::Bool(true));
        assert_eq!(items[4], CallValue::None);
        assert_eq!(items[5].as_triple(), Some(Vec3::new(1.0, 2.0, 3.0)));
        assert!(matches!(&items[6], CallValue::Map(map) if map["objectID"] == CallValue::Int(9)));
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(CallValue::Int(3).as_f64(), Some(3.0));
        assert_eq!(CallValue::Float(4.0).as_i64(), Some(4));
        assert_eq!(CallValue::Float(4.5).as_i64(), None);
        assert_eq!(CallValue::Str("4".to_string()).as_i64(), None);
        assert_eq!(CallValue::Float(2f64.powi(63)).as_i64(), None);
        assert_eq!(CallValue::Float(-(2f64.powi(63))).as_i64(), Some(i64::MIN));
        assert_eq!(CallValue::Bool(true).as_f64(), None);
    }

    #[test]
    fn test_triple_requires_three_numbers() {
        let two: CallValue = vec![1.0, 2.0].into();
        let mixed = CallValue::List(vec![1i64.into(), "y".into(), 3i64.into()]);

        assert_eq!(two.as_triple(), None);
        assert_eq!(mixed.as_triple(), None);
    }

    #[test]
    fn test_encode_none_as_null() {
        let value = CallValue::List(vec![CallValue::from(Option::<i64>::None), 5i64.into()]);

        assert_eq!(serde_json::to_string(&value).unwrap(), "[null,5]");
    }
}

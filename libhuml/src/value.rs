//! HUML value representation.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::EncodeError;

/// A HUML value.
///
/// Dicts are kept in a `BTreeMap`, so iteration is always in key order and a
/// key can appear only once.
#[derive(Clone, PartialEq)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating-point number, including NaN and the infinities.
    Float(f64),
    /// UTF-8 string.
    String(String),
    /// Ordered list of values.
    List(Vec<Value>),
    /// Dict with unique string keys.
    Dict(BTreeMap<String, Value>),
}

impl Value {
    /// Returns `true` if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the boolean value if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer if this is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the number as a float. Integers are widened.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Returns a reference to the string if this is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the items if this is a `List`.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns a reference to the map if this is a `Dict`.
    pub fn as_dict(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Dict(dict) => Some(dict),
            _ => None,
        }
    }

    /// Look up a key in a dict. Returns `None` for other values.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_dict()?.get(key)
    }

    /// Narrow a number to any primitive numeric type.
    ///
    /// Returns `None` for non-numbers and for values the target type cannot
    /// hold. Floats converted to integer types are truncated.
    pub fn to_number<T: num_traits::NumCast>(&self) -> Option<T> {
        match self {
            Value::Int(n) => <T as num_traits::NumCast>::from(*n),
            Value::Float(f) => <T as num_traits::NumCast>::from(*f),
            _ => None,
        }
    }

    /// Build an `Int` from any primitive integer, failing when it does not
    /// fit in 64 signed bits.
    pub fn from_integer<T>(n: T) -> Result<Value, EncodeError>
    where
        T: num_traits::ToPrimitive + fmt::Display,
    {
        n.to_i64()
            .map(Value::Int)
            .ok_or_else(|| EncodeError::IntegerOutOfRange(n.to_string()))
    }

    /// Name of the value's kind.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Dict(_) => "dict",
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => {
                if n.is_nan() {
                    write!(f, "nan")
                } else if n.is_infinite() {
                    if *n > 0.0 {
                        write!(f, "inf")
                    } else {
                        write!(f, "-inf")
                    }
                } else {
                    write!(f, "{:?}", n)
                }
            }
            Value::String(s) => write!(f, "{:?}", s),
            Value::List(items) => f.debug_list().entries(items).finish(),
            Value::Dict(dict) => f.debug_map().entries(dict).finish(),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! from_small_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::Int(i64::from(n))
                }
            }
        )*
    };
}

from_small_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::Float(f64::from(f))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<BTreeMap<String, T>> for Value {
    fn from(dict: BTreeMap<String, T>) -> Self {
        Value::Dict(dict.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let v = Value::from(3);
        assert_eq!(v.as_int(), Some(3));
        assert_eq!(v.as_float(), Some(3.0));
        assert_eq!(v.as_str(), None);
        assert_eq!(Value::from("x").as_str(), Some("x"));
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert!(Value::from(None::<i32>).is_null());
        assert_eq!(Value::default().kind_name(), "null");
    }

    #[test]
    fn test_get() {
        let mut dict = BTreeMap::new();
        dict.insert("a".to_string(), 1);
        let v = Value::from(dict);
        assert_eq!(v.get("a"), Some(&Value::Int(1)));
        assert_eq!(v.get("b"), None);
        assert_eq!(Value::from(vec![1, 2]).get("a"), None);
    }

    #[test]
    fn test_to_number() {
        assert_eq!(Value::Int(300).to_number::<u8>(), None);
        assert_eq!(Value::Int(200).to_number::<u8>(), Some(200));
        assert_eq!(Value::Float(2.5).to_number::<f32>(), Some(2.5));
        assert_eq!(Value::Float(2.9).to_number::<i32>(), Some(2));
        assert_eq!(Value::from("1").to_number::<i32>(), None);
    }

    #[test]
    fn test_from_integer() {
        assert_eq!(Value::from_integer(5u64), Ok(Value::Int(5)));
        assert_eq!(
            Value::from_integer(u64::MAX),
            Err(EncodeError::IntegerOutOfRange(u64::MAX.to_string()))
        );
        assert_eq!(Value::from_integer(i64::MIN as i128), Ok(Value::Int(i64::MIN)));
    }

    #[test]
    fn test_from_primitives() {
        assert_eq!(Value::from(-8i8), Value::Int(-8));
        assert_eq!(Value::from(-16i16), Value::Int(-16));
        assert_eq!(Value::from(-32i32), Value::Int(-32));
        assert_eq!(Value::from(i64::MAX), Value::Int(i64::MAX));
        assert_eq!(Value::from(u8::MAX), Value::Int(255));
        assert_eq!(Value::from(u16::MAX), Value::Int(65535));
        assert_eq!(Value::from(u32::MAX), Value::Int(4294967295));
        assert_eq!(Value::from(0.5f32), Value::Float(0.5));
    }

    #[test]
    fn test_nan_not_equal() {
        assert_ne!(Value::Float(f64::NAN), Value::Float(f64::NAN));
    }

    #[test]
    fn test_debug() {
        let v = Value::from(vec![Value::Float(f64::NEG_INFINITY), Value::Float(1.0)]);
        assert_eq!(format!("{:?}", v), "[-inf, 1.0]");
    }
}

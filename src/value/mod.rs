//! Value type system for dynaquery
//!
//! Records, predicate operands and projection defaults all carry a [`Value`].
//! The [`ValueType`] trait maps Rust field types to a [`ValueKind`] and converts
//! between the two; the derive macros in `dynaquery-derive` lean on it to build
//! shape tables without runtime reflection.
//!
//! ## Traits
//!
//! - **`ValueType`** - Maps Rust types to their `ValueKind` and converts to/from `Value`
//!
//! Lenient, never-failing conversions used by the descriptor reader live in
//! [`coerce`].

pub mod coerce;

use chrono::NaiveDateTime;
use std::cmp::Ordering;
use std::fmt;
use uuid::Uuid;

pub use coerce::Coerced;

/// The kind of a property on an element shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Int,
    UInt,
    Float,
    Text,
    DateTime,
    Uuid,
}

impl ValueKind {
    /// The zero value of this kind (what a missing projection field binds to).
    pub fn zero(self) -> Value {
        match self {
            ValueKind::Bool => Value::Bool(false),
            ValueKind::Int => Value::Int(0),
            ValueKind::UInt => Value::UInt(0),
            ValueKind::Float => Value::Float(0.0),
            ValueKind::Text => Value::Text(String::new()),
            ValueKind::DateTime => Value::DateTime(NaiveDateTime::default()),
            ValueKind::Uuid => Value::Uuid(Uuid::nil()),
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, ValueKind::Int | ValueKind::UInt | ValueKind::Float)
    }

    /// Whether a value of kind `from` can be bound to a field of this kind
    /// without losing its meaning.
    pub fn accepts(self, from: ValueKind) -> bool {
        self == from || (self.is_numeric() && from.is_numeric())
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::UInt => "uint",
            ValueKind::Float => "float",
            ValueKind::Text => "text",
            ValueKind::DateTime => "datetime",
            ValueKind::Uuid => "uuid",
        };
        f.write_str(name)
    }
}

/// A dynamically typed scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    DateTime(NaiveDateTime),
    Uuid(Uuid),
}

impl Value {
    /// Kind of this value, `None` for `Null`.
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(ValueKind::Bool),
            Value::Int(_) => Some(ValueKind::Int),
            Value::UInt(_) => Some(ValueKind::UInt),
            Value::Float(_) => Some(ValueKind::Float),
            Value::Text(_) => Some(ValueKind::Text),
            Value::DateTime(_) => Some(ValueKind::DateTime),
            Value::Uuid(_) => Some(ValueKind::Uuid),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// `Null` or the zero value of its own kind.
    pub fn is_default(&self) -> bool {
        match self.kind() {
            None => true,
            Some(kind) => *self == kind.zero(),
        }
    }

    /// Compare two values. Numeric kinds compare across each other; every other
    /// pairing only compares within the same kind. `Null` never compares.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
            (Value::Uuid(a), Value::Uuid(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::UInt(a), Value::UInt(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::UInt(b)) => Some(i128::from(*a).cmp(&i128::from(*b))),
            (Value::UInt(a), Value::Int(b)) => Some(i128::from(*a).cmp(&i128::from(*b))),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.partial_cmp(&y),
                _ => None,
            },
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::UInt(u) => Some(*u as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::UInt(u) => write!(f, "{u}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => f.write_str(s),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.f")),
            Value::Uuid(u) => write!(f, "{u}"),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    Value::UInt(u)
                } else if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    n.as_f64().map_or(Value::Null, Value::Float)
                }
            }
            serde_json::Value::String(s) => Value::Text(s),
            other => Value::Text(other.to_string()),
        }
    }
}

impl From<Value> for sea_query::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => sea_query::Value::String(None),
            Value::Bool(b) => b.into(),
            Value::Int(i) => i.into(),
            Value::UInt(u) => u.into(),
            Value::Float(x) => x.into(),
            Value::Text(s) => s.into(),
            Value::DateTime(dt) => dt.into(),
            Value::Uuid(u) => u.into(),
        }
    }
}

/// Error type for value extraction failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueExtractionError {
    /// The value is null where a value was required
    NullValue,
    /// The value kind doesn't match the expected type
    TypeMismatch { expected: ValueKind, actual: ValueKind },
    /// Value conversion failed (e.g., overflow)
    ConversionError(String),
    /// Extraction failed for a named record field
    Field { field: String, reason: Box<ValueExtractionError> },
}

impl fmt::Display for ValueExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueExtractionError::NullValue => write!(f, "Value is null"),
            ValueExtractionError::TypeMismatch { expected, actual } => {
                write!(f, "Type mismatch: expected {expected}, got {actual}")
            }
            ValueExtractionError::ConversionError(msg) => write!(f, "Conversion error: {msg}"),
            ValueExtractionError::Field { field, reason } => {
                write!(f, "Field [{field}]: {reason}")
            }
        }
    }
}

impl std::error::Error for ValueExtractionError {}

/// Maps a Rust type to its [`ValueKind`] and converts it to and from [`Value`].
///
/// `Option<T>` maps `None` to `Value::Null` and shares the kind of `T`.
pub trait ValueType: Sized {
    const KIND: ValueKind;

    fn into_value(self) -> Value;

    fn from_value(value: &Value) -> Result<Self, ValueExtractionError>;
}

fn mismatch<T: ValueType>(value: &Value) -> ValueExtractionError {
    match value.kind() {
        None => ValueExtractionError::NullValue,
        Some(actual) => ValueExtractionError::TypeMismatch {
            expected: T::KIND,
            actual,
        },
    }
}

macro_rules! integer_value_type {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl ValueType for $ty {
                const KIND: ValueKind = ValueKind::$kind;

                fn into_value(self) -> Value {
                    integer_value_type!(@into $kind, self)
                }

                fn from_value(value: &Value) -> Result<Self, ValueExtractionError> {
                    let wide: i128 = match value {
                        Value::Int(i) => i128::from(*i),
                        Value::UInt(u) => i128::from(*u),
                        _ => return Err(mismatch::<Self>(value)),
                    };
                    <$ty>::try_from(wide).map_err(|_| {
                        ValueExtractionError::ConversionError(format!(
                            "{} overflows {}",
                            wide,
                            stringify!($ty)
                        ))
                    })
                }
            }
        )*
    };
    (@into Int, $v:expr) => { Value::Int(i64::from($v)) };
    (@into UInt, $v:expr) => { Value::UInt(u64::from($v)) };
}

integer_value_type! {
    i8 => Int,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u8 => UInt,
    u16 => UInt,
    u32 => UInt,
    u64 => UInt,
}

impl ValueType for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn into_value(self) -> Value {
        Value::Bool(self)
    }

    fn from_value(value: &Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::Bool(b) => Ok(*b),
            _ => Err(mismatch::<Self>(value)),
        }
    }
}

impl ValueType for f64 {
    const KIND: ValueKind = ValueKind::Float;

    fn into_value(self) -> Value {
        Value::Float(self)
    }

    fn from_value(value: &Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::Float(x) => Ok(*x),
            Value::Int(i) => Ok(*i as f64),
            Value::UInt(u) => Ok(*u as f64),
            _ => Err(mismatch::<Self>(value)),
        }
    }
}

impl ValueType for f32 {
    const KIND: ValueKind = ValueKind::Float;

    fn into_value(self) -> Value {
        Value::Float(f64::from(self))
    }

    fn from_value(value: &Value) -> Result<Self, ValueExtractionError> {
        #[allow(clippy::cast_possible_truncation)]
        f64::from_value(value).map(|x| x as f32)
    }
}

impl ValueType for String {
    const KIND: ValueKind = ValueKind::Text;

    fn into_value(self) -> Value {
        Value::Text(self)
    }

    fn from_value(value: &Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::Text(s) => Ok(s.clone()),
            _ => Err(mismatch::<Self>(value)),
        }
    }
}

impl ValueType for NaiveDateTime {
    const KIND: ValueKind = ValueKind::DateTime;

    fn into_value(self) -> Value {
        Value::DateTime(self)
    }

    fn from_value(value: &Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::DateTime(dt) => Ok(*dt),
            _ => Err(mismatch::<Self>(value)),
        }
    }
}

impl ValueType for Uuid {
    const KIND: ValueKind = ValueKind::Uuid;

    fn into_value(self) -> Value {
        Value::Uuid(self)
    }

    fn from_value(value: &Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::Uuid(u) => Ok(*u),
            _ => Err(mismatch::<Self>(value)),
        }
    }
}

impl<T: ValueType> ValueType for Option<T> {
    const KIND: ValueKind = T::KIND;

    fn into_value(self) -> Value {
        self.map_or(Value::Null, ValueType::into_value)
    }

    fn from_value(value: &Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: ValueType> From<T> for Value {
    fn from(v: T) -> Self {
        v.into_value()
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_values_are_default() {
        for kind in [
            ValueKind::Bool,
            ValueKind::Int,
            ValueKind::UInt,
            ValueKind::Float,
            ValueKind::Text,
            ValueKind::DateTime,
            ValueKind::Uuid,
        ] {
            assert!(kind.zero().is_default(), "{kind} zero should be default");
            assert_eq!(kind.zero().kind(), Some(kind));
        }
        assert!(Value::Null.is_default());
        assert!(!Value::Int(3).is_default());
        assert!(!Value::Text("a".into()).is_default());
    }

    #[test]
    fn test_compare_across_numeric_kinds() {
        assert_eq!(Value::Int(-1).compare(&Value::UInt(0)), Some(Ordering::Less));
        assert_eq!(Value::UInt(5).compare(&Value::Float(4.5)), Some(Ordering::Greater));
        assert_eq!(Value::Int(2).compare(&Value::Int(2)), Some(Ordering::Equal));
        assert_eq!(Value::Text("a".into()).compare(&Value::Int(1)), None);
        assert_eq!(Value::Null.compare(&Value::Null), None);
    }

    #[test]
    fn test_integer_extraction_checks_range() {
        assert_eq!(u16::from_value(&Value::Int(12)), Ok(12));
        assert!(matches!(
            u8::from_value(&Value::UInt(300)),
            Err(ValueExtractionError::ConversionError(_))
        ));
        assert!(matches!(
            u64::from_value(&Value::Int(-1)),
            Err(ValueExtractionError::ConversionError(_))
        ));
        assert_eq!(
            i32::from_value(&Value::Text("1".into())),
            Err(ValueExtractionError::TypeMismatch {
                expected: ValueKind::Int,
                actual: ValueKind::Text,
            })
        );
    }

    #[test]
    fn test_option_maps_null() {
        assert_eq!(Option::<String>::from_value(&Value::Null), Ok(None));
        assert_eq!(Option::<i64>::KIND, ValueKind::Int);
        assert_eq!(Some(7u32).into_value(), Value::UInt(7));
        assert_eq!(None::<bool>.into_value(), Value::Null);
        assert_eq!(String::from_value(&Value::Null), Err(ValueExtractionError::NullValue));
    }

    #[test]
    fn test_from_json() {
        assert_eq!(Value::from(serde_json::json!(5)), Value::UInt(5));
        assert_eq!(Value::from(serde_json::json!(-5)), Value::Int(-5));
        assert_eq!(Value::from(serde_json::json!(1.5)), Value::Float(1.5));
        assert_eq!(Value::from(serde_json::json!("x")), Value::Text("x".into()));
        assert_eq!(Value::from(serde_json::Value::Null), Value::Null);
    }

    #[test]
    fn test_accepts() {
        assert!(ValueKind::Float.accepts(ValueKind::Int));
        assert!(ValueKind::Text.accepts(ValueKind::Text));
        assert!(!ValueKind::Bool.accepts(ValueKind::Text));
    }
}

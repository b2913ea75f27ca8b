//! Lenient value conversion.
//!
//! Every conversion here is best-effort: a value that cannot be represented in
//! the target type yields the target's zero value with `ok == false` instead of
//! an error. `Null` converts to the zero value and counts as success, matching
//! how an absent descriptor field is read.

use super::{Value, ValueKind};
use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

/// Result of a lenient conversion: the converted value and whether the input
/// was actually representable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coerced<T> {
    pub value: T,
    pub ok: bool,
}

impl<T> Coerced<T> {
    fn hit(value: T) -> Self {
        Self { value, ok: true }
    }

    fn miss(value: T) -> Self {
        Self { value, ok: false }
    }

    /// Keep the value regardless of success.
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T: Default> Coerced<T> {
    fn zero() -> Self {
        Self::miss(T::default())
    }
}

fn parse_integer(text: &str) -> Option<i128> {
    let text = text.trim();
    text.parse::<i128>().ok().or_else(|| {
        text.parse::<f64>().ok().and_then(float_to_integer)
    })
}

fn float_to_integer(x: f64) -> Option<i128> {
    if !x.is_finite() {
        return None;
    }
    let rounded = x.round();
    if rounded < i128::MIN as f64 || rounded > i128::MAX as f64 {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    Some(rounded as i128)
}

/// Widen any value to an `i128`, or `None` when it is not numeric-like.
fn to_integer(value: &Value) -> Option<i128> {
    match value {
        Value::Null => Some(0),
        Value::Bool(b) => Some(i128::from(*b)),
        Value::Int(i) => Some(i128::from(*i)),
        Value::UInt(u) => Some(i128::from(*u)),
        Value::Float(x) => float_to_integer(*x),
        Value::Text(s) => parse_integer(s),
        Value::DateTime(_) | Value::Uuid(_) => None,
    }
}

macro_rules! integer_coercions {
    ($($name:ident => $ty:ty),* $(,)?) => {
        $(
            #[doc = concat!("Lenient conversion to `", stringify!($ty), "`.")]
            pub fn $name(value: &Value) -> Coerced<$ty> {
                match to_integer(value).and_then(|wide| <$ty>::try_from(wide).ok()) {
                    Some(v) => Coerced::hit(v),
                    None => Coerced::zero(),
                }
            }
        )*
    };
}

integer_coercions! {
    to_u64 => u64,
    to_i64 => i64,
    to_u32 => u32,
    to_i32 => i32,
    to_u16 => u16,
    to_i16 => i16,
    to_u8 => u8,
    to_i8 => i8,
}

/// Lenient conversion to `bool`. Numbers are true when non-zero; text must
/// spell `true` or `false` (any case).
pub fn to_bool(value: &Value) -> Coerced<bool> {
    match value {
        Value::Null => Coerced::hit(false),
        Value::Bool(b) => Coerced::hit(*b),
        Value::Int(i) => Coerced::hit(*i != 0),
        Value::UInt(u) => Coerced::hit(*u != 0),
        Value::Float(x) => Coerced::hit(*x != 0.0),
        Value::Text(s) => {
            let s = s.trim();
            if s.eq_ignore_ascii_case("true") {
                Coerced::hit(true)
            } else if s.eq_ignore_ascii_case("false") {
                Coerced::hit(false)
            } else {
                Coerced::zero()
            }
        }
        Value::DateTime(_) | Value::Uuid(_) => Coerced::zero(),
    }
}

/// Lenient conversion to `f64`.
pub fn to_f64(value: &Value) -> Coerced<f64> {
    match value {
        Value::Null => Coerced::hit(0.0),
        Value::Bool(b) => Coerced::hit(if *b { 1.0 } else { 0.0 }),
        Value::Int(i) => Coerced::hit(*i as f64),
        Value::UInt(u) => Coerced::hit(*u as f64),
        Value::Float(x) => Coerced::hit(*x),
        Value::Text(s) => match s.trim().parse::<f64>() {
            Ok(x) => Coerced::hit(x),
            Err(_) => Coerced::zero(),
        },
        Value::DateTime(_) | Value::Uuid(_) => Coerced::zero(),
    }
}

/// Lenient conversion to text. Never fails; `Null` becomes the empty string.
pub fn to_text(value: &Value) -> Coerced<String> {
    match value {
        Value::Null => Coerced::hit(String::new()),
        Value::Text(s) => Coerced::hit(s.clone()),
        other => Coerced::hit(other.to_string()),
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

/// Lenient conversion to a naive timestamp. Accepts RFC 3339, the common
/// ISO-like layouts and bare dates (midnight).
pub fn to_datetime(value: &Value) -> Coerced<NaiveDateTime> {
    match value {
        Value::Null => Coerced::hit(NaiveDateTime::default()),
        Value::DateTime(dt) => Coerced::hit(*dt),
        Value::Text(s) => {
            let s = s.trim();
            if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
                return Coerced::hit(dt.naive_utc());
            }
            for format in DATETIME_FORMATS {
                if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
                    return Coerced::hit(dt);
                }
            }
            match NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
            {
                Some(dt) => Coerced::hit(dt),
                None => Coerced::zero(),
            }
        }
        _ => Coerced::zero(),
    }
}

/// Lenient conversion to a UUID.
pub fn to_uuid(value: &Value) -> Coerced<Uuid> {
    match value {
        Value::Null => Coerced::hit(Uuid::nil()),
        Value::Uuid(u) => Coerced::hit(*u),
        Value::Text(s) => match Uuid::parse_str(s.trim()) {
            Ok(u) => Coerced::hit(u),
            Err(_) => Coerced::zero(),
        },
        _ => Coerced::zero(),
    }
}

/// Convert `value` to the given kind, falling back to the kind's zero value.
pub fn coerce(value: &Value, kind: ValueKind) -> Coerced<Value> {
    fn lift<T>(c: Coerced<T>, f: impl FnOnce(T) -> Value) -> Coerced<Value> {
        Coerced {
            value: f(c.value),
            ok: c.ok,
        }
    }

    match kind {
        ValueKind::Bool => lift(to_bool(value), Value::Bool),
        ValueKind::Int => lift(to_i64(value), Value::Int),
        ValueKind::UInt => lift(to_u64(value), Value::UInt),
        ValueKind::Float => lift(to_f64(value), Value::Float),
        ValueKind::Text => lift(to_text(value), Value::Text),
        ValueKind::DateTime => lift(to_datetime(value), Value::DateTime),
        ValueKind::Uuid => lift(to_uuid(value), Value::Uuid),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_to_numbers() {
        assert_eq!(to_u64(&Value::Text(" 42 ".into())), Coerced { value: 42, ok: true });
        assert_eq!(to_u16(&Value::Text("2.6".into())).value, 3);
        assert_eq!(to_i32(&Value::Text("-7".into())).value, -7);
    }

    #[test]
    fn test_failure_yields_zero() {
        let c = to_u64(&Value::Text("abc".into()));
        assert_eq!(c, Coerced { value: 0, ok: false });

        let c = to_u16(&Value::Int(70_000));
        assert_eq!(c, Coerced { value: 0, ok: false });

        let c = to_u64(&Value::Int(-1));
        assert!(!c.ok);
        assert_eq!(c.value, 0);

        assert_eq!(to_bool(&Value::Text("yes".into())), Coerced { value: false, ok: false });
    }

    #[test]
    fn test_null_is_zero_and_ok() {
        assert_eq!(to_u64(&Value::Null), Coerced { value: 0, ok: true });
        assert_eq!(to_text(&Value::Null), Coerced { value: String::new(), ok: true });
        assert_eq!(to_bool(&Value::Null), Coerced { value: false, ok: true });
    }

    #[test]
    fn test_bool_conversions() {
        assert!(to_bool(&Value::Text("TRUE".into())).value);
        assert!(to_bool(&Value::UInt(2)).value);
        assert!(!to_bool(&Value::Int(0)).value);
        assert_eq!(to_u8(&Value::Bool(true)).value, 1);
    }

    #[test]
    fn test_datetime_parsing() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        assert_eq!(to_datetime(&Value::Text("2024-03-01".into())).value, expected);
        assert_eq!(
            to_datetime(&Value::Text("2024-03-01T00:00:00Z".into())).value,
            expected
        );
        assert_eq!(
            to_datetime(&Value::Text("2024-03-01 00:00:00".into())).value,
            expected
        );
        assert!(!to_datetime(&Value::Text("yesterday".into())).ok);
    }

    #[test]
    fn test_coerce_to_kind() {
        assert_eq!(coerce(&Value::Text("5".into()), ValueKind::Int).value, Value::Int(5));
        assert_eq!(coerce(&Value::UInt(5), ValueKind::Text).value, Value::Text("5".into()));
        let miss = coerce(&Value::Text("x".into()), ValueKind::Uuid);
        assert!(!miss.ok);
        assert_eq!(miss.value, Value::Uuid(Uuid::nil()));
    }
}

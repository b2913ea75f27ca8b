//! Value conversion between sea-query values and `may_postgres`.
//!
//! Parameters are converted to the exact types the prepared statement
//! declares, so a `u64` operand compared against an `int4` column binds as an
//! `i32`. Rows are decoded by their column types and then coerced to the
//! kinds of the element shape.
//!
//! The conversion follows a two-pass pattern:
//! 1. First pass: convert every value into an owned parameter
//! 2. Second pass: create references to the stored parameters
//!
//! This pattern ensures that references remain valid within the closure scope.

use crate::executor::LifeError;
use crate::shape::{Record, ShapeInfo};
use crate::value::coerce::{self, Coerced};
use crate::value::Value;
use chrono::{DateTime, NaiveDateTime, Utc};
use may_postgres::types::{ToSql, Type};
use may_postgres::Row;
use uuid::Uuid;

enum Param {
    Bool(Option<bool>),
    SmallInt(Option<i16>),
    Int(Option<i32>),
    BigInt(Option<i64>),
    Real(Option<f32>),
    Double(Option<f64>),
    Text(Option<String>),
    Timestamp(Option<NaiveDateTime>),
    TimestampTz(Option<DateTime<Utc>>),
    Uuid(Option<Uuid>),
}

impl Param {
    /// Typed `NULL`, so the server sees the declared parameter type.
    fn null(ty: &Type) -> Self {
        match *ty {
            Type::BOOL => Param::Bool(None),
            Type::INT2 => Param::SmallInt(None),
            Type::INT4 => Param::Int(None),
            Type::INT8 => Param::BigInt(None),
            Type::FLOAT4 => Param::Real(None),
            Type::FLOAT8 => Param::Double(None),
            Type::TIMESTAMP => Param::Timestamp(None),
            Type::TIMESTAMPTZ => Param::TimestampTz(None),
            Type::UUID => Param::Uuid(None),
            _ => Param::Text(None),
        }
    }

    fn as_sql(&self) -> &dyn ToSql {
        match self {
            Param::Bool(v) => v,
            Param::SmallInt(v) => v,
            Param::Int(v) => v,
            Param::BigInt(v) => v,
            Param::Real(v) => v,
            Param::Double(v) => v,
            Param::Text(v) => v,
            Param::Timestamp(v) => v,
            Param::TimestampTz(v) => v,
            Param::Uuid(v) => v,
        }
    }
}

/// Read a sea-query value back into a [`Value`].
fn from_sea(value: &sea_query::Value) -> Result<Value, LifeError> {
    use sea_query::Value as Sv;

    let converted = match value {
        Sv::Bool(Some(b)) => Value::Bool(*b),
        Sv::TinyInt(Some(i)) => Value::Int(i64::from(*i)),
        Sv::SmallInt(Some(i)) => Value::Int(i64::from(*i)),
        Sv::Int(Some(i)) => Value::Int(i64::from(*i)),
        Sv::BigInt(Some(i)) => Value::Int(*i),
        Sv::TinyUnsigned(Some(u)) => Value::UInt(u64::from(*u)),
        Sv::SmallUnsigned(Some(u)) => Value::UInt(u64::from(*u)),
        Sv::Unsigned(Some(u)) => Value::UInt(u64::from(*u)),
        Sv::BigUnsigned(Some(u)) => Value::UInt(*u),
        Sv::Float(Some(x)) => Value::Float(f64::from(*x)),
        Sv::Double(Some(x)) => Value::Float(*x),
        Sv::String(Some(s)) => Value::Text(s.to_string()),
        Sv::Bool(None)
        | Sv::TinyInt(None)
        | Sv::SmallInt(None)
        | Sv::Int(None)
        | Sv::BigInt(None)
        | Sv::TinyUnsigned(None)
        | Sv::SmallUnsigned(None)
        | Sv::Unsigned(None)
        | Sv::BigUnsigned(None)
        | Sv::Float(None)
        | Sv::Double(None)
        | Sv::String(None) => Value::Null,
        other => {
            if let Ok(dt) = <NaiveDateTime as sea_query::ValueType>::try_from(other.clone()) {
                Value::DateTime(dt)
            } else if let Ok(u) = <Uuid as sea_query::ValueType>::try_from(other.clone()) {
                Value::Uuid(u)
            } else {
                return Err(LifeError::Other(format!(
                    "Unsupported value type in query: {other:?}"
                )));
            }
        }
    };
    Ok(converted)
}

fn exact<T>(value: &Value, ty: &Type, coerced: Coerced<T>) -> Result<T, LifeError> {
    if coerced.ok {
        Ok(coerced.value)
    } else {
        Err(LifeError::QueryError(format!(
            "parameter {value} cannot be sent as {ty}"
        )))
    }
}

fn to_param(value: &sea_query::Value, ty: &Type) -> Result<Param, LifeError> {
    let value = from_sea(value)?;
    if value.is_null() {
        return Ok(Param::null(ty));
    }
    let param = match *ty {
        Type::BOOL => Param::Bool(Some(exact(&value, ty, coerce::to_bool(&value))?)),
        Type::INT2 => Param::SmallInt(Some(exact(&value, ty, coerce::to_i16(&value))?)),
        Type::INT4 => Param::Int(Some(exact(&value, ty, coerce::to_i32(&value))?)),
        Type::INT8 => Param::BigInt(Some(exact(&value, ty, coerce::to_i64(&value))?)),
        #[allow(clippy::cast_possible_truncation)]
        Type::FLOAT4 => Param::Real(Some(exact(&value, ty, coerce::to_f64(&value))? as f32)),
        Type::FLOAT8 => Param::Double(Some(exact(&value, ty, coerce::to_f64(&value))?)),
        Type::TIMESTAMP => Param::Timestamp(Some(exact(&value, ty, coerce::to_datetime(&value))?)),
        Type::TIMESTAMPTZ => {
            let naive = exact(&value, ty, coerce::to_datetime(&value))?;
            Param::TimestampTz(Some(DateTime::from_naive_utc_and_offset(naive, Utc)))
        }
        Type::UUID => Param::Uuid(Some(exact(&value, ty, coerce::to_uuid(&value))?)),
        // text-like and untyped parameters (e.g. `SELECT $1 AS "x"`)
        _ => Param::Text(Some(coerce::to_text(&value).into_inner())),
    };
    Ok(param)
}

/// Convert SeaQuery values to the parameter types of a prepared statement,
/// then execute a closure with the converted parameters.
///
/// # Errors
///
/// Returns `LifeError::QueryError` if a value cannot be represented in the
/// declared parameter type, or `LifeError::Other` for unsupported values.
pub fn with_converted_params<F, R>(values: &sea_query::Values, types: &[Type], f: F) -> Result<R, LifeError>
where
    F: FnOnce(&[&dyn ToSql]) -> Result<R, LifeError>,
{
    if values.0.len() != types.len() {
        return Err(LifeError::QueryError(format!(
            "statement declares {} parameters, query bound {}",
            types.len(),
            values.0.len()
        )));
    }

    // First pass: convert all values into owned parameters
    let owned = values
        .iter()
        .zip(types)
        .map(|(value, ty)| to_param(value, ty))
        .collect::<Result<Vec<_>, _>>()?;

    // Second pass: create references to the stored values
    let params: Vec<&dyn ToSql> = owned.iter().map(Param::as_sql).collect();

    f(&params)
}

fn decode_column(row: &Row, idx: usize, ty: &Type) -> Result<Value, may_postgres::Error> {
    let value = match *ty {
        Type::BOOL => row.try_get::<_, Option<bool>>(idx)?.map(Value::Bool),
        Type::INT2 => row.try_get::<_, Option<i16>>(idx)?.map(|v| Value::Int(i64::from(v))),
        Type::INT4 => row.try_get::<_, Option<i32>>(idx)?.map(|v| Value::Int(i64::from(v))),
        Type::INT8 => row.try_get::<_, Option<i64>>(idx)?.map(Value::Int),
        Type::FLOAT4 => row.try_get::<_, Option<f32>>(idx)?.map(|v| Value::Float(f64::from(v))),
        Type::FLOAT8 => row.try_get::<_, Option<f64>>(idx)?.map(Value::Float),
        Type::TIMESTAMP => row.try_get::<_, Option<NaiveDateTime>>(idx)?.map(Value::DateTime),
        Type::TIMESTAMPTZ => row
            .try_get::<_, Option<DateTime<Utc>>>(idx)?
            .map(|v| Value::DateTime(v.naive_utc())),
        Type::UUID => row.try_get::<_, Option<Uuid>>(idx)?.map(Value::Uuid),
        _ => row.try_get::<_, Option<String>>(idx)?.map(Value::Text),
    };
    Ok(value.unwrap_or(Value::Null))
}

/// Decode one result row into a record of `shape`.
///
/// Columns are matched by name. A missing column or a value that does not
/// convert to the property kind is a parse error; SQL `NULL` stays `Null`.
pub fn decode_row(row: &Row, shape: ShapeInfo) -> Result<Record, LifeError> {
    let mut record = Record::with_capacity(shape.properties.len());
    for property in shape.properties {
        let (idx, column) = row
            .columns()
            .iter()
            .enumerate()
            .find(|(_, c)| c.name() == property.name)
            .ok_or_else(|| {
                LifeError::ParseError(format!("column [{}] missing from result", property.name))
            })?;
        let raw = decode_column(row, idx, column.type_()).map_err(|e| {
            LifeError::ParseError(format!("column [{}]: {e}", property.name))
        })?;
        let value = if raw.is_null() {
            raw
        } else {
            let coerced = coerce::coerce(&raw, property.kind);
            if !coerced.ok {
                return Err(LifeError::ParseError(format!(
                    "column [{}]: {raw} is not {}",
                    property.name, property.kind
                )));
            }
            coerced.value
        };
        record.insert(property.name, value);
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_follow_declared_types() {
        let values = sea_query::Values(vec![
            sea_query::Value::BigUnsigned(Some(7)),
            sea_query::Value::BigInt(Some(3)),
            sea_query::Value::String(Some("%ab%".into())),
        ]);
        let types = [Type::INT4, Type::FLOAT8, Type::TEXT];
        let count = with_converted_params(&values, &types, |params| Ok(params.len())).unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn test_out_of_range_param_fails() {
        let values = sea_query::Values(vec![sea_query::Value::BigUnsigned(Some(u64::MAX))]);
        let err = with_converted_params(&values, &[Type::INT4], |_| Ok(())).unwrap_err();
        assert!(matches!(err, LifeError::QueryError(_)));
    }

    #[test]
    fn test_param_count_mismatch() {
        let values = sea_query::Values(vec![]);
        assert!(with_converted_params(&values, &[Type::INT4], |_| Ok(())).is_err());
    }

    #[test]
    fn test_untyped_params_travel_as_text() {
        let value = sea_query::Value::BigInt(Some(0));
        assert!(matches!(to_param(&value, &Type::UNKNOWN), Ok(Param::Text(Some(s))) if s == "0"));
        let null = sea_query::Value::String(None);
        assert!(matches!(to_param(&null, &Type::INT4), Ok(Param::Int(None))));
    }
}

//! Conversion between [`Value`]s and SQLite column values, driven by the
//! declared field type.

use crate::error::{StorageError, StorageResult};
use chrono::{DateTime, NaiveDate};
use formwork_schema::{FieldType, SchemaField};
use formwork_types::Value;
use rusqlite::types::{Value as SqlValue, ValueRef};

/// Converts a value into the SQLite representation for `field`.
pub(crate) fn to_sql(entity: &str, field: &SchemaField, value: &Value) -> StorageResult<SqlValue> {
    let invalid = |reason: String| StorageError::InvalidValue {
        entity: entity.to_string(),
        field: field.name.clone(),
        reason,
    };

    if value.is_null() {
        return Ok(SqlValue::Null);
    }

    match field.field_type {
        FieldType::String => match value {
            Value::String(s) => Ok(SqlValue::Text(s.clone())),
            Value::Number(_) | Value::Bool(_) => Ok(SqlValue::Text(value.to_string())),
            other => Err(invalid(format!("expected string, got {}", other.kind()))),
        },
        FieldType::Integer => match value {
            Value::Number(_) => value
                .as_i64()
                .map(SqlValue::Integer)
                .ok_or_else(|| invalid(format!("{value} is not an integer"))),
            Value::Bool(b) => Ok(SqlValue::Integer(i64::from(*b))),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(SqlValue::Integer)
                .map_err(|_| invalid(format!("'{s}' is not an integer"))),
            other => Err(invalid(format!("expected integer, got {}", other.kind()))),
        },
        FieldType::Number => match value {
            Value::Number(n) => Ok(SqlValue::Real(*n)),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map(SqlValue::Real)
                .map_err(|_| invalid(format!("'{s}' is not a number"))),
            other => Err(invalid(format!("expected number, got {}", other.kind()))),
        },
        FieldType::Boolean => match value {
            Value::Bool(b) => Ok(SqlValue::Integer(i64::from(*b))),
            Value::Number(n) if *n == 0.0 || *n == 1.0 => Ok(SqlValue::Integer(*n as i64)),
            other => Err(invalid(format!("expected boolean, got {other}"))),
        },
        FieldType::DateTime => match value {
            Value::Number(_) => value
                .as_i64()
                .map(SqlValue::Integer)
                .ok_or_else(|| invalid(format!("{value} is not an epoch millisecond value"))),
            Value::String(s) => parse_timestamp_millis(s)
                .map(SqlValue::Integer)
                .ok_or_else(|| invalid(format!("'{s}' is not an RFC 3339 date-time or date"))),
            other => Err(invalid(format!("expected date-time, got {}", other.kind()))),
        },
    }
}

/// Converts a column value read from SQLite back into a [`Value`].
pub(crate) fn from_sql(field_type: FieldType, raw: ValueRef<'_>) -> Value {
    match raw {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) if field_type == FieldType::Boolean => Value::Bool(i != 0),
        ValueRef::Integer(i) => Value::Number(i as f64),
        ValueRef::Real(f) => Value::Number(f),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(_) => Value::Null,
    }
}

/// Parses an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC)
/// into epoch milliseconds.
fn parse_timestamp_millis(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(field_type: FieldType) -> SchemaField {
        SchemaField::new("f", field_type)
    }

    #[test]
    fn booleans_store_as_zero_or_one() {
        let f = field(FieldType::Boolean);
        assert_eq!(to_sql("E", &f, &Value::Bool(true)).unwrap(), SqlValue::Integer(1));
        assert_eq!(to_sql("E", &f, &Value::Bool(false)).unwrap(), SqlValue::Integer(0));
        assert!(to_sql("E", &f, &Value::String("yes".into())).is_err());
    }

    #[test]
    fn integers_reject_fractions() {
        let f = field(FieldType::Integer);
        assert_eq!(to_sql("E", &f, &Value::Number(7.0)).unwrap(), SqlValue::Integer(7));
        assert!(to_sql("E", &f, &Value::Number(7.5)).is_err());
        assert_eq!(to_sql("E", &f, &Value::String(" 12 ".into())).unwrap(), SqlValue::Integer(12));
    }

    #[test]
    fn date_times_store_epoch_millis() {
        let f = field(FieldType::DateTime);
        assert_eq!(
            to_sql("E", &f, &Value::String("1970-01-01T00:00:01Z".into())).unwrap(),
            SqlValue::Integer(1000)
        );
        assert_eq!(
            to_sql("E", &f, &Value::String("1970-01-02".into())).unwrap(),
            SqlValue::Integer(86_400_000)
        );
        assert_eq!(to_sql("E", &f, &Value::Number(42.0)).unwrap(), SqlValue::Integer(42));
        assert!(to_sql("E", &f, &Value::String("yesterday".into())).is_err());
    }

    #[test]
    fn null_is_always_accepted() {
        for ft in [FieldType::String, FieldType::Integer, FieldType::Boolean] {
            assert_eq!(to_sql("E", &field(ft), &Value::Null).unwrap(), SqlValue::Null);
        }
    }

    #[test]
    fn reads_booleans_back_as_bool() {
        assert_eq!(from_sql(FieldType::Boolean, ValueRef::Integer(1)), Value::Bool(true));
        assert_eq!(from_sql(FieldType::Integer, ValueRef::Integer(1)), Value::Number(1.0));
    }
}

//! Field values: form input parsing, SQL parameters and display formatting

use chrono::NaiveDate;
use rusqlite::types::{ToSql, ToSqlOutput, Value as SqliteValue, ValueRef};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::error::RecordError;
use super::schema::{FieldSpec, FieldType};

/// Storage format for dates
pub const ISO_DATE: &str = "%Y-%m-%d";
/// Display and alternate input format for dates
pub const DISPLAY_DATE: &str = "%d.%m.%Y";

/// SQL value for parameterized statements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Null => ToSqlOutput::Owned(SqliteValue::Null),
            SqlValue::Integer(i) => ToSqlOutput::Owned(SqliteValue::Integer(*i)),
            SqlValue::Real(f) => ToSqlOutput::Owned(SqliteValue::Real(*f)),
            SqlValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

/// Parse a date typed by a user, as either `YYYY-MM-DD` or `dd.mm.yyyy`
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    NaiveDate::parse_from_str(input, ISO_DATE)
        .or_else(|_| NaiveDate::parse_from_str(input, DISPLAY_DATE))
        .ok()
}

/// Render a stored ISO date as `dd.mm.yyyy`. Anything unparseable is shown as stored.
pub fn display_date(stored: &str) -> String {
    match NaiveDate::parse_from_str(stored, ISO_DATE) {
        Ok(date) => date.format(DISPLAY_DATE).to_string(),
        Err(_) => stored.to_string(),
    }
}

/// Convert one submitted form value into its SQL parameter.
///
/// Numbers are checked here so a bad value never reaches the database.
pub fn parse_field(spec: &FieldSpec, raw: &str) -> Result<SqlValue, RecordError> {
    let trimmed = raw.trim();
    let invalid = |why: &str| RecordError::Validation(format!("{}: {}", spec.label, why));

    match spec.field_type {
        FieldType::Text => Ok(SqlValue::Text(raw.to_string())),
        FieldType::Choice(options) => {
            if options.contains(&trimmed) {
                Ok(SqlValue::Text(trimmed.to_string()))
            } else {
                Err(invalid(&format!(
                    "'{}' is not one of {}",
                    trimmed,
                    options.iter().filter(|o| !o.is_empty()).cloned().collect::<Vec<_>>().join(", ")
                )))
            }
        }
        FieldType::Date => {
            if trimmed.is_empty() {
                return Ok(SqlValue::Null);
            }
            parse_date(trimmed)
                .map(|d| SqlValue::Text(d.format(ISO_DATE).to_string()))
                .ok_or_else(|| invalid("expected a date like 2001-03-31 or 31.03.2001"))
        }
        FieldType::Real => {
            let value: f64 = trimmed
                .parse()
                .map_err(|_| invalid("must be a number"))?;
            if !value.is_finite() || value < 0.0 {
                return Err(invalid("must be a non-negative number"));
            }
            Ok(SqlValue::Real(value))
        }
        FieldType::Integer => {
            let value: i64 = trimmed
                .parse()
                .map_err(|_| invalid("must be a whole number"))?;
            if value < 0 {
                return Err(invalid("must not be negative"));
            }
            Ok(SqlValue::Integer(value))
        }
        FieldType::ForeignKey(_) => {
            if trimmed.is_empty() {
                return Ok(SqlValue::Null);
            }
            trimmed
                .parse::<i64>()
                .map(SqlValue::Integer)
                .map_err(|_| invalid("must be a numeric id"))
        }
    }
}

/// Value used for a field the form did not submit
pub fn missing_field(spec: &FieldSpec) -> Result<SqlValue, RecordError> {
    match spec.field_type {
        FieldType::Real | FieldType::Integer => {
            Err(RecordError::Validation(format!("{}: is required", spec.label)))
        }
        _ => Ok(SqlValue::Null),
    }
}

/// Convert a rusqlite ValueRef to serde_json Value
pub(crate) fn value_ref_to_json(val: ValueRef<'_>) -> Value {
    match val {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => json!(i),
        ValueRef::Real(f) => json!(f),
        ValueRef::Text(t) => json!(String::from_utf8_lossy(t).to_string()),
        ValueRef::Blob(b) => json!(format!("BLOB({} bytes)", b.len())),
    }
}

/// Text for one grid cell. Null renders empty, dates render `dd.mm.yyyy`.
pub fn display_cell(field_type: Option<FieldType>, value: &Value) -> String {
    match (field_type, value) {
        (_, Value::Null) => String::new(),
        (Some(FieldType::Date), Value::String(s)) => display_date(s),
        (_, Value::String(s)) => s.clone(),
        (_, other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::records::schema::{EntityKind, MEDAL_MATERIALS};

    fn spec(field_type: FieldType) -> FieldSpec {
        FieldSpec {
            name: "f",
            label: "Field",
            field_type,
        }
    }

    #[test]
    fn test_dates_accept_both_formats() {
        let expected = SqlValue::Text("2001-03-31".to_string());
        assert_eq!(parse_field(&spec(FieldType::Date), "2001-03-31").unwrap(), expected);
        assert_eq!(parse_field(&spec(FieldType::Date), "31.03.2001").unwrap(), expected);
        assert_eq!(parse_field(&spec(FieldType::Date), "").unwrap(), SqlValue::Null);
        assert!(parse_field(&spec(FieldType::Date), "31/03/2001").is_err());
    }

    #[test]
    fn test_display_date() {
        assert_eq!(display_date("2001-03-31"), "31.03.2001");
        assert_eq!(display_date("garbage"), "garbage");
    }

    #[test]
    fn test_numbers() {
        assert_eq!(parse_field(&spec(FieldType::Real), " 7.5 ").unwrap(), SqlValue::Real(7.5));
        assert_eq!(parse_field(&spec(FieldType::Integer), "12").unwrap(), SqlValue::Integer(12));

        for bad in ["abc", "", "-1", "NaN"] {
            assert!(
                matches!(parse_field(&spec(FieldType::Real), bad), Err(RecordError::Validation(_))),
                "accepted {:?}",
                bad
            );
        }
        assert!(parse_field(&spec(FieldType::Integer), "1.5").is_err());
    }

    #[test]
    fn test_foreign_keys_optional_but_numeric() {
        let fk = spec(FieldType::ForeignKey(EntityKind::Medals));
        assert_eq!(parse_field(&fk, "").unwrap(), SqlValue::Null);
        assert_eq!(parse_field(&fk, "3").unwrap(), SqlValue::Integer(3));
        assert!(matches!(parse_field(&fk, "three"), Err(RecordError::Validation(_))));
    }

    #[test]
    fn test_choices() {
        let choice = spec(FieldType::Choice(MEDAL_MATERIALS));
        assert_eq!(parse_field(&choice, "Gold").unwrap(), SqlValue::Text("Gold".to_string()));
        let err = parse_field(&choice, "Tin").unwrap_err();
        assert!(err.to_string().contains("Gold, Silver, Bronze, Other"));
    }

    #[test]
    fn test_missing_numbers_are_required() {
        assert!(missing_field(&spec(FieldType::Real)).is_err());
        assert_eq!(missing_field(&spec(FieldType::Text)).unwrap(), SqlValue::Null);
    }

    #[test]
    fn test_display_cell() {
        assert_eq!(display_cell(Some(FieldType::Date), &json!("2020-01-02")), "02.01.2020");
        assert_eq!(display_cell(None, &Value::Null), "");
        assert_eq!(display_cell(Some(FieldType::Integer), &json!(4)), "4");
        assert_eq!(display_cell(Some(FieldType::Text), &json!("x")), "x");
    }
}

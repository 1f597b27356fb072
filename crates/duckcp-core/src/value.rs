//! Backend-neutral values and materialized query results.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde_json::{Map, Number, Value as JsonValue};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S%.f";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// A single SQL value as moved between repositories.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    Decimal(Decimal),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
}

/// Type of a result column as reported by the source, used when the values alone cannot tell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Boolean,
    Integer,
    Real,
    Text,
    Blob,
    /// Carries the scale.
    Decimal(u32),
    Date,
    Time,
    Timestamp,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn kind(&self) -> Option<ValueKind> {
        Some(match self {
            Value::Null => return None,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Integer(_) => ValueKind::Integer,
            Value::Real(_) => ValueKind::Real,
            Value::Text(_) => ValueKind::Text,
            Value::Blob(_) => ValueKind::Blob,
            Value::Decimal(d) => ValueKind::Decimal(d.scale()),
            Value::Date(_) => ValueKind::Date,
            Value::Time(_) => ValueKind::Time,
            Value::Timestamp(_) => ValueKind::Timestamp,
        })
    }

    /// Converts a JSON value; arrays and objects are kept as their JSON text.
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Boolean(*b),
            JsonValue::Number(n) => {
                n.as_i64()
                    .map(Value::Integer)
                    .or_else(|| n.as_f64().map(Value::Real))
                    .unwrap_or_else(|| Value::Text(n.to_string()))
            }
            JsonValue::String(s) => Value::Text(s.clone()),
            other => Value::Text(other.to_string()),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Boolean(b) => JsonValue::Bool(*b),
            Value::Integer(i) => JsonValue::from(*i),
            Value::Real(f) => Number::from_f64(*f).map_or(JsonValue::Null, JsonValue::Number),
            Value::Text(s) => JsonValue::String(s.clone()),
            Value::Blob(b) => JsonValue::String(String::from_utf8_lossy(b).into_owned()),
            Value::Decimal(d) => {
                d.to_f64()
                    .and_then(Number::from_f64)
                    .map_or_else(|| JsonValue::String(d.to_string()), JsonValue::Number)
            }
            Value::Date(_) | Value::Time(_) | Value::Timestamp(_) => {
                JsonValue::String(self.to_string())
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Blob(b) => write!(f, "{}", String::from_utf8_lossy(b)),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Value::Time(t) => write!(f, "{}", t.format(TIME_FORMAT)),
            Value::Timestamp(ts) => write!(f, "{}", ts.format(TIMESTAMP_FORMAT)),
        }
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

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Value::Decimal(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

impl From<NaiveTime> for Value {
    fn from(value: NaiveTime) -> Self {
        Value::Time(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::Timestamp(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// A fully fetched query result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    /// Source column types, when the backend reports them. Empty otherwise.
    pub kinds: Vec<Option<ValueKind>>,
}

impl Dataset {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns,
            rows,
            kinds: Vec::new(),
        }
    }

    pub fn with_kinds(mut self, kinds: Vec<Option<ValueKind>>) -> Self {
        self.kinds = kinds;
        self
    }

    pub fn kind(&self, idx: usize) -> Option<ValueKind> {
        self.kinds.get(idx).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows as JSON objects keyed by column name.
    pub fn records(&self) -> Vec<Map<String, JsonValue>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row)
                    .map(|(column, value)| (column.clone(), value.to_json()))
                    .collect()
            })
            .collect()
    }

    /// Builds a dataset from JSON objects. Columns follow first appearance, after `leading`.
    pub fn from_records<'a, I>(leading: &[&str], records: I) -> Self
    where
        I: IntoIterator<Item = &'a Map<String, JsonValue>>,
    {
        let records: Vec<&Map<String, JsonValue>> = records.into_iter().collect();
        let mut columns: Vec<String> = leading.iter().map(|c| c.to_string()).collect();
        for record in &records {
            for key in record.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }

        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|column| record.get(column).map_or(Value::Null, Value::from_json))
                    .collect()
            })
            .collect();

        Self::new(columns, rows)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_json_conversion() {
        assert_eq!(Value::from_json(&json!(1)), Value::Integer(1));
        assert_eq!(Value::from_json(&json!(1.5)), Value::Real(1.5));
        assert_eq!(Value::from_json(&json!("a")), Value::Text("a".into()));
        assert_eq!(Value::from_json(&json!(null)), Value::Null);
        assert_eq!(
            Value::from_json(&json!([{"text": "a"}])),
            Value::Text(r#"[{"text":"a"}]"#.into())
        );
        assert_eq!(Value::Real(f64::NAN).to_json(), JsonValue::Null);
    }

    #[test]
    fn test_typed_values() {
        let amount: Decimal = "1.50".parse().unwrap();
        assert_eq!(Value::Decimal(amount).to_string(), "1.50");
        assert_eq!(Value::Decimal(amount).to_json(), json!(1.5));
        assert_eq!(Value::Decimal(amount).kind(), Some(ValueKind::Decimal(2)));

        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(Value::Date(day).to_json(), json!("2024-06-01"));
        let ts = day.and_hms_opt(12, 30, 0).unwrap();
        assert_eq!(Value::Timestamp(ts).to_string(), "2024-06-01 12:30:00");
        assert_eq!(Value::Null.kind(), None);
    }

    #[test]
    fn test_records() {
        let dataset = Dataset::new(
            vec!["id".into(), "name".into()],
            vec![
                vec![Value::Integer(1), Value::from("a")],
                vec![Value::Integer(2), Value::Null],
            ],
        );
        let records = dataset.records();
        assert_eq!(records[0]["name"], "a");
        assert_eq!(records[1]["name"], JsonValue::Null);
    }

    #[test]
    fn test_from_records_unions_columns() {
        let first = json!({"name": "a"});
        let second = json!({"name": "b", "age": 3});
        let records = [first.as_object().unwrap(), second.as_object().unwrap()];
        let dataset = Dataset::from_records(&["id"], records);

        assert_eq!(dataset.columns, vec!["id", "name", "age"]);
        assert_eq!(
            dataset.rows[0],
            vec![Value::Null, Value::from("a"), Value::Null]
        );
        assert_eq!(dataset.rows[1][2], Value::Integer(3));
    }
}

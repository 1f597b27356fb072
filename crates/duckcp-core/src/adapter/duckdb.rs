use ::duckdb::{
    arrow::datatypes::DataType,
    params_from_iter,
    types::{TimeUnit, ToSqlOutput, Value as DuckValue},
    ToSql,
};
use chrono::{DateTime, NaiveTime};
use rust_decimal::Decimal;
use tracing::{debug, trace};

use super::Connection;
use crate::{
    error::DuckcpResult,
    sql::{quote_identifier, quote_literal, Dialect, Statement, TableRef},
    value::{Dataset, Value, ValueKind},
};

/// An embedded DuckDB session.
///
/// Besides plain SQL it can register a [`Dataset`] as a temporary relation
/// `temp.main."<name>"`, which the snapshot and file-export strategies read from.
pub struct DuckDbConnection {
    conn: ::duckdb::Connection,
}

impl DuckDbConnection {
    /// Opens a database file, or an in-memory database when `file` is `None`.
    pub fn open(file: Option<&str>) -> DuckcpResult<Self> {
        let conn = match file {
            Some(file) => ::duckdb::Connection::open(file)?,
            None => ::duckdb::Connection::open_in_memory()?,
        };
        Ok(Self { conn })
    }

    pub fn in_memory() -> DuckcpResult<Self> {
        Self::open(None)
    }

    /// In-memory session that resolves relative file references against `folder`.
    pub fn in_folder(folder: &str) -> DuckcpResult<Self> {
        let conn = Self::in_memory()?;
        conn.conn
            .execute_batch(&format!("SET file_search_path = {}", quote_literal(folder)))?;
        debug!(folder, "file search path set");
        Ok(conn)
    }

    /// Materializes `dataset` as the temporary table `temp.main."<name>"`.
    pub fn register(&mut self, name: &str, dataset: &Dataset) -> DuckcpResult<()> {
        let types: Vec<ColumnType> = (0..dataset.columns.len())
            .map(|idx| {
                ColumnType::infer(dataset.rows.iter().map(|row| &row[idx]), dataset.kind(idx))
            })
            .collect();

        let definition = if dataset.columns.is_empty() {
            "\"id\" VARCHAR".to_string()
        } else {
            dataset
                .columns
                .iter()
                .zip(&types)
                .map(|(column, ty)| Ok(format!("{} {}", quote_identifier(column)?, ty.sql())))
                .collect::<DuckcpResult<Vec<_>>>()?
                .join(", ")
        };
        let table = TableRef::temporary(name);
        self.conn.execute_batch(&format!(
            "CREATE OR REPLACE TEMP TABLE {} ({definition})",
            quote_identifier(name)?
        ))?;

        if !dataset.columns.is_empty() && !dataset.is_empty() {
            let insert = Statement::InsertInto {
                table,
                columns: dataset.columns.clone(),
            }
            .render(Dialect::DuckDb)?;
            let rows: Vec<Vec<Value>> = dataset
                .rows
                .iter()
                .map(|row| row.iter().zip(&types).map(|(v, ty)| ty.coerce(v)).collect())
                .collect();
            self.execute_many(&insert, &rows)?;
        }

        debug!(name, rows = dataset.len(), "registered relation");
        Ok(())
    }
}

/// Column type of a registered relation, inferred from its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnType {
    Boolean,
    BigInt,
    Double,
    /// Carries the scale; the width is always the widest DuckDB allows.
    Decimal(u32),
    Blob,
    Varchar,
    Date,
    Time,
    Timestamp,
}

impl ColumnType {
    fn of(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Boolean => ColumnType::Boolean,
            ValueKind::Integer => ColumnType::BigInt,
            ValueKind::Real => ColumnType::Double,
            ValueKind::Text => ColumnType::Varchar,
            ValueKind::Blob => ColumnType::Blob,
            ValueKind::Decimal(scale) => ColumnType::Decimal(scale),
            ValueKind::Date => ColumnType::Date,
            ValueKind::Time => ColumnType::Time,
            ValueKind::Timestamp => ColumnType::Timestamp,
        }
    }

    /// Numbers widen: integers and decimals to DECIMAL, anything mixed with reals to DOUBLE.
    /// Dates mixed with timestamps become TIMESTAMP. Any other mix is VARCHAR.
    /// A column without values takes the source's type, or VARCHAR when that is unknown.
    fn infer<'a>(values: impl Iterator<Item = &'a Value>, hint: Option<ValueKind>) -> Self {
        use ColumnType as C;

        let mut inferred: Option<ColumnType> = None;
        for value in values {
            let Some(kind) = value.kind() else {
                continue;
            };
            let ty = C::of(kind);
            inferred = Some(match (inferred, ty) {
                (None, ty) => ty,
                (Some(C::Decimal(a)), C::Decimal(b)) => C::Decimal(a.max(b)),
                (Some(current), ty) if current == ty => ty,
                (Some(C::BigInt), C::Decimal(s)) | (Some(C::Decimal(s)), C::BigInt) => C::Decimal(s),
                (Some(C::BigInt | C::Double | C::Decimal(_)), C::BigInt | C::Double | C::Decimal(_)) => {
                    C::Double
                }
                (Some(C::Date | C::Timestamp), C::Date | C::Timestamp) => C::Timestamp,
                _ => return C::Varchar,
            });
        }
        inferred.or(hint.map(C::of)).unwrap_or(C::Varchar)
    }

    fn sql(&self) -> String {
        match self {
            ColumnType::Boolean => "BOOLEAN".into(),
            ColumnType::BigInt => "BIGINT".into(),
            ColumnType::Double => "DOUBLE".into(),
            ColumnType::Decimal(scale) => format!("DECIMAL(38, {})", scale.min(&38)),
            ColumnType::Blob => "BLOB".into(),
            ColumnType::Varchar => "VARCHAR".into(),
            ColumnType::Date => "DATE".into(),
            ColumnType::Time => "TIME".into(),
            ColumnType::Timestamp => "TIMESTAMP".into(),
        }
    }

    fn coerce(&self, value: &Value) -> Value {
        match (self, value) {
            (_, Value::Null) => Value::Null,
            (ColumnType::Double, Value::Integer(i)) => Value::Real(*i as f64),
            (ColumnType::Double, Value::Decimal(d)) => {
                d.to_string().parse().map_or(Value::Null, Value::Real)
            }
            (ColumnType::Decimal(_), Value::Integer(i)) => Value::Decimal(Decimal::from(*i)),
            (ColumnType::Timestamp, Value::Date(d)) => Value::Timestamp(d.and_time(NaiveTime::MIN)),
            (ColumnType::Varchar, Value::Text(_)) => value.clone(),
            (ColumnType::Varchar, other) => Value::Text(other.to_string()),
            _ => value.clone(),
        }
    }
}

/// Typed values are bound as text and cast by the column they are inserted into.
impl ToSql for Value {
    fn to_sql(&self) -> ::duckdb::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::Owned(match self {
            Value::Null => DuckValue::Null,
            Value::Boolean(b) => DuckValue::Boolean(*b),
            Value::Integer(i) => DuckValue::BigInt(*i),
            Value::Real(f) => DuckValue::Double(*f),
            Value::Text(s) => DuckValue::Text(s.clone()),
            Value::Blob(b) => DuckValue::Blob(b.clone()),
            Value::Decimal(_) | Value::Date(_) | Value::Time(_) | Value::Timestamp(_) => {
                DuckValue::Text(self.to_string())
            }
        }))
    }
}

fn kind_of(data_type: &DataType) -> Option<ValueKind> {
    Some(match data_type {
        DataType::Boolean => ValueKind::Boolean,
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => ValueKind::Integer,
        DataType::Float16 | DataType::Float32 | DataType::Float64 => ValueKind::Real,
        DataType::Decimal128(_, scale) => ValueKind::Decimal(u32::try_from(*scale).ok()?),
        DataType::Utf8 | DataType::LargeUtf8 => ValueKind::Text,
        DataType::Binary | DataType::LargeBinary => ValueKind::Blob,
        DataType::Date32 | DataType::Date64 => ValueKind::Date,
        DataType::Time32(_) | DataType::Time64(_) => ValueKind::Time,
        DataType::Timestamp(_, None) => ValueKind::Timestamp,
        _ => return None,
    })
}

fn micros(unit: TimeUnit, value: i64) -> i64 {
    match unit {
        TimeUnit::Second => value.saturating_mul(1_000_000),
        TimeUnit::Millisecond => value.saturating_mul(1_000),
        TimeUnit::Microsecond => value,
        TimeUnit::Nanosecond => value / 1_000,
    }
}

fn from_duck_value(value: DuckValue) -> Value {
    match value {
        DuckValue::Null => Value::Null,
        DuckValue::Boolean(b) => Value::Boolean(b),
        DuckValue::TinyInt(i) => Value::Integer(i64::from(i)),
        DuckValue::SmallInt(i) => Value::Integer(i64::from(i)),
        DuckValue::Int(i) => Value::Integer(i64::from(i)),
        DuckValue::BigInt(i) => Value::Integer(i),
        DuckValue::UTinyInt(i) => Value::Integer(i64::from(i)),
        DuckValue::USmallInt(i) => Value::Integer(i64::from(i)),
        DuckValue::UInt(i) => Value::Integer(i64::from(i)),
        DuckValue::UBigInt(i) => {
            i64::try_from(i).map_or_else(|_| Value::Text(i.to_string()), Value::Integer)
        }
        DuckValue::HugeInt(i) => {
            i64::try_from(i).map_or_else(|_| Value::Text(i.to_string()), Value::Integer)
        }
        DuckValue::Float(f) => Value::Real(f64::from(f)),
        DuckValue::Double(f) => Value::Real(f),
        DuckValue::Decimal(d) => Value::Decimal(d),
        DuckValue::Text(s) | DuckValue::Enum(s) => Value::Text(s),
        DuckValue::Blob(b) => Value::Blob(b),
        DuckValue::Timestamp(unit, v) => {
            DateTime::from_timestamp_micros(micros(unit, v))
                .map_or(Value::Null, |ts| Value::Timestamp(ts.naive_utc()))
        }
        DuckValue::Date32(days) => {
            DateTime::from_timestamp(i64::from(days) * 86_400, 0)
                .map_or(Value::Null, |ts| Value::Date(ts.date_naive()))
        }
        DuckValue::Time64(unit, v) => {
            let us = micros(unit, v);
            let secs = u32::try_from(us / 1_000_000).unwrap_or_default();
            let nanos = u32::try_from((us % 1_000_000) * 1_000).unwrap_or_default();
            NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos).map_or(Value::Null, Value::Time)
        }
        DuckValue::List(items) | DuckValue::Array(items) => {
            let json: Vec<serde_json::Value> = items
                .into_iter()
                .map(|item| from_duck_value(item).to_json())
                .collect();
            Value::Text(serde_json::Value::Array(json).to_string())
        }
        other => Value::Text(format!("{other:?}")),
    }
}

impl Connection for DuckDbConnection {
    fn dialect(&self) -> Dialect {
        Dialect::DuckDb
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> DuckcpResult<Dataset> {
        trace!(sql, "duckdb query");
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(params))?;
        let columns: Vec<String> = rows
            .as_ref()
            .map(|stmt| {
                stmt.column_names()
                    .into_iter()
                    .map(|name| name.to_string())
                    .collect()
            })
            .unwrap_or_default();

        let kinds = rows
            .as_ref()
            .map(|stmt| (0..columns.len()).map(|idx| kind_of(&stmt.column_type(idx))).collect())
            .unwrap_or_default();

        let mut data = Vec::new();
        while let Some(row) = rows.next()? {
            let values = (0..columns.len())
                .map(|idx| row.get::<_, DuckValue>(idx).map(from_duck_value))
                .collect::<::duckdb::Result<Vec<_>>>()?;
            data.push(values);
        }

        Ok(Dataset::new(columns, data).with_kinds(kinds))
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> DuckcpResult<usize> {
        trace!(sql, "duckdb execute");
        Ok(self.conn.execute(sql, params_from_iter(params))?)
    }

    fn execute_many(&mut self, sql: &str, rows: &[Vec<Value>]) -> DuckcpResult<usize> {
        trace!(sql, rows = rows.len(), "duckdb execute many");
        let tx = self.conn.transaction()?;
        let mut affected = 0;
        {
            let mut stmt = tx.prepare(sql)?;
            for row in rows {
                affected += stmt.execute(params_from_iter(row))?;
            }
        }
        tx.commit()?;
        Ok(affected)
    }
}

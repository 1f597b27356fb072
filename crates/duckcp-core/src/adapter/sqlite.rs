use rusqlite::{
    params_from_iter,
    types::{ToSqlOutput, Value as SqliteValue, ValueRef},
    ToSql,
};
use tracing::trace;

use super::Connection;
use crate::{
    error::DuckcpResult,
    sql::Dialect,
    value::{Dataset, Value},
};

/// A local SQLite database file, or an in-memory one when no file is configured.
pub struct SqliteConnection {
    conn: rusqlite::Connection,
}

impl SqliteConnection {
    pub fn open(file: Option<&str>) -> DuckcpResult<Self> {
        let conn = match file {
            Some(file) => rusqlite::Connection::open(file)?,
            None => rusqlite::Connection::open_in_memory()?,
        };
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn })
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(SqliteValue::Null),
            Value::Boolean(b) => ToSqlOutput::Owned(SqliteValue::Integer(i64::from(*b))),
            Value::Integer(i) => ToSqlOutput::Owned(SqliteValue::Integer(*i)),
            Value::Real(f) => ToSqlOutput::Owned(SqliteValue::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
            Value::Decimal(_) | Value::Date(_) | Value::Time(_) | Value::Timestamp(_) => {
                ToSqlOutput::Owned(SqliteValue::Text(self.to_string()))
            }
        })
    }
}

fn from_value_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
    }
}

impl Connection for SqliteConnection {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> DuckcpResult<Dataset> {
        trace!(sql, "sqlite query");
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt.query(params_from_iter(params))?;
        let mut data = Vec::new();
        while let Some(row) = rows.next()? {
            let values = (0..columns.len())
                .map(|idx| row.get_ref(idx).map(from_value_ref))
                .collect::<rusqlite::Result<Vec<_>>>()?;
            data.push(values);
        }

        Ok(Dataset::new(columns, data))
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> DuckcpResult<usize> {
        trace!(sql, "sqlite execute");
        Ok(self.conn.execute(sql, params_from_iter(params))?)
    }

    fn execute_many(&mut self, sql: &str, rows: &[Vec<Value>]) -> DuckcpResult<usize> {
        trace!(sql, rows = rows.len(), "sqlite execute many");
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

use std::error::Error;

use ::postgres::{
    types::{to_sql_checked, FromSql, IsNull, Kind, ToSql, Type},
    Client, NoTls,
};
use bytes::BytesMut;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde_json::Value as JsonValue;
use tracing::{debug, trace};
use uuid::Uuid;

use super::Connection;
use crate::{
    error::{DuckcpError, DuckcpResult},
    properties::{get_str, get_string},
    sql::Dialect,
    value::{Dataset, Value, ValueKind, DATE_FORMAT, TIME_FORMAT},
};

/// A PostgreSQL server reached with a blocking client.
pub struct PostgresConnection {
    client: Client,
}

impl PostgresConnection {
    pub fn connect(properties: &JsonValue) -> DuckcpResult<Self> {
        let database = get_str(properties, "database").ok_or_else(|| {
            DuckcpError::Validation("postgres repository missing `--database`".into())
        })?;
        let host = get_str(properties, "host").unwrap_or("localhost");

        let mut config = ::postgres::Config::new();
        config.host(host).dbname(database);
        if let Some(port) = get_string(properties, "port") {
            let port = port.parse::<u16>().map_err(|_| {
                DuckcpError::Validation(format!("invalid postgres port '{port}'"))
            })?;
            config.port(port);
        }
        if let Some(username) = get_str(properties, "username") {
            config.user(username);
        }
        if let Some(password) = get_str(properties, "password") {
            config.password(password);
        }

        debug!(host, database, "connecting to postgres");
        let client = config.connect(NoTls).map_err(|err| {
            DuckcpError::Connection {
                target: format!("postgres://{host}/{database}"),
                reason: err.to_string(),
            }
        })?;
        Ok(Self { client })
    }

    fn params(params: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
        params.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
    }
}

type BoxError = Box<dyn Error + Sync + Send>;

fn parse_timestamp(s: &str) -> Result<NaiveDateTime, BoxError> {
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d"]
        .iter()
        .find_map(|fmt| {
            NaiveDateTime::parse_from_str(s, fmt).ok().or_else(|| {
                NaiveDate::parse_from_str(s, fmt)
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
        })
        .ok_or_else(|| format!("invalid timestamp '{s}'").into())
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Boolean(b) => {
                match *ty {
                    Type::TEXT | Type::VARCHAR | Type::BPCHAR => b.to_string().to_sql(ty, out),
                    _ => b.to_sql(ty, out),
                }
            }
            Value::Integer(i) => {
                match *ty {
                    Type::INT2 => i16::try_from(*i)?.to_sql(ty, out),
                    Type::NUMERIC => Decimal::from(*i).to_sql(ty, out),
                    Type::INT4 => i32::try_from(*i)?.to_sql(ty, out),
                    Type::FLOAT4 => (*i as f32).to_sql(ty, out),
                    Type::FLOAT8 => (*i as f64).to_sql(ty, out),
                    Type::BOOL => (*i != 0).to_sql(ty, out),
                    Type::TEXT | Type::VARCHAR | Type::BPCHAR => i.to_string().to_sql(ty, out),
                    _ => i.to_sql(ty, out),
                }
            }
            Value::Real(f) => {
                match *ty {
                    Type::FLOAT4 => (*f as f32).to_sql(ty, out),
                    Type::NUMERIC => Decimal::try_from(*f)?.to_sql(ty, out),
                    Type::TEXT | Type::VARCHAR | Type::BPCHAR => f.to_string().to_sql(ty, out),
                    _ => f.to_sql(ty, out),
                }
            }
            Value::Text(s) => {
                match *ty {
                    Type::JSON | Type::JSONB => {
                        serde_json::from_str::<JsonValue>(s)?.to_sql(ty, out)
                    }
                    Type::TIMESTAMP => parse_timestamp(s)?.to_sql(ty, out),
                    Type::TIMESTAMPTZ => {
                        let ts = DateTime::parse_from_rfc3339(s)
                            .map(|ts| ts.with_timezone(&Utc))
                            .or_else(|_| parse_timestamp(s).map(|ts| ts.and_utc()))?;
                        ts.to_sql(ty, out)
                    }
                    Type::DATE => NaiveDate::parse_from_str(s, DATE_FORMAT)?.to_sql(ty, out),
                    Type::TIME => NaiveTime::parse_from_str(s, TIME_FORMAT)?.to_sql(ty, out),
                    Type::NUMERIC => s.trim().parse::<Decimal>()?.to_sql(ty, out),
                    Type::UUID => Uuid::parse_str(s.trim())?.to_sql(ty, out),
                    Type::INT2 | Type::INT4 | Type::INT8 => {
                        Value::Integer(s.trim().parse()?).to_sql(ty, out)
                    }
                    Type::FLOAT4 | Type::FLOAT8 => Value::Real(s.trim().parse()?).to_sql(ty, out),
                    Type::BOOL => {
                        matches!(s.trim(), "1" | "t" | "true" | "TRUE" | "True").to_sql(ty, out)
                    }
                    _ => s.as_str().to_sql(ty, out),
                }
            }
            Value::Blob(b) => b.as_slice().to_sql(ty, out),
            Value::Decimal(d) => {
                match *ty {
                    Type::FLOAT4 | Type::FLOAT8 => {
                        let f = d.to_f64().ok_or_else(|| format!("{d} is out of range"))?;
                        Value::Real(f).to_sql(ty, out)
                    }
                    Type::INT2 | Type::INT4 | Type::INT8 => {
                        let i = d.to_i64().ok_or_else(|| format!("{d} is out of range"))?;
                        Value::Integer(i).to_sql(ty, out)
                    }
                    Type::TEXT | Type::VARCHAR | Type::BPCHAR => d.to_string().to_sql(ty, out),
                    _ => d.to_sql_checked(ty, out),
                }
            }
            Value::Date(d) => {
                match *ty {
                    Type::TIMESTAMP => d.and_time(NaiveTime::MIN).to_sql(ty, out),
                    Type::TIMESTAMPTZ => d.and_time(NaiveTime::MIN).and_utc().to_sql(ty, out),
                    Type::TEXT | Type::VARCHAR | Type::BPCHAR => self.to_string().to_sql(ty, out),
                    _ => d.to_sql_checked(ty, out),
                }
            }
            Value::Time(t) => {
                match *ty {
                    Type::TEXT | Type::VARCHAR | Type::BPCHAR => self.to_string().to_sql(ty, out),
                    _ => t.to_sql_checked(ty, out),
                }
            }
            Value::Timestamp(ts) => {
                match *ty {
                    Type::TIMESTAMPTZ => ts.and_utc().to_sql(ty, out),
                    Type::DATE => ts.date().to_sql(ty, out),
                    Type::TEXT | Type::VARCHAR | Type::BPCHAR => self.to_string().to_sql(ty, out),
                    _ => ts.to_sql_checked(ty, out),
                }
            }
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

/// A column value decoded by its Postgres type.
struct Column(Value);

impl<'a> FromSql<'a> for Column {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        decode(ty, raw).map(Column)
    }

    fn from_sql_null(_ty: &Type) -> Result<Self, BoxError> {
        Ok(Column(Value::Null))
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

fn decode(ty: &Type, raw: &[u8]) -> Result<Value, BoxError> {
    Ok(match *ty {
        Type::BOOL => Value::Boolean(bool::from_sql(ty, raw)?),
        Type::CHAR => Value::Integer(i64::from(i8::from_sql(ty, raw)?)),
        Type::INT2 => Value::Integer(i64::from(i16::from_sql(ty, raw)?)),
        Type::INT4 => Value::Integer(i64::from(i32::from_sql(ty, raw)?)),
        Type::OID => Value::Integer(i64::from(u32::from_sql(ty, raw)?)),
        Type::INT8 => Value::Integer(i64::from_sql(ty, raw)?),
        Type::FLOAT4 => Value::Real(f64::from(f32::from_sql(ty, raw)?)),
        Type::FLOAT8 => Value::Real(f64::from_sql(ty, raw)?),
        Type::NUMERIC => Value::Decimal(Decimal::from_sql(ty, raw)?),
        Type::BYTEA => Value::Blob(raw.to_vec()),
        Type::JSON | Type::JSONB => Value::Text(JsonValue::from_sql(ty, raw)?.to_string()),
        Type::UUID => Value::Text(Uuid::from_sql(ty, raw)?.to_string()),
        Type::DATE => Value::Date(NaiveDate::from_sql(ty, raw)?),
        Type::TIME => Value::Time(NaiveTime::from_sql(ty, raw)?),
        Type::TIMETZ => Value::Text(decode_timetz(raw)?),
        Type::TIMESTAMP => Value::Timestamp(NaiveDateTime::from_sql(ty, raw)?),
        Type::TIMESTAMPTZ => Value::Text(DateTime::<FixedOffset>::from_sql(ty, raw)?.to_rfc3339()),
        Type::INTERVAL => Value::Text(decode_interval(raw)?),
        _ if <String as FromSql>::accepts(ty) || matches!(ty.kind(), Kind::Enum(_)) => {
            Value::Text(String::from_utf8(raw.to_vec())?)
        }
        _ => return Err(format!("unsupported postgres column type `{ty}`").into()),
    })
}

fn split_be<const N: usize>(raw: &[u8], at: usize) -> Result<[u8; N], BoxError> {
    raw.get(at..at + N)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or_else(|| "truncated column value".into())
}

fn format_micros(micros: i64) -> String {
    let (sign, micros) = if micros < 0 { ("-", -micros) } else { ("", micros) };
    let (secs, frac) = (micros / 1_000_000, micros % 1_000_000);
    let clock = format!("{sign}{:02}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60);
    if frac == 0 {
        clock
    } else {
        format!("{clock}.{}", format!("{frac:06}").trim_end_matches('0'))
    }
}

/// Renders an interval the way Postgres prints it, e.g. `1 year 2 mons 3 days 04:05:06`.
fn decode_interval(raw: &[u8]) -> Result<String, BoxError> {
    let micros = i64::from_be_bytes(split_be(raw, 0)?);
    let days = i32::from_be_bytes(split_be(raw, 8)?);
    let months = i32::from_be_bytes(split_be(raw, 12)?);

    let plural = |n: i32, unit: &str| {
        if n.abs() == 1 {
            format!("{n} {unit}")
        } else {
            format!("{n} {unit}s")
        }
    };
    let mut parts = Vec::new();
    if months / 12 != 0 {
        parts.push(plural(months / 12, "year"));
    }
    if months % 12 != 0 {
        parts.push(plural(months % 12, "mon"));
    }
    if days != 0 {
        parts.push(plural(days, "day"));
    }
    if micros != 0 || parts.is_empty() {
        parts.push(format_micros(micros));
    }
    Ok(parts.join(" "))
}

/// Time of day with its UTC offset, e.g. `12:30:00+02:00`.
fn decode_timetz(raw: &[u8]) -> Result<String, BoxError> {
    let micros = i64::from_be_bytes(split_be(raw, 0)?);
    // stored as seconds west of UTC
    let west = i32::from_be_bytes(split_be(raw, 8)?);
    let offset = FixedOffset::west_opt(west).ok_or("invalid time zone offset")?;
    Ok(format!("{}{offset}", format_micros(micros)))
}

fn kind_of(ty: &Type) -> Option<ValueKind> {
    Some(match *ty {
        Type::BOOL => ValueKind::Boolean,
        Type::CHAR | Type::INT2 | Type::INT4 | Type::INT8 | Type::OID => ValueKind::Integer,
        Type::FLOAT4 | Type::FLOAT8 => ValueKind::Real,
        Type::NUMERIC => ValueKind::Decimal(0),
        Type::BYTEA => ValueKind::Blob,
        Type::DATE => ValueKind::Date,
        Type::TIME => ValueKind::Time,
        Type::TIMESTAMP => ValueKind::Timestamp,
        _ => ValueKind::Text,
    })
}

impl Connection for PostgresConnection {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> DuckcpResult<Dataset> {
        trace!(sql, "postgres query");
        let stmt = self.client.prepare(sql)?;
        let columns: Vec<String> = stmt
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        let kinds = stmt.columns().iter().map(|c| kind_of(c.type_())).collect();

        let rows = self.client.query(&stmt, &Self::params(params))?;
        let data = rows
            .iter()
            .map(|row| {
                (0..columns.len())
                    .map(|idx| row.try_get::<_, Column>(idx).map(|column| column.0))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Dataset::new(columns, data).with_kinds(kinds))
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> DuckcpResult<usize> {
        trace!(sql, "postgres execute");
        let affected = self.client.execute(sql, &Self::params(params))?;
        Ok(usize::try_from(affected).unwrap_or(usize::MAX))
    }

    fn execute_many(&mut self, sql: &str, rows: &[Vec<Value>]) -> DuckcpResult<usize> {
        trace!(sql, rows = rows.len(), "postgres execute many");
        let mut tx = self.client.transaction()?;
        let stmt = tx.prepare(sql)?;
        let mut affected = 0u64;
        for row in rows {
            affected += tx.execute(&stmt, &Self::params(row))?;
        }
        tx.commit()?;
        Ok(usize::try_from(affected).unwrap_or(usize::MAX))
    }
}

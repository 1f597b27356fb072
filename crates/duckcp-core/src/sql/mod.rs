//! Structural SQL for the statements duckcp issues against targets.
//!
//! Statements are built as values and rendered per [`Dialect`]; callers never
//! splice identifiers into SQL text themselves.

mod tables;

use serde_json::{Map, Value as JsonValue};

pub use tables::referenced_tables;

use crate::error::{DuckcpError, DuckcpResult};

/// Placeholder and quoting rules of a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    DuckDb,
    Postgres,
}

impl Dialect {
    /// Bind placeholder for the 1-based parameter `index`.
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${index}"),
            Dialect::Sqlite | Dialect::DuckDb => "?".to_string(),
        }
    }

    fn supports_catalog(&self) -> bool {
        !matches!(self, Dialect::Sqlite)
    }
}

/// Quotes an identifier with double quotes, doubling embedded quotes.
pub fn quote_identifier(name: &str) -> DuckcpResult<String> {
    if name.is_empty() {
        return Err(DuckcpError::Validation("identifier cannot be empty".into()));
    }
    if name.contains('\0') {
        return Err(DuckcpError::Validation(format!(
            "identifier {name:?} contains a NUL character"
        )));
    }
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

/// Quotes a string literal with single quotes, doubling embedded quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// A possibly qualified table name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub catalog: Option<String>,
    pub schema: Option<String>,
    pub name: String,
}

impl TableRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            catalog: None,
            schema: None,
            name: name.into(),
        }
    }

    pub fn with_schema(mut self, schema: Option<impl Into<String>>) -> Self {
        self.schema = schema.map(Into::into);
        self
    }

    pub fn with_catalog(mut self, catalog: Option<impl Into<String>>) -> Self {
        self.catalog = catalog.map(Into::into);
        self
    }

    /// The in-memory relation registered under `name` in a DuckDB session.
    pub fn temporary(name: impl Into<String>) -> Self {
        Self::new(name)
            .with_catalog(Some("temp"))
            .with_schema(Some("main"))
    }

    pub fn render(&self, dialect: Dialect) -> DuckcpResult<String> {
        let mut parts = Vec::with_capacity(3);
        if dialect.supports_catalog() {
            if let Some(catalog) = &self.catalog {
                parts.push(quote_identifier(catalog)?);
            }
        }
        if let Some(schema) = &self.schema {
            parts.push(quote_identifier(schema)?);
        }
        parts.push(quote_identifier(&self.name)?);
        Ok(parts.join("."))
    }
}

/// Value of a `COPY ... TO` option.
#[derive(Debug, Clone, PartialEq)]
pub enum CopyOption {
    Text(String),
    Boolean(bool),
    Number(String),
    Columns(Vec<String>),
}

impl CopyOption {
    /// Maps a stored storage property to an option. Nulls and empty values yield `None`.
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::Null => None,
            JsonValue::Bool(b) => Some(CopyOption::Boolean(*b)),
            JsonValue::Number(n) => Some(CopyOption::Number(n.to_string())),
            JsonValue::String(s) if s.is_empty() => None,
            JsonValue::String(s) => Some(CopyOption::Text(s.clone())),
            JsonValue::Array(items) if items.is_empty() => None,
            JsonValue::Array(items) => Some(CopyOption::Columns(
                items
                    .iter()
                    .map(|item| {
                        match item {
                            JsonValue::String(s) => s.clone(),
                            other => other.to_string(),
                        }
                    })
                    .collect(),
            )),
            JsonValue::Object(_) => Some(CopyOption::Text(value.to_string())),
        }
    }

    fn render(&self) -> DuckcpResult<String> {
        Ok(match self {
            CopyOption::Text(s) => quote_literal(s),
            CopyOption::Boolean(b) => b.to_string(),
            CopyOption::Number(n) => n.clone(),
            CopyOption::Columns(columns) => {
                let quoted = columns
                    .iter()
                    .map(|c| quote_identifier(c))
                    .collect::<DuckcpResult<Vec<_>>>()?;
                format!("({})", quoted.join(", "))
            }
        })
    }
}

/// Builds `COPY` options from the storage properties named in `keys`, ordered by name.
pub fn copy_options(
    properties: &Map<String, JsonValue>,
    keys: &[&str],
) -> Vec<(String, CopyOption)> {
    let mut options: Vec<(String, CopyOption)> = properties
        .iter()
        .filter(|(key, _)| keys.contains(&key.as_str()))
        .filter_map(|(key, value)| {
            CopyOption::from_json(value).map(|opt| (key.to_uppercase(), opt))
        })
        .collect();
    options.sort_by(|a, b| a.0.cmp(&b.0));
    options
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    DeleteAll {
        table: TableRef,
    },
    /// Single-row parameterized insert, executed once per row.
    InsertInto {
        table: TableRef,
        columns: Vec<String>,
    },
    CreateOrReplaceTableAs {
        table: TableRef,
        source: TableRef,
    },
    CopyTo {
        source: TableRef,
        path: String,
        options: Vec<(String, CopyOption)>,
    },
}

impl Statement {
    pub fn render(&self, dialect: Dialect) -> DuckcpResult<String> {
        match self {
            Statement::DeleteAll { table } => Ok(format!("DELETE FROM {}", table.render(dialect)?)),
            Statement::InsertInto { table, columns } => {
                let names = columns
                    .iter()
                    .map(|c| quote_identifier(c))
                    .collect::<DuckcpResult<Vec<_>>>()?;
                let placeholders = (1..=columns.len())
                    .map(|i| dialect.placeholder(i))
                    .collect::<Vec<_>>();
                Ok(format!(
                    "INSERT INTO {} ({}) VALUES ({})",
                    table.render(dialect)?,
                    names.join(", "),
                    placeholders.join(", ")
                ))
            }
            Statement::CreateOrReplaceTableAs { table, source } => {
                Ok(format!(
                    "CREATE OR REPLACE TABLE {} AS SELECT * FROM {}",
                    table.render(dialect)?,
                    source.render(dialect)?
                ))
            }
            Statement::CopyTo {
                source,
                path,
                options,
            } => {
                let mut sql = format!("COPY {} TO {}", source.render(dialect)?, quote_literal(path));
                if !options.is_empty() {
                    let rendered = options
                        .iter()
                        .map(|(key, value)| Ok(format!("{key} {}", value.render()?)))
                        .collect::<DuckcpResult<Vec<_>>>()?;
                    sql.push_str(&format!(" ({})", rendered.join(", ")));
                }
                Ok(sql)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("t").unwrap(), "\"t\"");
        assert_eq!(quote_identifier("a\"b").unwrap(), "\"a\"\"b\"");
        assert!(matches!(
            quote_identifier("a\0b"),
            Err(DuckcpError::Validation(_))
        ));
        assert_eq!(quote_literal("it's"), "'it''s'");
    }

    #[test]
    fn test_table_ref_sqlite_ignores_catalog() {
        let table = TableRef::new("t")
            .with_catalog(Some("c"))
            .with_schema(Some("s"));
        assert_eq!(table.render(Dialect::Sqlite).unwrap(), "\"s\".\"t\"");
        assert_eq!(table.render(Dialect::DuckDb).unwrap(), "\"c\".\"s\".\"t\"");
    }

    #[test]
    fn test_insert_placeholders() {
        let stmt = Statement::InsertInto {
            table: TableRef::new("t2"),
            columns: vec!["id".into(), "name".into()],
        };
        assert_eq!(
            stmt.render(Dialect::Postgres).unwrap(),
            "INSERT INTO \"t2\" (\"id\", \"name\") VALUES ($1, $2)"
        );
        assert_eq!(
            stmt.render(Dialect::Sqlite).unwrap(),
            "INSERT INTO \"t2\" (\"id\", \"name\") VALUES (?, ?)"
        );
    }

    #[test]
    fn test_create_or_replace() {
        let stmt = Statement::CreateOrReplaceTableAs {
            table: TableRef::new("users").with_schema(Some("main")),
            source: TableRef::temporary("dst"),
        };
        assert_eq!(
            stmt.render(Dialect::DuckDb).unwrap(),
            "CREATE OR REPLACE TABLE \"main\".\"users\" AS SELECT * FROM \"temp\".\"main\".\"dst\""
        );
    }

    #[test]
    fn test_copy_to_options() {
        let props = json!({
            "file": "out.parquet",
            "format": "parquet",
            "header": false,
            "row_group_size": 1000,
            "partition_by": ["year", "month"],
            "quote_char": ""
        });
        let options = copy_options(
            props.as_object().unwrap(),
            &["format", "header", "row_group_size", "partition_by", "quote_char"],
        );
        let stmt = Statement::CopyTo {
            source: TableRef::temporary("dst"),
            path: "/data/out.parquet".into(),
            options,
        };
        assert_eq!(
            stmt.render(Dialect::DuckDb).unwrap(),
            "COPY \"temp\".\"main\".\"dst\" TO '/data/out.parquet' (FORMAT 'parquet', HEADER false, \
             PARTITION_BY (\"year\", \"month\"), ROW_GROUP_SIZE 1000)"
        );
    }
}

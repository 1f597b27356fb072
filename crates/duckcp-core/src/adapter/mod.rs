//! Connections to the repository kinds.
//!
//! Every kind is reached through the [`Connection`] trait. A connection is owned by the single
//! operation using it and closed when dropped.

mod bitable;
mod duckdb;
mod postgres;
mod sqlite;

use duckcp_db::models::Repository;
use tracing::debug;

pub use self::{
    bitable::BitableConnection, duckdb::DuckDbConnection, postgres::PostgresConnection,
    sqlite::SqliteConnection,
};
use crate::{
    context::DuckcpContext,
    error::{DuckcpError, DuckcpResult},
    kind::RepositoryKind,
    properties::get_str,
    sql::Dialect,
    value::{Dataset, Value},
};

pub trait Connection {
    fn dialect(&self) -> Dialect;

    /// Executes `sql` and fetches every row with its column names.
    fn query(&mut self, sql: &str, params: &[Value]) -> DuckcpResult<Dataset>;

    /// Executes `sql` and returns the number of affected rows.
    fn execute(&mut self, sql: &str, params: &[Value]) -> DuckcpResult<usize>;

    /// Executes `sql` once per parameter row.
    fn execute_many(&mut self, sql: &str, rows: &[Vec<Value>]) -> DuckcpResult<usize>;
}

/// A script bound to the connection it runs on.
///
/// Executing consumes the statement, so the source connection is closed as soon as the result
/// is materialized and before any target is opened.
pub struct Statement {
    connection: Box<dyn Connection>,
    sql: String,
}

impl Statement {
    pub fn new(connection: Box<dyn Connection>, sql: impl Into<String>) -> Self {
        Self {
            connection,
            sql: sql.into(),
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn execute(mut self) -> DuckcpResult<Dataset> {
        self.connection.query(&self.sql, &[])
    }
}

/// Opens a connection to `repository`.
///
/// Bitable connections read the repository's storages from the catalog to map table names to
/// remote tables; no other kind touches the catalog.
pub fn connect(ctx: &DuckcpContext, repository: &Repository) -> DuckcpResult<Box<dyn Connection>> {
    let kind: RepositoryKind = repository.kind.parse()?;
    let properties = &repository.properties;
    debug!(repository = %repository.code, kind = %kind, "connecting");

    Ok(match kind {
        RepositoryKind::Sqlite => Box::new(SqliteConnection::open(get_str(properties, "file"))?),
        RepositoryKind::DuckDb => Box::new(DuckDbConnection::open(get_str(properties, "file"))?),
        RepositoryKind::File => {
            let folder = get_str(properties, "folder").ok_or_else(|| {
                DuckcpError::Validation(format!(
                    "file repository {} missing `--folder`",
                    repository.code
                ))
            })?;
            Box::new(DuckDbConnection::in_folder(folder)?)
        }
        RepositoryKind::Postgres => Box::new(PostgresConnection::connect(properties)?),
        RepositoryKind::Bitable => Box::new(BitableConnection::open(ctx, repository)?),
        RepositoryKind::Odps => {
            return Err(DuckcpError::Connection {
                target: format!("odps repository {}", repository.code),
                reason: "no MaxCompute driver is available".into(),
            });
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_runs_on_connection() {
        let conn = SqliteConnection::open(None).unwrap();
        let statement = Statement::new(Box::new(conn), "select 1 as one, 'a' as name");
        assert_eq!(statement.sql(), "select 1 as one, 'a' as name");

        let dataset = statement.execute().unwrap();
        assert_eq!(dataset.columns, vec!["one", "name"]);
        assert_eq!(dataset.rows, vec![vec![Value::Integer(1), Value::from("a")]]);
    }
}

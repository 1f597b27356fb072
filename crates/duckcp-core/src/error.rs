//! Error types for duckcp-core.

use duckcp_config::error::ConfigError;
use duckcp_db::DbError;
use duckcp_remote::RemoteError;
use duckcp_utils::error::{FileSystemError, PathError};
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum DuckcpError {
    #[error("{0}")]
    #[diagnostic(code(duckcp::validation))]
    Validation(String),

    #[error("{0}")]
    #[diagnostic(code(duckcp::not_found))]
    NotFound(String),

    #[error("Failed to connect to {target}: {reason}")]
    #[diagnostic(
        code(duckcp::connection),
        help("Check the repository properties with 'duckcp repository list'")
    )]
    Connection { target: String, reason: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Remote(#[from] RemoteError),

    #[error("Transformer '{transformer}' of task '{task}' failed")]
    #[diagnostic(
        code(duckcp::task_step),
        help("The remaining transformers of the task were not run")
    )]
    TaskStepFailed {
        task: String,
        transformer: String,
        #[source]
        source: Box<DuckcpError>,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Database(#[from] DbError),

    #[error(transparent)]
    #[diagnostic(code(duckcp::path))]
    Path(#[from] PathError),

    #[error(transparent)]
    #[diagnostic(code(duckcp::fs), help("Check file permissions and disk space"))]
    FileSystem(#[from] FileSystemError),

    #[error("Error while {action}")]
    #[diagnostic(code(duckcp::io), help("Check file permissions and disk space"))]
    IoError {
        action: String,
        #[source]
        source: std::io::Error,
    },

    #[error("SQL parse error: {0}")]
    #[diagnostic(code(duckcp::sql_parse), help("Check the script syntax"))]
    SqlParse(#[from] sqlparser::parser::ParserError),

    #[error("SQLite error: {0}")]
    #[diagnostic(code(duckcp::sqlite))]
    Sqlite(#[from] rusqlite::Error),

    #[error("DuckDB error: {0}")]
    #[diagnostic(code(duckcp::duckdb))]
    DuckDb(#[from] duckdb::Error),

    #[error("PostgreSQL error: {0}")]
    #[diagnostic(code(duckcp::postgres))]
    Postgres(#[from] postgres::Error),

    #[error(transparent)]
    #[diagnostic(code(duckcp::json))]
    Json(#[from] serde_json::Error),
}

impl From<diesel::result::Error> for DuckcpError {
    fn from(err: diesel::result::Error) -> Self {
        Self::Database(DbError::from(err))
    }
}

/// Trait for adding context to IO errors.
pub trait ErrorContext<T> {
    fn with_context<C>(self, context: C) -> Result<T, DuckcpError>
    where
        C: FnOnce() -> String;
}

impl<T> ErrorContext<T> for std::io::Result<T> {
    fn with_context<C>(self, context: C) -> Result<T, DuckcpError>
    where
        C: FnOnce() -> String,
    {
        self.map_err(|err| {
            DuckcpError::IoError {
                action: context(),
                source: err,
            }
        })
    }
}

pub type DuckcpResult<T> = std::result::Result<T, DuckcpError>;

//! Error types for the catalog store.

use duckcp_utils::error::FileSystemError;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum DbError {
    #[error("Catalog connection failed: {0}")]
    #[diagnostic(
        code(duckcp_db::connection),
        help("Check if the catalog file exists and is accessible")
    )]
    ConnectionError(String),

    #[error("Catalog does not exist: {0}")]
    #[diagnostic(
        code(duckcp_db::missing),
        help("Run 'duckcp meta create' to initialize the catalog")
    )]
    Missing(String),

    #[error("Catalog query failed: {0}")]
    #[diagnostic(code(duckcp_db::query))]
    QueryError(String),

    #[error("Catalog constraint violated: {0}")]
    #[diagnostic(
        code(duckcp_db::constraint),
        help("A record with the same code may already exist")
    )]
    ConstraintError(String),

    #[error("Catalog migration failed: {0}")]
    #[diagnostic(
        code(duckcp_db::migration),
        help("The catalog schema may be corrupted. Recreate it with 'duckcp meta create --force'")
    )]
    MigrationError(String),

    #[error("Record not found: {0}")]
    #[diagnostic(code(duckcp_db::not_found))]
    NotFound(String),

    #[error(transparent)]
    #[diagnostic(code(duckcp_db::fs))]
    FileSystem(#[from] FileSystemError),
}

impl From<diesel::result::Error> for DbError {
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};

        match err {
            Error::NotFound => DbError::NotFound("Record not found".to_string()),
            Error::DatabaseError(
                DatabaseErrorKind::UniqueViolation | DatabaseErrorKind::ForeignKeyViolation,
                info,
            ) => DbError::ConstraintError(info.message().to_string()),
            Error::DatabaseError(_, info) => DbError::QueryError(info.message().to_string()),
            other => DbError::QueryError(other.to_string()),
        }
    }
}

impl From<diesel::result::ConnectionError> for DbError {
    fn from(err: diesel::result::ConnectionError) -> Self {
        DbError::ConnectionError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DbError>;

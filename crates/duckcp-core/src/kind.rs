//! The closed set of repository kinds and their property requirements.

use std::{fmt, str::FromStr};

use serde_json::{Map, Value as JsonValue};

use crate::{
    error::{DuckcpError, DuckcpResult},
    properties::is_present,
};

/// How data reaches a target storage of a given kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// `DELETE` then batched `INSERT`.
    RelationalOverwrite,
    /// Register the result and `CREATE OR REPLACE TABLE ... AS SELECT`.
    ColumnarSnapshot,
    /// Register the result and `COPY ... TO` a file.
    FileExport,
    /// Replace remote records only when the content digest changed.
    DiffSync,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryKind {
    Postgres,
    Odps,
    Bitable,
    DuckDb,
    Sqlite,
    File,
}

/// Storage properties of the `file` kind that are passed through to `COPY`.
pub const COPY_OPTIONS: &[&str] = &[
    "format",
    "compression",
    "compression_level",
    "parquet_version",
    "field_ids",
    "row_group_size",
    "row_group_size_bytes",
    "row_groups_per_file",
    "header",
    "delimiter",
    "quote",
    "escape",
    "nullstr",
    "force_quote",
    "prefix",
    "suffix",
    "dateformat",
    "timestampformat",
    "array",
    "per_thread_output",
    "file_size_bytes",
    "partition_by",
    "filename_pattern",
    "file_extension",
    "write_partition_columns",
    "use_tmp_file",
    "overwrite",
    "overwrite_or_ignore",
    "append",
    "preserve_order",
];

impl RepositoryKind {
    pub const ALL: [RepositoryKind; 6] = [
        RepositoryKind::Postgres,
        RepositoryKind::Odps,
        RepositoryKind::Bitable,
        RepositoryKind::DuckDb,
        RepositoryKind::Sqlite,
        RepositoryKind::File,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            RepositoryKind::Postgres => "postgres",
            RepositoryKind::Odps => "odps",
            RepositoryKind::Bitable => "bitable",
            RepositoryKind::DuckDb => "duckdb",
            RepositoryKind::Sqlite => "sqlite",
            RepositoryKind::File => "file",
        }
    }

    pub fn codes() -> Vec<&'static str> {
        Self::ALL.iter().map(|kind| kind.code()).collect()
    }

    pub fn connection_required(&self) -> &'static [&'static str] {
        match self {
            RepositoryKind::Postgres => &["database"],
            RepositoryKind::Odps => &["end_point", "project", "access_key", "access_secret"],
            RepositoryKind::Bitable => &["access_key", "access_secret"],
            RepositoryKind::DuckDb | RepositoryKind::Sqlite => &["file"],
            RepositoryKind::File => &["folder"],
        }
    }

    pub fn connection_optional(&self) -> &'static [&'static str] {
        match self {
            RepositoryKind::Postgres => &["host", "port", "username", "password"],
            _ => &[],
        }
    }

    pub fn medium_required(&self) -> &'static [&'static str] {
        match self {
            RepositoryKind::Bitable => &["document", "table"],
            RepositoryKind::File => &["file"],
            _ => &["table"],
        }
    }

    pub fn medium_optional(&self) -> &'static [&'static str] {
        match self {
            RepositoryKind::Postgres | RepositoryKind::Odps | RepositoryKind::DuckDb => {
                &["catalog", "schema"]
            }
            RepositoryKind::Sqlite => &["schema"],
            RepositoryKind::File => COPY_OPTIONS,
            RepositoryKind::Bitable => &[],
        }
    }

    pub fn strategy(&self) -> Strategy {
        match self {
            RepositoryKind::Postgres | RepositoryKind::Odps | RepositoryKind::Sqlite => {
                Strategy::RelationalOverwrite
            }
            RepositoryKind::DuckDb => Strategy::ColumnarSnapshot,
            RepositoryKind::File => Strategy::FileExport,
            RepositoryKind::Bitable => Strategy::DiffSync,
        }
    }

    /// Checks the connection properties of a repository of this kind.
    pub fn ensure_connection_properties(&self, properties: &Map<String, JsonValue>) -> DuckcpResult<()> {
        self.ensure_present(self.connection_required(), properties, "repository")
    }

    /// Checks the medium properties of a storage under a repository of this kind.
    pub fn ensure_medium_properties(&self, properties: &Map<String, JsonValue>) -> DuckcpResult<()> {
        self.ensure_present(self.medium_required(), properties, "storage")
    }

    fn ensure_present(
        &self,
        required: &[&str],
        properties: &Map<String, JsonValue>,
        subject: &str,
    ) -> DuckcpResult<()> {
        match required
            .iter()
            .find(|key| !properties.get(**key).is_some_and(is_present))
        {
            Some(key) => {
                Err(DuckcpError::Validation(format!(
                    "{} {subject} missing `--{}`",
                    self.code(),
                    key.replace('_', "-")
                )))
            }
            None => Ok(()),
        }
    }
}

impl fmt::Display for RepositoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for RepositoryKind {
    type Err = DuckcpError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.code() == code)
            .ok_or_else(|| {
                DuckcpError::Validation(format!(
                    "unsupported repository kind '{code}' (expected one of: {})",
                    Self::codes().join(", ")
                ))
            })
    }
}

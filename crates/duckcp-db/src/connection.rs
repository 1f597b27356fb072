//! Catalog connection management.
//!
//! Every catalog operation opens its own short-lived [`CatalogConnection`], which is closed when
//! dropped.

use std::path::{Path, PathBuf};

use diesel::{sql_query, Connection, RunQueryDsl, SqliteConnection};
use duckcp_utils::fs::{ensure_parent_dir, remove_file_if_exists, set_private_permissions};
use tracing::{debug, info, warn};

use crate::{
    error::{DbError, Result},
    migration::apply_migrations,
};

/// An open connection to the catalog database.
pub struct CatalogConnection {
    conn: SqliteConnection,
}

impl CatalogConnection {
    fn establish(path: &Path) -> Result<Self> {
        let mut conn = SqliteConnection::establish(&path.to_string_lossy())?;
        sql_query("PRAGMA foreign_keys = ON;").execute(&mut conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.conn
    }
}

impl std::ops::Deref for CatalogConnection {
    type Target = SqliteConnection;

    fn deref(&self) -> &Self::Target {
        &self.conn
    }
}

impl std::ops::DerefMut for CatalogConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.conn
    }
}

/// Location of the catalog file.
///
/// The store itself holds no open handle; it only knows where the catalog lives, so it can be
/// pointed at a temporary file in tests.
#[derive(Clone, Debug)]
pub struct CatalogStore {
    path: PathBuf,
}

impl CatalogStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Opens a connection to an existing catalog.
    ///
    /// # Errors
    ///
    /// [`DbError::Missing`] if the catalog was never created.
    pub fn connect(&self) -> Result<CatalogConnection> {
        if !self.exists() {
            return Err(DbError::Missing(self.path.display().to_string()));
        }
        let mut connection = CatalogConnection::establish(&self.path)?;
        apply_migrations(&mut connection)?;
        Ok(connection)
    }

    /// Runs `f` on a fresh connection that is closed afterwards.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> diesel::QueryResult<T>,
    {
        let mut connection = self.connect()?;
        Ok(f(connection.conn())?)
    }

    /// Runs `f` inside a transaction on a fresh connection.
    pub fn transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> diesel::QueryResult<T>,
    {
        let mut connection = self.connect()?;
        Ok(connection.conn().transaction(f)?)
    }

    /// Creates the catalog file and its schema.
    ///
    /// Returns `false` without touching anything when the file exists and `force` is unset.
    /// With `force`, an existing catalog is removed first.
    pub fn create(&self, force: bool) -> Result<bool> {
        if self.path.exists() {
            if !force {
                warn!("catalog {} already exists", self.path.display());
                return Ok(false);
            }
            remove_file_if_exists(&self.path)?;
            debug!(path = %self.path.display(), "removed existing catalog");
        }

        ensure_parent_dir(&self.path)?;
        let mut connection = CatalogConnection::establish(&self.path)?;
        apply_migrations(&mut connection)?;
        drop(connection);
        set_private_permissions(&self.path)?;

        info!("created catalog {}", self.path.display());
        Ok(true)
    }

    /// Removes the catalog file. Returns `false` if there was nothing to remove.
    pub fn delete(&self) -> Result<bool> {
        let removed = remove_file_if_exists(&self.path)?;
        if removed {
            info!("deleted catalog {}", self.path.display());
        } else {
            warn!("catalog {} does not exist", self.path.display());
        }
        Ok(removed)
    }
}

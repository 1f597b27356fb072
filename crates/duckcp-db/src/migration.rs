use diesel::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::debug;

use crate::error::{DbError, Result};

pub const CATALOG_MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Applies every pending catalog migration. Already applied versions are skipped.
pub fn apply_migrations(conn: &mut SqliteConnection) -> Result<()> {
    let applied = conn
        .run_pending_migrations(CATALOG_MIGRATIONS)
        .map_err(|err| DbError::MigrationError(err.to_string()))?;
    for version in applied {
        debug!(%version, "applied catalog migration");
    }
    Ok(())
}

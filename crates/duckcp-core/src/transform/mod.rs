//! Transform strategies, dispatched on the target repository's kind.

mod diff_sync;
mod export;
mod overwrite;
mod snapshot;

use duckcp_db::models::{Repository, Storage};
use tracing::debug;

pub use self::diff_sync::digest;
use crate::{
    adapter::Statement,
    context::DuckcpContext,
    error::{DuckcpError, DuckcpResult},
    kind::{RepositoryKind, Strategy},
    properties::get_str,
    sql::TableRef,
};

/// Moves the result of `statement` into `storage` of the `target` repository.
pub fn transform(
    ctx: &DuckcpContext,
    statement: Statement,
    target: &Repository,
    storage: &Storage,
) -> DuckcpResult<()> {
    let kind: RepositoryKind = target.kind.parse()?;
    let strategy = kind.strategy();
    debug!(target = %target.code, storage = %storage.code, ?strategy, "transforming");

    match strategy {
        Strategy::RelationalOverwrite => overwrite::overwrite(ctx, statement, target, storage),
        Strategy::ColumnarSnapshot => snapshot::snapshot(statement, target, storage),
        Strategy::FileExport => export::export(statement, target, storage),
        Strategy::DiffSync => diff_sync::diff_sync(ctx, statement, target, storage),
    }
}

/// Reads a property every storage of the kind must carry.
fn required<'a>(storage: &'a Storage, key: &str) -> DuckcpResult<&'a str> {
    get_str(&storage.properties, key).ok_or_else(|| {
        DuckcpError::Validation(format!(
            "storage {} missing `--{}`",
            storage.code,
            key.replace('_', "-")
        ))
    })
}

/// `[catalog.][schema.]table` of a relational storage.
fn target_table(storage: &Storage) -> DuckcpResult<TableRef> {
    let table = required(storage, "table")?;
    Ok(TableRef::new(table)
        .with_schema(get_str(&storage.properties, "schema"))
        .with_catalog(get_str(&storage.properties, "catalog")))
}

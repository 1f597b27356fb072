use duckcp_db::models::{Repository, Storage};
use tracing::{debug, info};

use super::target_table;
use crate::{
    adapter::{Connection, DuckDbConnection, Statement},
    error::DuckcpResult,
    properties::get_str,
    sql::{self, Dialect, TableRef},
};

/// Rebuilds a DuckDB table from the result in a single `CREATE OR REPLACE TABLE ... AS SELECT`.
pub(super) fn snapshot(
    statement: Statement,
    repository: &Repository,
    storage: &Storage,
) -> DuckcpResult<()> {
    let table = target_table(storage)?;
    let dataset = statement.execute()?;

    let mut conn = DuckDbConnection::open(get_str(&repository.properties, "file"))?;
    conn.register(&storage.code, &dataset)?;

    let replace = sql::Statement::CreateOrReplaceTableAs {
        table,
        source: TableRef::temporary(&storage.code),
    }
    .render(Dialect::DuckDb)?;
    debug!(sql = %replace, "replacing table");
    conn.execute(&replace, &[])?;

    info!("replaced storage {} with {} rows", storage.code, dataset.len());
    Ok(())
}

use duckcp_db::{
    models::{Repository, Storage},
    repository::Snapshots,
};
use duckcp_remote::feishu::{CREATE_BATCH_SIZE, DELETE_BATCH_SIZE};
use duckcp_utils::hash::digest_text;
use tracing::{debug, info};

use super::required;
use crate::{
    adapter::Statement,
    context::DuckcpContext,
    error::{DuckcpError, DuckcpResult},
    properties::get_str,
    value::Dataset,
};

/// Checksum of a snapshot whose records are not known to match any result.
const UNSYNCED: &str = "";

/// Content digest of a result: one `name:value` line per field, fields sorted by name,
/// records in result order.
pub fn digest(dataset: &Dataset) -> String {
    let mut lines = Vec::new();
    for row in &dataset.rows {
        let mut fields: Vec<_> = dataset.columns.iter().zip(row).collect();
        fields.sort_by(|a, b| a.0.cmp(b.0));
        lines.extend(fields.into_iter().map(|(name, value)| format!("{name}:{value}")));
    }
    digest_text(&lines.join("\n"))
}

/// Replaces the records of a bitable table when the result differs from the last sync.
pub(super) fn diff_sync(
    ctx: &DuckcpContext,
    statement: Statement,
    repository: &Repository,
    storage: &Storage,
) -> DuckcpResult<()> {
    let document = required(storage, "document")?;
    let table = required(storage, "table")?;

    let dataset = statement.execute()?;
    let checksum = digest(&dataset);
    let snapshot = ctx
        .catalog()
        .with_conn(|conn| Snapshots::find_by_storage(conn, storage.id))?;
    debug!(document, table, %checksum, rows = dataset.len(), "computed digest");

    if snapshot.as_ref().is_some_and(|s| s.checksum == checksum) {
        info!("bitable {document}/{table} is unchanged");
        return Ok(());
    }

    let credential = |key: &str| {
        get_str(&repository.properties, key).ok_or_else(|| {
            DuckcpError::Validation(format!(
                "bitable repository {} missing `--{}`",
                repository.code,
                key.replace('_', "-")
            ))
        })
    };
    let token = ctx
        .bitable_authenticator(credential("access_key")?, credential("access_secret")?)
        .access_token()?;
    let api = ctx.bitable();

    // Until the last batch lands the snapshot lists the records that exist remotely, unchecksummed.
    let save = |checksum: &str, ids: &[String]| {
        ctx.catalog()
            .with_conn(|conn| Snapshots::replace(conn, storage.id, checksum, ids))
    };

    if let Some(snapshot) = snapshot.filter(|s| !s.records.is_empty()) {
        for chunk in snapshot.records.chunks(DELETE_BATCH_SIZE) {
            api.batch_delete(&token, document, table, chunk)?;
        }
        save(UNSYNCED, &[])?;
        info!(
            "removed {} records from bitable {document}/{table}",
            snapshot.records.len()
        );
    }

    let records = dataset.records();
    let mut ids = Vec::with_capacity(records.len());
    for chunk in records.chunks(CREATE_BATCH_SIZE) {
        ids.extend(api.batch_create(&token, document, table, chunk)?);
        if ids.len() < records.len() {
            save(UNSYNCED, &ids)?;
        }
    }
    save(&checksum, &ids)?;

    info!("saved {} records to bitable {document}/{table}", ids.len());
    Ok(())
}

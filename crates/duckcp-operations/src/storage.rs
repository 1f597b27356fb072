//! Storage management.

use duckcp_core::{
    properties::{any_supplied, merge, prune},
    DuckcpContext, DuckcpError, DuckcpResult, RepositoryKind,
};
use duckcp_db::{
    models::{NewStorage, Repository, Storage, StorageProjection},
    repository::{Repositories, Snapshots, Storages, Transformers},
};
use serde_json::Value as JsonValue;
use tracing::info;

use crate::{
    task::unbind_everywhere,
    types::Properties,
    utils::{already_exists, not_found, require},
};

fn find_repository(ctx: &DuckcpContext, code: &str) -> DuckcpResult<(Repository, RepositoryKind)> {
    let repository = ctx
        .catalog()
        .with_conn(|conn| Repositories::find_by_code(conn, code))?
        .ok_or_else(|| not_found("repository", code))?;
    let kind = repository.kind.parse()?;
    Ok((repository, kind))
}

fn find_existing(ctx: &DuckcpContext, repository: &str, code: &str) -> DuckcpResult<Storage> {
    storage_find(ctx, repository, code)?
        .ok_or_else(|| not_found("storage", &format!("{repository}.{code}")))
}

pub fn storage_create(
    ctx: &DuckcpContext,
    repository: &str,
    code: &str,
    properties: Properties,
) -> DuckcpResult<Storage> {
    let repository = require(repository, "repository name")?;
    let code = require(code, "storage name")?;
    let properties = prune(properties);
    if properties.is_empty() {
        return Err(DuckcpError::Validation(format!(
            "storage ({repository}.{code}) requires medium properties"
        )));
    }

    let (owner, kind) = find_repository(ctx, repository)?;
    kind.ensure_medium_properties(&properties)?;

    let storage = ctx.catalog().transaction(|conn| {
        if Storages::find_by_code(conn, repository, code)?.is_some() {
            return Ok(None);
        }
        Storages::insert(
            conn,
            &NewStorage {
                repository_id: owner.id,
                code,
                properties: JsonValue::Object(properties),
            },
        )
        .map(Some)
    })?;
    let storage =
        storage.ok_or_else(|| already_exists("storage", &format!("{repository}.{code}")))?;

    info!("created {kind} storage ({repository}.{code})");
    Ok(storage)
}

/// Merges the supplied properties into a storage. An empty string removes a property.
///
/// Moving a storage to another medium drops its sync snapshot.
pub fn storage_update(
    ctx: &DuckcpContext,
    repository: &str,
    code: &str,
    properties: Properties,
) -> DuckcpResult<Storage> {
    let repository = require(repository, "repository name")?;
    let code = require(code, "storage name")?;
    if !any_supplied(&properties) {
        return Err(DuckcpError::Validation(format!(
            "nothing to update for storage ({repository}.{code})"
        )));
    }

    let (_, kind) = find_repository(ctx, repository)?;
    let storage = find_existing(ctx, repository, code)?;
    let merged = merge(&storage.properties, &properties);
    kind.ensure_medium_properties(&merged)?;

    let merged = prune(merged);
    let moved = kind
        .medium_required()
        .iter()
        .any(|key| storage.properties.get(key) != merged.get(*key));

    let storage = ctx.catalog().transaction(|conn| {
        if moved {
            Snapshots::delete_by_storage(conn, storage.id)?;
        }
        Storages::update(conn, storage.id, JsonValue::Object(merged))
    })?;
    info!(moved, "updated {kind} storage ({repository}.{code})");
    Ok(storage)
}

/// Deletes a storage; transformers writing into it and its snapshot go with it.
pub fn storage_delete(ctx: &DuckcpContext, repository: &str, code: &str) -> DuckcpResult<()> {
    let storage = find_existing(ctx, repository, code)?;
    ctx.catalog().transaction(|conn| {
        for transformer in Transformers::ids_by_target(conn, storage.id)? {
            unbind_everywhere(conn, transformer)?;
        }
        Storages::delete_by_id(conn, storage.id)
    })?;
    info!("deleted storage ({repository}.{code})");
    Ok(())
}

pub fn storage_find(
    ctx: &DuckcpContext,
    repository: &str,
    code: &str,
) -> DuckcpResult<Option<Storage>> {
    Ok(ctx
        .catalog()
        .with_conn(|conn| Storages::find_by_code(conn, repository, code))?)
}

/// Number of transformers writing into a storage.
pub fn storage_transformers(
    ctx: &DuckcpContext,
    repository: &str,
    code: &str,
) -> DuckcpResult<i64> {
    let storage = find_existing(ctx, repository, code)?;
    Ok(ctx
        .catalog()
        .with_conn(|conn| Transformers::count_by_target(conn, storage.id))?)
}

pub fn storage_list(
    ctx: &DuckcpContext,
    kind: Option<&str>,
    repository: Option<&str>,
) -> DuckcpResult<Vec<StorageProjection>> {
    let kind = kind
        .map(|kind| kind.parse::<RepositoryKind>())
        .transpose()?;
    Ok(ctx
        .catalog()
        .with_conn(|conn| Storages::list(conn, kind.map(|kind| kind.code()), repository))?)
}

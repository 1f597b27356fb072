//! Transformer management and execution.

use duckcp_core::{executor, DuckcpContext, DuckcpError, DuckcpResult, RepositoryKind};
use duckcp_db::{
    models::{NewTransformer, Repository, Storage, Transformer, TransformerProjection},
    repository::{Repositories, Storages, Transformers},
};
use tracing::info;

use crate::{
    task::unbind_everywhere,
    types::{TransformerChanges, TransformerFilter},
    utils::{absolute_path, already_exists, not_found, require},
};

fn find_source(ctx: &DuckcpContext, code: &str) -> DuckcpResult<Repository> {
    ctx.catalog()
        .with_conn(|conn| Repositories::find_by_code(conn, code))?
        .ok_or_else(|| {
            DuckcpError::Validation(format!("source repository ({code}) does not exist"))
        })
}

fn find_target(ctx: &DuckcpContext, repository: &str, storage: &str) -> DuckcpResult<Storage> {
    ctx.catalog()
        .with_conn(|conn| Storages::find_by_code(conn, repository, storage))?
        .ok_or_else(|| {
            DuckcpError::Validation(format!(
                "target storage ({repository}.{storage}) does not exist"
            ))
        })
}

/// Registers a transformer. The script path is stored absolute; the file itself is only
/// required when the transformer runs.
pub fn transformer_create(
    ctx: &DuckcpContext,
    code: &str,
    source: &str,
    target_repository: &str,
    target_storage: &str,
    script_file: &str,
) -> DuckcpResult<Transformer> {
    let code = require(code, "transformer name")?;
    let source = require(source, "source repository")?;
    let target_repository = require(target_repository, "target repository")?;
    let target_storage = require(target_storage, "target storage")?;
    let script_file = absolute_path(require(script_file, "script file")?)?;

    let exists = ctx
        .catalog()
        .with_conn(|conn| Transformers::exists_by_code(conn, code))?;
    if exists {
        return Err(already_exists("transformer", code));
    }
    let source = find_source(ctx, source)?;
    let target = find_target(ctx, target_repository, target_storage)?;

    let transformer = ctx.catalog().with_conn(|conn| {
        Transformers::insert(
            conn,
            &NewTransformer {
                code,
                source_id: source.id,
                target_id: target.id,
                script_file: &script_file,
            },
        )
    })?;
    info!(
        "created transformer ({code}) from repository({}) to storage({target_repository}.{target_storage})",
        source.code
    );
    Ok(transformer)
}

pub fn transformer_update(
    ctx: &DuckcpContext,
    code: &str,
    changes: TransformerChanges,
) -> DuckcpResult<Transformer> {
    let code = require(code, "transformer name")?;
    if changes.is_empty() {
        return Err(DuckcpError::Validation(format!(
            "nothing to update for transformer ({code})"
        )));
    }
    if changes.target_repository.is_some() != changes.target_storage.is_some() {
        return Err(DuckcpError::Validation(
            "target repository and target storage must be given together".into(),
        ));
    }

    let transformer = transformer_find(ctx, code)?.ok_or_else(|| not_found("transformer", code))?;
    let source_id = match &changes.source {
        Some(source) => find_source(ctx, source)?.id,
        None => transformer.source_id,
    };
    let target_id = match (&changes.target_repository, &changes.target_storage) {
        (Some(repository), Some(storage)) => find_target(ctx, repository, storage)?.id,
        _ => transformer.target_id,
    };
    let script_file = match &changes.script_file {
        Some(script_file) => absolute_path(require(script_file, "script file")?)?,
        None => transformer.script_file,
    };

    let transformer = ctx.catalog().with_conn(|conn| {
        Transformers::update(conn, transformer.id, source_id, target_id, &script_file)
    })?;
    info!("updated transformer ({code})");
    Ok(transformer)
}

/// Deletes a transformer and removes it from every task, closing the gaps it leaves.
pub fn transformer_delete(ctx: &DuckcpContext, code: &str) -> DuckcpResult<()> {
    let code = require(code, "transformer name")?;
    let deleted = ctx.catalog().transaction(|conn| {
        let Some(transformer) = Transformers::find_by_code(conn, code)? else {
            return Ok(0);
        };
        unbind_everywhere(conn, transformer.id)?;
        Transformers::delete_by_code(conn, code)
    })?;
    if deleted == 0 {
        return Err(not_found("transformer", code));
    }
    info!("deleted transformer ({code})");
    Ok(())
}

pub fn transformer_find(ctx: &DuckcpContext, code: &str) -> DuckcpResult<Option<Transformer>> {
    Ok(ctx
        .catalog()
        .with_conn(|conn| Transformers::find_by_code(conn, code))?)
}

pub fn transformer_list(
    ctx: &DuckcpContext,
    filter: &TransformerFilter,
) -> DuckcpResult<Vec<TransformerProjection>> {
    let parse = |kind: &Option<String>| {
        kind.as_deref()
            .map(str::parse::<RepositoryKind>)
            .transpose()
    };
    let source_kind = parse(&filter.source_kind)?;
    let target_kind = parse(&filter.target_kind)?;

    Ok(ctx.catalog().with_conn(|conn| {
        Transformers::list(
            conn,
            source_kind.map(|kind| kind.code()),
            filter.source.as_deref(),
            target_kind.map(|kind| kind.code()),
            filter.target.as_deref(),
            filter.storage.as_deref(),
        )
    })?)
}

/// Runs a transformer now.
pub fn transformer_execute(ctx: &DuckcpContext, code: &str) -> DuckcpResult<()> {
    executor::execute_transformer(ctx, require(code, "transformer name")?)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        repository::repository_create,
        storage::{storage_create, storage_delete},
        testing::{props, TestCatalog},
    };

    fn setup() -> TestCatalog {
        let env = TestCatalog::new();
        for code in ["a", "b"] {
            repository_create(
                &env.ctx,
                code,
                "sqlite",
                props(json!({"file": env.path(&format!("{code}.db"))})),
            )
            .unwrap();
        }
        storage_create(&env.ctx, "b", "t2", props(json!({"table": "t2"}))).unwrap();
        storage_create(&env.ctx, "a", "t3", props(json!({"table": "t3"}))).unwrap();
        env
    }

    #[test]
    fn test_create_transformer() {
        let env = setup();
        let script = env.path("m.sql");
        let transformer = transformer_create(&env.ctx, "m", "a", "b", "t2", &script).unwrap();
        assert_eq!(transformer.script_file, script);

        let err = transformer_create(&env.ctx, "m", "a", "b", "t2", &script).unwrap_err();
        assert_eq!(err.to_string(), "transformer (m) already exists");

        let err = transformer_create(&env.ctx, "n", "zz", "b", "t2", &script).unwrap_err();
        assert_eq!(err.to_string(), "source repository (zz) does not exist");
        let err = transformer_create(&env.ctx, "n", "a", "b", "zz", &script).unwrap_err();
        assert_eq!(err.to_string(), "target storage (b.zz) does not exist");
        let err = transformer_create(&env.ctx, "n", "a", "b", "t2", " ").unwrap_err();
        assert!(matches!(err, DuckcpError::Validation(_)));
    }

    #[test]
    fn test_relative_script_is_stored_absolute() {
        let env = setup();
        let transformer =
            transformer_create(&env.ctx, "m", "a", "b", "t2", "scripts/m.sql").unwrap();
        assert!(std::path::Path::new(&transformer.script_file).is_absolute());
        assert!(transformer.script_file.ends_with("scripts/m.sql"));
    }

    #[test]
    fn test_update_transformer() {
        let env = setup();
        let created =
            transformer_create(&env.ctx, "m", "a", "b", "t2", &env.path("m.sql")).unwrap();

        let err = transformer_update(&env.ctx, "m", TransformerChanges::default()).unwrap_err();
        assert!(matches!(err, DuckcpError::Validation(_)));
        let err = transformer_update(
            &env.ctx,
            "m",
            TransformerChanges {
                target_repository: Some("a".into()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, DuckcpError::Validation(_)));

        let updated = transformer_update(
            &env.ctx,
            "m",
            TransformerChanges {
                source: Some("b".into()),
                target_repository: Some("a".into()),
                target_storage: Some("t3".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_ne!(updated.source_id, created.source_id);
        assert_ne!(updated.target_id, created.target_id);
        assert_eq!(updated.script_file, created.script_file);

        let err = transformer_update(
            &env.ctx,
            "nope",
            TransformerChanges {
                script_file: Some("x.sql".into()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, DuckcpError::NotFound(_)));
    }

    #[test]
    fn test_list_and_cascade() {
        let env = setup();
        transformer_create(&env.ctx, "m", "a", "b", "t2", &env.path("m.sql")).unwrap();
        transformer_create(&env.ctx, "n", "b", "a", "t3", &env.path("n.sql")).unwrap();

        let all = transformer_list(&env.ctx, &TransformerFilter::default()).unwrap();
        assert_eq!(all.len(), 2);
        let filtered = transformer_list(
            &env.ctx,
            &TransformerFilter {
                source: Some("a".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].target_storage_code, "t2");
        assert!(transformer_list(
            &env.ctx,
            &TransformerFilter {
                source_kind: Some("mysql".into()),
                ..Default::default()
            },
        )
        .is_err());

        storage_delete(&env.ctx, "b", "t2").unwrap();
        assert!(transformer_find(&env.ctx, "m").unwrap().is_none());

        transformer_delete(&env.ctx, "n").unwrap();
        let err = transformer_delete(&env.ctx, "n").unwrap_err();
        assert!(matches!(err, DuckcpError::NotFound(_)));
    }
}

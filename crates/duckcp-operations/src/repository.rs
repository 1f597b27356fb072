//! Repository management.

use duckcp_core::{
    adapter::{self, Connection},
    properties::{any_supplied, merge, prune},
    Dataset, DuckcpContext, DuckcpError, DuckcpResult, RepositoryKind,
};
use duckcp_db::{
    models::{NewRepository, Repository, RepositoryProjection},
    repository::{Repositories, Storages, Transformers},
};
use serde_json::Value as JsonValue;
use tracing::{debug, info};

use crate::{
    task::unbind_everywhere,
    types::Properties,
    utils::{absolutize, already_exists, not_found, require},
};

/// Path-valued connection properties, stored absolute.
const PATH_PROPERTIES: &[&str] = &["file", "folder"];

fn find_existing(ctx: &DuckcpContext, code: &str) -> DuckcpResult<Repository> {
    repository_find(ctx, code)?.ok_or_else(|| not_found("repository", code))
}

pub fn repository_create(
    ctx: &DuckcpContext,
    code: &str,
    kind: &str,
    properties: Properties,
) -> DuckcpResult<Repository> {
    let code = require(code, "repository name")?;
    let kind: RepositoryKind = require(kind, "repository kind")?.parse()?;

    let mut properties = prune(properties);
    if properties.is_empty() {
        return Err(DuckcpError::Validation(format!(
            "{kind} repository requires connection properties"
        )));
    }
    kind.ensure_connection_properties(&properties)?;
    absolutize(&mut properties, PATH_PROPERTIES)?;

    let repository = ctx.catalog().transaction(|conn| {
        if Repositories::exists_by_code(conn, code)? {
            return Ok(None);
        }
        Repositories::insert(
            conn,
            &NewRepository {
                kind: kind.code(),
                code,
                properties: JsonValue::Object(properties),
            },
        )
        .map(Some)
    })?;
    let repository = repository.ok_or_else(|| already_exists("repository", code))?;

    info!("created {kind} repository ({code})");
    Ok(repository)
}

/// Updates the kind and/or properties of a repository.
///
/// Supplied properties are merged over the stored ones and the result must satisfy the
/// connection requirements of the resulting kind. Supplying an empty string removes a property.
pub fn repository_update(
    ctx: &DuckcpContext,
    code: &str,
    kind: Option<&str>,
    properties: Properties,
) -> DuckcpResult<Repository> {
    let code = require(code, "repository name")?;
    let kind = kind.map(str::trim).filter(|kind| !kind.is_empty());
    if kind.is_none() && !any_supplied(&properties) {
        return Err(DuckcpError::Validation(format!(
            "nothing to update for repository ({code})"
        )));
    }

    let repository = find_existing(ctx, code)?;
    let kind: RepositoryKind = kind.unwrap_or(repository.kind.as_str()).parse()?;

    let merged = merge(&repository.properties, &properties);
    kind.ensure_connection_properties(&merged)?;
    let mut merged = prune(merged);
    absolutize(&mut merged, PATH_PROPERTIES)?;
    debug!(code, kind = %kind, "updating repository");

    let repository = ctx.catalog().with_conn(|conn| {
        Repositories::update(conn, code, kind.code(), JsonValue::Object(merged))
    })?;
    info!("updated {kind} repository ({code})");
    Ok(repository)
}

/// Deletes a repository together with its storages and every transformer reading or writing
/// it.
pub fn repository_delete(ctx: &DuckcpContext, code: &str) -> DuckcpResult<()> {
    let code = require(code, "repository name")?;
    let repository = find_existing(ctx, code)?;
    ctx.catalog().transaction(|conn| {
        for transformer in Transformers::ids_by_repository(conn, repository.id)? {
            unbind_everywhere(conn, transformer)?;
        }
        Repositories::delete_by_code(conn, code)
    })?;
    info!("deleted repository ({code})");
    Ok(())
}

pub fn repository_find(ctx: &DuckcpContext, code: &str) -> DuckcpResult<Option<Repository>> {
    Ok(ctx
        .catalog()
        .with_conn(|conn| Repositories::find_by_code(conn, code))?)
}

/// Number of storages held by a repository.
pub fn repository_storages(ctx: &DuckcpContext, code: &str) -> DuckcpResult<i64> {
    let repository = find_existing(ctx, code)?;
    Ok(ctx
        .catalog()
        .with_conn(|conn| Storages::count_by_repository(conn, repository.id))?)
}

/// Number of transformers reading from a repository.
pub fn repository_transformers(ctx: &DuckcpContext, code: &str) -> DuckcpResult<i64> {
    let repository = find_existing(ctx, code)?;
    Ok(ctx
        .catalog()
        .with_conn(|conn| Transformers::count_by_source(conn, repository.id))?)
}

pub fn repository_list(
    ctx: &DuckcpContext,
    kind: Option<&str>,
) -> DuckcpResult<Vec<RepositoryProjection>> {
    let kind = kind
        .map(|kind| kind.parse::<RepositoryKind>())
        .transpose()?;
    Ok(ctx
        .catalog()
        .with_conn(|conn| Repositories::list(conn, kind.map(|kind| kind.code())))?)
}

/// Runs an ad-hoc query against a repository.
pub fn repository_execute(ctx: &DuckcpContext, code: &str, sql: &str) -> DuckcpResult<Dataset> {
    let repository = find_existing(ctx, code)?;
    let sql = require(sql, "query")?;
    debug!(repository = code, sql, "executing query");

    let mut connection = adapter::connect(ctx, &repository)?;
    connection.query(sql, &[])
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::{props, TestCatalog};

    fn full_properties(kind: RepositoryKind) -> Properties {
        let mut properties = Properties::new();
        for key in kind.connection_required() {
            properties.insert((*key).to_string(), json!(format!("/tmp/{key}")));
        }
        properties
    }

    #[test]
    fn test_create_every_kind() {
        let env = TestCatalog::new();
        for kind in RepositoryKind::ALL.iter() {
            let code = format!("repo-{}", kind.code());
            repository_create(&env.ctx, &code, kind.code(), full_properties(*kind)).unwrap();
            let found = repository_find(&env.ctx, &code).unwrap().unwrap();
            assert_eq!(found.kind, kind.code());
        }
    }

    #[test]
    fn test_create_missing_required_property() {
        let env = TestCatalog::new();
        for kind in RepositoryKind::ALL.iter() {
            for omitted in kind.connection_required() {
                let mut properties = full_properties(*kind);
                properties.remove(*omitted);
                properties.insert("unrelated".into(), json!("x"));
                let err = repository_create(&env.ctx, "r", kind.code(), properties).unwrap_err();
                assert!(matches!(err, DuckcpError::Validation(_)), "{err}");
            }
        }
        assert!(repository_list(&env.ctx, None).unwrap().is_empty());
    }

    #[test]
    fn test_create_validation() {
        let env = TestCatalog::new();
        let properties = || props(json!({"file": env.path("a.db")}));

        let err = repository_create(&env.ctx, "", "sqlite", properties()).unwrap_err();
        assert!(matches!(err, DuckcpError::Validation(_)));
        let err = repository_create(&env.ctx, "a", "mysql", properties()).unwrap_err();
        assert!(matches!(err, DuckcpError::Validation(_)));
        let err = repository_create(&env.ctx, "a", "sqlite", props(json!({"file": ""})))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "sqlite repository requires connection properties"
        );

        repository_create(&env.ctx, "a", "sqlite", properties()).unwrap();
        let err = repository_create(&env.ctx, "a", "sqlite", properties()).unwrap_err();
        assert_eq!(err.to_string(), "repository (a) already exists");
    }

    #[test]
    fn test_create_stores_absolute_pruned_properties() {
        let env = TestCatalog::new();
        let repository = repository_create(
            &env.ctx,
            "pg",
            "postgres",
            props(json!({"database": "app", "host": "", "port": 5432, "password": null})),
        )
        .unwrap();
        assert_eq!(repository.properties, json!({"database": "app", "port": 5432}));

        let repository = repository_create(
            &env.ctx,
            "local",
            "sqlite",
            props(json!({"file": "data/local.db"})),
        )
        .unwrap();
        let file = repository.properties["file"].as_str().unwrap();
        assert!(std::path::Path::new(file).is_absolute());
        assert!(file.ends_with("data/local.db"));
    }

    #[test]
    fn test_update_merges_supplied_properties() {
        let env = TestCatalog::new();
        repository_create(
            &env.ctx,
            "pg",
            "postgres",
            props(json!({"database": "app", "host": "db", "username": "me"})),
        )
        .unwrap();

        let updated = repository_update(
            &env.ctx,
            "pg",
            None,
            props(json!({"host": "db2", "username": "", "password": null, "port": 0})),
        )
        .unwrap();
        assert_eq!(
            updated.properties,
            json!({"database": "app", "host": "db2", "port": 0})
        );
    }

    #[test]
    fn test_update_validation() {
        let env = TestCatalog::new();
        let err = repository_update(&env.ctx, "pg", None, props(json!({"host": null})))
            .unwrap_err();
        assert!(matches!(err, DuckcpError::Validation(_)));

        let err = repository_update(&env.ctx, "pg", None, props(json!({"host": "x"})))
            .unwrap_err();
        assert!(matches!(err, DuckcpError::NotFound(_)));

        repository_create(&env.ctx, "pg", "postgres", props(json!({"database": "app"}))).unwrap();
        let err = repository_update(&env.ctx, "pg", None, props(json!({"database": ""})))
            .unwrap_err();
        assert_eq!(err.to_string(), "postgres repository missing `--database`");

        // switching kind validates against the new kind
        let err = repository_update(&env.ctx, "pg", Some("sqlite"), Properties::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "sqlite repository missing `--file`");
        let updated = repository_update(
            &env.ctx,
            "pg",
            Some("sqlite"),
            props(json!({"file": env.path("pg.db")})),
        )
        .unwrap();
        assert_eq!(updated.kind, "sqlite");
    }

    #[test]
    fn test_delete_and_list() {
        let env = TestCatalog::new();
        repository_create(&env.ctx, "a", "sqlite", props(json!({"file": env.path("a.db")})))
            .unwrap();
        repository_create(&env.ctx, "f", "file", props(json!({"folder": env.path("out")})))
            .unwrap();

        let listed = repository_list(&env.ctx, Some("file")).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].code, "f");
        assert!(repository_list(&env.ctx, Some("nope")).is_err());
        assert_eq!(repository_storages(&env.ctx, "a").unwrap(), 0);
        assert_eq!(repository_transformers(&env.ctx, "a").unwrap(), 0);

        repository_delete(&env.ctx, "a").unwrap();
        let err = repository_delete(&env.ctx, "a").unwrap_err();
        assert!(matches!(err, DuckcpError::NotFound(_)));
        assert_eq!(repository_list(&env.ctx, None).unwrap().len(), 1);
    }

    #[test]
    fn test_execute_query() {
        let env = TestCatalog::new();
        repository_create(&env.ctx, "a", "sqlite", props(json!({"file": env.path("a.db")})))
            .unwrap();

        let dataset = repository_execute(&env.ctx, "a", "select 1 as one, 'x' as two").unwrap();
        assert_eq!(dataset.columns, vec!["one", "two"]);
        assert_eq!(dataset.len(), 1);
    }
}

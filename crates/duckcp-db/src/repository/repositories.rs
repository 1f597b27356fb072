use diesel::{prelude::*, sql_types::Text, sqlite::Sqlite};
use serde_json::Value;

use crate::{
    models::{timestamp, NewRepository, Repository, RepositoryProjection},
    schema::repositories,
};

pub struct Repositories;

impl Repositories {
    pub fn find_by_code(conn: &mut SqliteConnection, code: &str) -> QueryResult<Option<Repository>> {
        repositories::table
            .filter(repositories::code.eq(code))
            .select(Repository::as_select())
            .first(conn)
            .optional()
    }

    pub fn find_by_id(conn: &mut SqliteConnection, id: i32) -> QueryResult<Option<Repository>> {
        repositories::table
            .find(id)
            .select(Repository::as_select())
            .first(conn)
            .optional()
    }

    pub fn exists_by_code(conn: &mut SqliteConnection, code: &str) -> QueryResult<bool> {
        use diesel::dsl::exists;
        diesel::select(exists(
            repositories::table.filter(repositories::code.eq(code)),
        ))
        .get_result(conn)
    }

    pub fn insert(conn: &mut SqliteConnection, repository: &NewRepository) -> QueryResult<Repository> {
        diesel::insert_into(repositories::table)
            .values(repository)
            .returning(Repository::as_returning())
            .get_result(conn)
    }

    pub fn update(
        conn: &mut SqliteConnection,
        code: &str,
        kind: &str,
        properties: Value,
    ) -> QueryResult<Repository> {
        diesel::update(repositories::table.filter(repositories::code.eq(code)))
            .set((
                repositories::kind.eq(kind),
                repositories::properties.eq(properties),
                repositories::updated_at.eq(timestamp()),
            ))
            .returning(Repository::as_returning())
            .get_result(conn)
    }

    /// Deletes a repository; its storages and transformers go with it.
    pub fn delete_by_code(conn: &mut SqliteConnection, code: &str) -> QueryResult<usize> {
        diesel::delete(repositories::table.filter(repositories::code.eq(code))).execute(conn)
    }

    /// Lists repositories with their storage and transformer counts, optionally of one kind.
    pub fn list(
        conn: &mut SqliteConnection,
        kind: Option<&str>,
    ) -> QueryResult<Vec<RepositoryProjection>> {
        let filter = if kind.is_some() {
            "where repositories.kind = ?"
        } else {
            ""
        };
        let query = format!(
            "with repository_storages as (
               select repository_id as id, count(*) as storages
               from storages group by repository_id
             ),
             repository_transformers as (
               select source_id as id, count(*) as transformers
               from transformers group by source_id
             )
             select
               repositories.kind,
               repositories.code,
               coalesce(repository_storages.storages, 0) as storages,
               coalesce(repository_transformers.transformers, 0) as transformers
             from repositories
             left join repository_storages on repositories.id = repository_storages.id
             left join repository_transformers on repositories.id = repository_transformers.id
             {filter}
             order by repositories.kind, repositories.code"
        );

        let mut query = diesel::sql_query(query).into_boxed::<Sqlite>();
        if let Some(kind) = kind {
            query = query.bind::<Text, _>(kind.to_string());
        }
        query.load(conn)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{connection::test_utils::fresh_store, models::NewStorage, repository::Storages};

    #[test]
    fn test_insert_find_update_delete() {
        let (_dir, store) = fresh_store();
        let mut conn = store.connect().unwrap();
        let properties = json!({"file": "/tmp/a.db"});

        let created = Repositories::insert(
            &mut conn,
            &NewRepository {
                kind: "sqlite",
                code: "src",
                properties: properties.clone(),
            },
        )
        .unwrap();
        assert!(Repositories::exists_by_code(&mut conn, "src").unwrap());

        let found = Repositories::find_by_code(&mut conn, "src").unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.properties, properties);

        let updated = Repositories::update(&mut conn, "src", "duckdb", json!({"file": "/tmp/b.db"}))
            .unwrap();
        assert_eq!(updated.kind, "duckdb");
        assert_eq!(updated.properties["file"], "/tmp/b.db");

        assert_eq!(Repositories::delete_by_code(&mut conn, "src").unwrap(), 1);
        assert!(Repositories::find_by_code(&mut conn, "src").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_code_is_rejected() {
        let (_dir, store) = fresh_store();
        let mut conn = store.connect().unwrap();
        let new = NewRepository {
            kind: "postgres",
            code: "pg",
            properties: json!({"database": "db"}),
        };
        Repositories::insert(&mut conn, &new).unwrap();
        assert!(Repositories::insert(&mut conn, &new).is_err());
    }

    #[test]
    fn test_list_counts_storages() {
        let (_dir, store) = fresh_store();
        let mut conn = store.connect().unwrap();
        let repository = Repositories::insert(
            &mut conn,
            &NewRepository {
                kind: "sqlite",
                code: "a",
                properties: json!({"file": "/tmp/a.db"}),
            },
        )
        .unwrap();
        Repositories::insert(
            &mut conn,
            &NewRepository {
                kind: "duckdb",
                code: "b",
                properties: json!({"file": "/tmp/b.db"}),
            },
        )
        .unwrap();
        Storages::insert(
            &mut conn,
            &NewStorage {
                repository_id: repository.id,
                code: "t",
                properties: json!({"table": "t"}),
            },
        )
        .unwrap();

        let all = Repositories::list(&mut conn, None).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].kind, "duckdb");
        assert_eq!(all[1].code, "a");
        assert_eq!(all[1].storages, 1);
        assert_eq!(all[1].transformers, 0);

        let sqlite = Repositories::list(&mut conn, Some("sqlite")).unwrap();
        assert_eq!(sqlite.len(), 1);
    }
}

use diesel::{prelude::*, sql_types::Text, sqlite::Sqlite};
use serde_json::Value;

use crate::{
    models::{timestamp, NewStorage, Storage, StorageProjection},
    schema::{repositories, storages},
};

pub struct Storages;

impl Storages {
    /// Finds a storage by its repository code and its own code.
    pub fn find_by_code(
        conn: &mut SqliteConnection,
        repository_code: &str,
        code: &str,
    ) -> QueryResult<Option<Storage>> {
        storages::table
            .inner_join(repositories::table)
            .filter(repositories::code.eq(repository_code))
            .filter(storages::code.eq(code))
            .select(Storage::as_select())
            .first(conn)
            .optional()
    }

    pub fn find_by_id(conn: &mut SqliteConnection, id: i32) -> QueryResult<Option<Storage>> {
        storages::table
            .find(id)
            .select(Storage::as_select())
            .first(conn)
            .optional()
    }

    pub fn list_by_repository(
        conn: &mut SqliteConnection,
        repository_id: i32,
    ) -> QueryResult<Vec<Storage>> {
        storages::table
            .filter(storages::repository_id.eq(repository_id))
            .order(storages::code.asc())
            .select(Storage::as_select())
            .load(conn)
    }

    pub fn count_by_repository(conn: &mut SqliteConnection, repository_id: i32) -> QueryResult<i64> {
        storages::table
            .filter(storages::repository_id.eq(repository_id))
            .count()
            .get_result(conn)
    }

    pub fn insert(conn: &mut SqliteConnection, storage: &NewStorage) -> QueryResult<Storage> {
        diesel::insert_into(storages::table)
            .values(storage)
            .returning(Storage::as_returning())
            .get_result(conn)
    }

    pub fn update(conn: &mut SqliteConnection, id: i32, properties: Value) -> QueryResult<Storage> {
        diesel::update(storages::table.find(id))
            .set((
                storages::properties.eq(properties),
                storages::updated_at.eq(timestamp()),
            ))
            .returning(Storage::as_returning())
            .get_result(conn)
    }

    pub fn delete_by_id(conn: &mut SqliteConnection, id: i32) -> QueryResult<usize> {
        diesel::delete(storages::table.find(id)).execute(conn)
    }

    /// Lists storages with their transformer counts.
    pub fn list(
        conn: &mut SqliteConnection,
        repository_kind: Option<&str>,
        repository_code: Option<&str>,
    ) -> QueryResult<Vec<StorageProjection>> {
        let mut filters = Vec::new();
        if repository_kind.is_some() {
            filters.push("and repositories.kind = ?");
        }
        if repository_code.is_some() {
            filters.push("and repositories.code = ?");
        }
        let query = format!(
            "with storage_transformers as (
               select target_id as id, count(*) as transformers
               from transformers group by target_id
             )
             select
               repositories.kind as repository_kind,
               repositories.code as repository_code,
               storages.code,
               coalesce(storage_transformers.transformers, 0) as transformers
             from storages
             inner join repositories
               on storages.repository_id = repositories.id
               {}
             left join storage_transformers on storages.id = storage_transformers.id
             order by repositories.kind, repositories.code, storages.code",
            filters.join(" ")
        );

        let mut query = diesel::sql_query(query).into_boxed::<Sqlite>();
        for value in [repository_kind, repository_code].into_iter().flatten() {
            query = query.bind::<Text, _>(value.to_string());
        }
        query.load(conn)
    }
}

use diesel::{prelude::*, sql_types::Text, sqlite::Sqlite};

use crate::{
    models::{timestamp, NewTransformer, Transformer, TransformerProjection},
    schema::{storages, transformers},
};

pub struct Transformers;

impl Transformers {
    pub fn find_by_code(conn: &mut SqliteConnection, code: &str) -> QueryResult<Option<Transformer>> {
        transformers::table
            .filter(transformers::code.eq(code))
            .select(Transformer::as_select())
            .first(conn)
            .optional()
    }

    pub fn exists_by_code(conn: &mut SqliteConnection, code: &str) -> QueryResult<bool> {
        use diesel::dsl::exists;
        diesel::select(exists(
            transformers::table.filter(transformers::code.eq(code)),
        ))
        .get_result(conn)
    }

    pub fn count_by_source(conn: &mut SqliteConnection, repository_id: i32) -> QueryResult<i64> {
        transformers::table
            .filter(transformers::source_id.eq(repository_id))
            .count()
            .get_result(conn)
    }

    pub fn count_by_target(conn: &mut SqliteConnection, storage_id: i32) -> QueryResult<i64> {
        transformers::table
            .filter(transformers::target_id.eq(storage_id))
            .count()
            .get_result(conn)
    }

    pub fn ids_by_target(conn: &mut SqliteConnection, storage_id: i32) -> QueryResult<Vec<i32>> {
        transformers::table
            .filter(transformers::target_id.eq(storage_id))
            .select(transformers::id)
            .load(conn)
    }

    /// Transformers reading from a repository or writing into one of its storages.
    pub fn ids_by_repository(
        conn: &mut SqliteConnection,
        repository_id: i32,
    ) -> QueryResult<Vec<i32>> {
        let storages = storages::table
            .filter(storages::repository_id.eq(repository_id))
            .select(storages::id);
        transformers::table
            .filter(
                transformers::source_id
                    .eq(repository_id)
                    .or(transformers::target_id.eq_any(storages)),
            )
            .select(transformers::id)
            .load(conn)
    }

    pub fn insert(
        conn: &mut SqliteConnection,
        transformer: &NewTransformer,
    ) -> QueryResult<Transformer> {
        diesel::insert_into(transformers::table)
            .values(transformer)
            .returning(Transformer::as_returning())
            .get_result(conn)
    }

    pub fn update(
        conn: &mut SqliteConnection,
        id: i32,
        source_id: i32,
        target_id: i32,
        script_file: &str,
    ) -> QueryResult<Transformer> {
        diesel::update(transformers::table.find(id))
            .set((
                transformers::source_id.eq(source_id),
                transformers::target_id.eq(target_id),
                transformers::script_file.eq(script_file),
                transformers::updated_at.eq(timestamp()),
            ))
            .returning(Transformer::as_returning())
            .get_result(conn)
    }

    pub fn delete_by_code(conn: &mut SqliteConnection, code: &str) -> QueryResult<usize> {
        diesel::delete(transformers::table.filter(transformers::code.eq(code))).execute(conn)
    }

    /// Lists transformers joined with their source and target, filtered by any of the given
    /// kinds and codes.
    pub fn list(
        conn: &mut SqliteConnection,
        source_repository_kind: Option<&str>,
        source_repository_code: Option<&str>,
        target_repository_kind: Option<&str>,
        target_repository_code: Option<&str>,
        target_storage_code: Option<&str>,
    ) -> QueryResult<Vec<TransformerProjection>> {
        let conditions = [
            (source_repository_kind, "and sources.kind = ?"),
            (source_repository_code, "and sources.code = ?"),
            (target_repository_kind, "and targets.kind = ?"),
            (target_repository_code, "and targets.code = ?"),
            (target_storage_code, "and storages.code = ?"),
        ];
        let filters: Vec<&str> = conditions
            .iter()
            .filter(|(value, _)| value.is_some())
            .map(|(_, filter)| *filter)
            .collect();

        let query = format!(
            "with transformer_tasks as (
               select transformer_id as id, count(*) as tasks
               from tasks_transformers group by transformer_id
             )
             select
               transformers.code,
               sources.kind as source_repository_kind,
               sources.code as source_repository_code,
               targets.kind as target_repository_kind,
               targets.code as target_repository_code,
               storages.code as target_storage_code,
               transformers.script_file,
               coalesce(transformer_tasks.tasks, 0) as tasks
             from transformers
             inner join repositories as sources on transformers.source_id = sources.id
             inner join storages on transformers.target_id = storages.id
             inner join repositories as targets
               on storages.repository_id = targets.id
               {}
             left join transformer_tasks on transformers.id = transformer_tasks.id
             order by transformers.code",
            filters.join(" ")
        );

        let mut query = diesel::sql_query(query).into_boxed::<Sqlite>();
        for (value, _) in conditions {
            if let Some(value) = value {
                query = query.bind::<Text, _>(value.to_string());
            }
        }
        query.load(conn)
    }
}

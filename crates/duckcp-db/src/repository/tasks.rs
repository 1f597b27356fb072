use diesel::{prelude::*, sql_types::Text, sqlite::Sqlite};

use crate::{
    models::{
        timestamp, NewTask, NewTaskTransformer, Task, TaskProjection, TaskTransformer,
        TaskTransformerProjection,
    },
    schema::{tasks, tasks_transformers, transformers},
};

pub struct Tasks;

impl Tasks {
    pub fn find_by_code(conn: &mut SqliteConnection, code: &str) -> QueryResult<Option<Task>> {
        tasks::table
            .filter(tasks::code.eq(code))
            .select(Task::as_select())
            .first(conn)
            .optional()
    }

    pub fn insert(conn: &mut SqliteConnection, task: &NewTask) -> QueryResult<Task> {
        diesel::insert_into(tasks::table)
            .values(task)
            .returning(Task::as_returning())
            .get_result(conn)
    }

    pub fn delete_by_code(conn: &mut SqliteConnection, code: &str) -> QueryResult<usize> {
        diesel::delete(tasks::table.filter(tasks::code.eq(code))).execute(conn)
    }

    pub fn list(conn: &mut SqliteConnection) -> QueryResult<Vec<TaskProjection>> {
        diesel::sql_query(
            "select
               tasks.code,
               count(tasks_transformers.transformer_id) as transformers
             from tasks
             left join tasks_transformers on tasks.id = tasks_transformers.task_id
             group by tasks.id, tasks.code
             order by tasks.code",
        )
        .load(conn)
    }
}

/// Ordered membership of transformers in tasks.
///
/// Within a task, `sort` always runs densely from 1 to the number of bound transformers.
pub struct TaskTransformers;

impl TaskTransformers {
    pub fn find(
        conn: &mut SqliteConnection,
        task_id: i32,
        transformer_id: i32,
    ) -> QueryResult<Option<TaskTransformer>> {
        tasks_transformers::table
            .find((task_id, transformer_id))
            .select(TaskTransformer::as_select())
            .first(conn)
            .optional()
    }

    pub fn count_by_task(conn: &mut SqliteConnection, task_id: i32) -> QueryResult<i64> {
        tasks_transformers::table
            .filter(tasks_transformers::task_id.eq(task_id))
            .count()
            .get_result(conn)
    }

    pub fn list_by_task(
        conn: &mut SqliteConnection,
        task_id: i32,
    ) -> QueryResult<Vec<TaskTransformer>> {
        tasks_transformers::table
            .filter(tasks_transformers::task_id.eq(task_id))
            .order(tasks_transformers::sort.asc())
            .select(TaskTransformer::as_select())
            .load(conn)
    }

    /// Tasks a transformer is bound to.
    pub fn task_ids_by_transformer(
        conn: &mut SqliteConnection,
        transformer_id: i32,
    ) -> QueryResult<Vec<i32>> {
        tasks_transformers::table
            .filter(tasks_transformers::transformer_id.eq(transformer_id))
            .select(tasks_transformers::task_id)
            .load(conn)
    }

    /// Codes of the transformers bound to a task, in execution order.
    pub fn transformer_codes(conn: &mut SqliteConnection, task_id: i32) -> QueryResult<Vec<String>> {
        tasks_transformers::table
            .inner_join(transformers::table)
            .filter(tasks_transformers::task_id.eq(task_id))
            .order(tasks_transformers::sort.asc())
            .select(transformers::code)
            .load(conn)
    }

    /// Binds a transformer to a task and returns its sort.
    ///
    /// A `position` within `1..=count` shifts the bindings at and after it up by one; any other
    /// position appends.
    pub fn bind(
        conn: &mut SqliteConnection,
        task_id: i32,
        transformer_id: i32,
        position: Option<i32>,
    ) -> QueryResult<i32> {
        conn.transaction(|conn| {
            let count = i32::try_from(Self::count_by_task(conn, task_id)?).unwrap_or(i32::MAX);
            let sort = match position {
                Some(position) if position > 0 && position <= count => {
                    diesel::update(
                        tasks_transformers::table
                            .filter(tasks_transformers::task_id.eq(task_id))
                            .filter(tasks_transformers::sort.ge(position)),
                    )
                    .set((
                        tasks_transformers::sort.eq(tasks_transformers::sort + 1),
                        tasks_transformers::updated_at.eq(timestamp()),
                    ))
                    .execute(conn)?;
                    position
                }
                _ => count + 1,
            };

            diesel::insert_into(tasks_transformers::table)
                .values(NewTaskTransformer {
                    task_id,
                    transformer_id,
                    sort,
                })
                .execute(conn)?;
            Ok(sort)
        })
    }

    /// Removes a binding and closes the gap it leaves. Returns the removed sort, or `None` if
    /// the pair was not bound.
    pub fn unbind(
        conn: &mut SqliteConnection,
        task_id: i32,
        transformer_id: i32,
    ) -> QueryResult<Option<i32>> {
        conn.transaction(|conn| {
            let Some(binding) = Self::find(conn, task_id, transformer_id)? else {
                return Ok(None);
            };

            diesel::delete(tasks_transformers::table.find((task_id, transformer_id)))
                .execute(conn)?;
            diesel::update(
                tasks_transformers::table
                    .filter(tasks_transformers::task_id.eq(task_id))
                    .filter(tasks_transformers::sort.gt(binding.sort)),
            )
            .set((
                tasks_transformers::sort.eq(tasks_transformers::sort - 1),
                tasks_transformers::updated_at.eq(timestamp()),
            ))
            .execute(conn)?;
            Ok(Some(binding.sort))
        })
    }

    /// Lists bindings with their transformer details, optionally for one task.
    pub fn list(
        conn: &mut SqliteConnection,
        task_code: Option<&str>,
    ) -> QueryResult<Vec<TaskTransformerProjection>> {
        let filter = if task_code.is_some() {
            "where tasks.code = ?"
        } else {
            ""
        };
        let query = format!(
            "select
               tasks.code as task_code,
               tasks_transformers.sort,
               transformers.code as transformer_code,
               sources.kind as source_repository_kind,
               sources.code as source_repository_code,
               targets.kind as target_repository_kind,
               targets.code as target_repository_code,
               storages.code as target_storage_code,
               transformers.script_file
             from tasks_transformers
             inner join tasks on tasks_transformers.task_id = tasks.id
             inner join transformers on tasks_transformers.transformer_id = transformers.id
             inner join repositories as sources on transformers.source_id = sources.id
             inner join storages on transformers.target_id = storages.id
             inner join repositories as targets on storages.repository_id = targets.id
             {filter}
             order by tasks.code, tasks_transformers.sort"
        );

        let mut query = diesel::sql_query(query).into_boxed::<Sqlite>();
        if let Some(task_code) = task_code {
            query = query.bind::<Text, _>(task_code.to_string());
        }
        query.load(conn)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        connection::test_utils::fresh_store,
        models::{NewRepository, NewStorage, NewTransformer},
        repository::{Repositories, Storages, Transformers},
    };

    fn seed(conn: &mut SqliteConnection, transformers: usize) -> (i32, Vec<i32>) {
        let repository = Repositories::insert(
            conn,
            &NewRepository {
                kind: "sqlite",
                code: "db",
                properties: json!({"file": "/tmp/db.db"}),
            },
        )
        .unwrap();
        let storage = Storages::insert(
            conn,
            &NewStorage {
                repository_id: repository.id,
                code: "t",
                properties: json!({"table": "t"}),
            },
        )
        .unwrap();
        let ids = (0..transformers)
            .map(|i| {
                Transformers::insert(
                    conn,
                    &NewTransformer {
                        code: &format!("m{i}"),
                        source_id: repository.id,
                        target_id: storage.id,
                        script_file: "/tmp/m.sql",
                    },
                )
                .unwrap()
                .id
            })
            .collect();
        let task = Tasks::insert(conn, &NewTask { code: "daily" }).unwrap();
        (task.id, ids)
    }

    fn order(conn: &mut SqliteConnection, task_id: i32) -> Vec<(i32, i32)> {
        TaskTransformers::list_by_task(conn, task_id)
            .unwrap()
            .into_iter()
            .map(|binding| (binding.sort, binding.transformer_id))
            .collect()
    }

    #[test]
    fn test_bind_inserts_at_position() {
        let (_dir, store) = fresh_store();
        let mut conn = store.connect().unwrap();
        let (task, ids) = seed(&mut conn, 4);

        assert_eq!(TaskTransformers::bind(&mut conn, task, ids[0], None).unwrap(), 1);
        assert_eq!(TaskTransformers::bind(&mut conn, task, ids[1], Some(1)).unwrap(), 1);
        assert_eq!(TaskTransformers::bind(&mut conn, task, ids[2], Some(2)).unwrap(), 2);
        // out of range appends
        assert_eq!(TaskTransformers::bind(&mut conn, task, ids[3], Some(9)).unwrap(), 4);

        assert_eq!(
            order(&mut conn, task),
            vec![(1, ids[1]), (2, ids[2]), (3, ids[0]), (4, ids[3])]
        );
        assert_eq!(
            TaskTransformers::transformer_codes(&mut conn, task).unwrap(),
            vec!["m1", "m2", "m0", "m3"]
        );
    }

    #[test]
    fn test_unbind_compacts_order() {
        let (_dir, store) = fresh_store();
        let mut conn = store.connect().unwrap();
        let (task, ids) = seed(&mut conn, 3);
        for id in &ids {
            TaskTransformers::bind(&mut conn, task, *id, Some(0)).unwrap();
        }

        assert_eq!(TaskTransformers::unbind(&mut conn, task, ids[1]).unwrap(), Some(2));
        assert_eq!(order(&mut conn, task), vec![(1, ids[0]), (2, ids[2])]);
        assert_eq!(TaskTransformers::unbind(&mut conn, task, ids[1]).unwrap(), None);
    }

    #[test]
    fn test_list_projections() {
        let (_dir, store) = fresh_store();
        let mut conn = store.connect().unwrap();
        let (task, ids) = seed(&mut conn, 2);
        TaskTransformers::bind(&mut conn, task, ids[0], None).unwrap();
        TaskTransformers::bind(&mut conn, task, ids[1], None).unwrap();

        let tasks = Tasks::list(&mut conn).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].transformers, 2);

        let bindings = TaskTransformers::list(&mut conn, Some("daily")).unwrap();
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[1].transformer_code, "m1");
        assert_eq!(bindings[1].target_storage_code, "t");
        assert!(TaskTransformers::list(&mut conn, Some("weekly")).unwrap().is_empty());

        let transformers = Transformers::list(&mut conn, None, None, None, None, None).unwrap();
        assert_eq!(transformers[0].tasks, 1);
        let filtered =
            Transformers::list(&mut conn, Some("sqlite"), Some("db"), None, None, Some("t")).unwrap();
        assert_eq!(filtered.len(), 2);
    }
}

use diesel::prelude::*;

use crate::schema::{tasks, tasks_transformers};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Task {
    pub id: i32,
    pub code: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Insertable)]
#[diesel(table_name = tasks)]
pub struct NewTask<'a> {
    pub code: &'a str,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks_transformers)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TaskTransformer {
    pub task_id: i32,
    pub transformer_id: i32,
    pub sort: i32,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Insertable)]
#[diesel(table_name = tasks_transformers)]
pub struct NewTaskTransformer {
    pub task_id: i32,
    pub transformer_id: i32,
    pub sort: i32,
}

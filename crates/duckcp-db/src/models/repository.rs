use diesel::prelude::*;
use serde_json::Value;

use crate::schema::{repositories, storages};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = repositories)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Repository {
    pub id: i32,
    pub kind: String,
    pub code: String,
    pub properties: Value,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Insertable)]
#[diesel(table_name = repositories)]
pub struct NewRepository<'a> {
    pub kind: &'a str,
    pub code: &'a str,
    pub properties: Value,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = storages)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Storage {
    pub id: i32,
    pub repository_id: i32,
    pub code: String,
    pub properties: Value,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Insertable)]
#[diesel(table_name = storages)]
pub struct NewStorage<'a> {
    pub repository_id: i32,
    pub code: &'a str,
    pub properties: Value,
}

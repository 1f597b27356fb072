use diesel::prelude::*;

use crate::schema::transformers;

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = transformers)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Transformer {
    pub id: i32,
    pub code: String,
    pub source_id: i32,
    pub target_id: i32,
    pub script_file: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Insertable)]
#[diesel(table_name = transformers)]
pub struct NewTransformer<'a> {
    pub code: &'a str,
    pub source_id: i32,
    pub target_id: i32,
    pub script_file: &'a str,
}

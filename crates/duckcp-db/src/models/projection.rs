//! Denormalized rows returned by the list queries.

use diesel::{
    sql_types::{BigInt, Integer, Text},
    QueryableByName,
};

#[derive(Debug, Clone, QueryableByName)]
pub struct RepositoryProjection {
    #[diesel(sql_type = Text)]
    pub kind: String,
    #[diesel(sql_type = Text)]
    pub code: String,
    #[diesel(sql_type = BigInt)]
    pub storages: i64,
    #[diesel(sql_type = BigInt)]
    pub transformers: i64,
}

#[derive(Debug, Clone, QueryableByName)]
pub struct StorageProjection {
    #[diesel(sql_type = Text)]
    pub repository_kind: String,
    #[diesel(sql_type = Text)]
    pub repository_code: String,
    #[diesel(sql_type = Text)]
    pub code: String,
    #[diesel(sql_type = BigInt)]
    pub transformers: i64,
}

#[derive(Debug, Clone, QueryableByName)]
pub struct TransformerProjection {
    #[diesel(sql_type = Text)]
    pub code: String,
    #[diesel(sql_type = Text)]
    pub source_repository_kind: String,
    #[diesel(sql_type = Text)]
    pub source_repository_code: String,
    #[diesel(sql_type = Text)]
    pub target_repository_kind: String,
    #[diesel(sql_type = Text)]
    pub target_repository_code: String,
    #[diesel(sql_type = Text)]
    pub target_storage_code: String,
    #[diesel(sql_type = Text)]
    pub script_file: String,
    #[diesel(sql_type = BigInt)]
    pub tasks: i64,
}

#[derive(Debug, Clone, QueryableByName)]
pub struct TaskProjection {
    #[diesel(sql_type = Text)]
    pub code: String,
    #[diesel(sql_type = BigInt)]
    pub transformers: i64,
}

#[derive(Debug, Clone, QueryableByName)]
pub struct TaskTransformerProjection {
    #[diesel(sql_type = Text)]
    pub task_code: String,
    #[diesel(sql_type = Integer)]
    pub sort: i32,
    #[diesel(sql_type = Text)]
    pub transformer_code: String,
    #[diesel(sql_type = Text)]
    pub source_repository_kind: String,
    #[diesel(sql_type = Text)]
    pub source_repository_code: String,
    #[diesel(sql_type = Text)]
    pub target_repository_kind: String,
    #[diesel(sql_type = Text)]
    pub target_repository_code: String,
    #[diesel(sql_type = Text)]
    pub target_storage_code: String,
    #[diesel(sql_type = Text)]
    pub script_file: String,
}

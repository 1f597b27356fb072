use diesel::{prelude::*, sqlite::Sqlite};
use serde_json::Value;

use crate::schema::snapshots;

/// Last synced state of a diff-synced storage.
#[derive(Debug, Clone, Selectable)]
#[diesel(table_name = snapshots)]
pub struct Snapshot {
    pub storage_id: i32,
    pub checksum: String,
    /// Remote identifiers of the records currently in the storage.
    pub records: Vec<String>,
    pub created_at: String,
}

impl Queryable<snapshots::SqlType, Sqlite> for Snapshot {
    type Row = (i32, String, Value, String);

    fn build(row: Self::Row) -> diesel::deserialize::Result<Self> {
        let records = serde_json::from_value(row.2)?;
        Ok(Self {
            storage_id: row.0,
            checksum: row.1,
            records,
            created_at: row.3,
        })
    }
}

#[derive(Insertable)]
#[diesel(table_name = snapshots)]
pub struct NewSnapshot<'a> {
    pub storage_id: i32,
    pub checksum: &'a str,
    pub records: Value,
    pub created_at: String,
}

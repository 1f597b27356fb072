use diesel::prelude::*;
use serde_json::Value;

use crate::{
    models::{timestamp, NewSnapshot, Snapshot},
    schema::snapshots,
};

pub struct Snapshots;

impl Snapshots {
    pub fn find_by_storage(
        conn: &mut SqliteConnection,
        storage_id: i32,
    ) -> QueryResult<Option<Snapshot>> {
        snapshots::table
            .find(storage_id)
            .select(Snapshot::as_select())
            .first(conn)
            .optional()
    }

    /// Replaces the snapshot of a storage.
    pub fn replace(
        conn: &mut SqliteConnection,
        storage_id: i32,
        checksum: &str,
        records: &[String],
    ) -> QueryResult<usize> {
        let records = Value::from(records.to_vec());
        diesel::replace_into(snapshots::table)
            .values(NewSnapshot {
                storage_id,
                checksum,
                records,
                created_at: timestamp(),
            })
            .execute(conn)
    }

    pub fn delete_by_storage(conn: &mut SqliteConnection, storage_id: i32) -> QueryResult<usize> {
        diesel::delete(snapshots::table.find(storage_id)).execute(conn)
    }
}

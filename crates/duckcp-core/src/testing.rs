//! Test doubles shared by the unit tests of this crate.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use chrono::{Duration, Utc};
use duckcp_config::config::Config;
use duckcp_db::{
    models::{NewRepository, NewStorage, Repository, Storage},
    repository::{Repositories, Storages},
    CatalogStore,
};
use duckcp_remote::{BitableApi, IssuedToken, Record, RemoteError};
use serde_json::{json, Map, Value as JsonValue};
use tempfile::TempDir;

use crate::context::DuckcpContext;

type TableKey = (String, String);

/// In-memory bitable that counts every call.
#[derive(Default)]
pub struct MockBitable {
    tables: Mutex<HashMap<TableKey, Vec<Record>>>,
    next_id: AtomicUsize,
    pub token_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    /// Makes every batch create fail with an API error.
    pub fail_creates: AtomicBool,
}

impl MockBitable {
    fn key(document: &str, table: &str) -> TableKey {
        (document.to_string(), table.to_string())
    }

    fn issue_id(&self) -> String {
        format!("rec-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn seed(&self, document: &str, table: &str, rows: Vec<JsonValue>) {
        let records: Vec<Record> = rows
            .into_iter()
            .map(|row| {
                Record {
                    record_id: self.issue_id(),
                    fields: row.as_object().cloned().unwrap_or_default(),
                }
            })
            .collect();
        self.tables
            .lock()
            .unwrap()
            .entry(Self::key(document, table))
            .or_default()
            .extend(records);
    }

    pub fn records(&self, document: &str, table: &str) -> Vec<Record> {
        self.tables
            .lock()
            .unwrap()
            .get(&Self::key(document, table))
            .cloned()
            .unwrap_or_default()
    }

    pub fn reset_calls(&self) {
        for counter in [
            &self.token_calls,
            &self.list_calls,
            &self.create_calls,
            &self.delete_calls,
        ] {
            counter.store(0, Ordering::SeqCst);
        }
    }
}

impl BitableApi for MockBitable {
    fn tenant_access_token(
        &self,
        app_id: &str,
        _app_secret: &str,
    ) -> duckcp_remote::Result<IssuedToken> {
        self.token_calls.fetch_add(1, Ordering::SeqCst);
        Ok(IssuedToken {
            access_token: format!("token-{app_id}"),
            expired_at: Utc::now() + Duration::hours(2),
        })
    }

    fn list_records(
        &self,
        _token: &str,
        document: &str,
        table: &str,
    ) -> duckcp_remote::Result<Vec<Record>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.records(document, table))
    }

    fn batch_create(
        &self,
        _token: &str,
        document: &str,
        table: &str,
        records: &[Map<String, JsonValue>],
    ) -> duckcp_remote::Result<Vec<String>> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(RemoteError::Api {
                api: "batch_create_records".into(),
                code: 1254291,
                msg: "WriteConflict".into(),
            });
        }
        let created: Vec<Record> = records
            .iter()
            .map(|fields| {
                Record {
                    record_id: self.issue_id(),
                    fields: fields.clone(),
                }
            })
            .collect();
        let ids = created.iter().map(|r| r.record_id.clone()).collect();
        self.tables
            .lock()
            .unwrap()
            .entry(Self::key(document, table))
            .or_default()
            .extend(created);
        Ok(ids)
    }

    fn batch_delete(
        &self,
        _token: &str,
        document: &str,
        table: &str,
        record_ids: &[String],
    ) -> duckcp_remote::Result<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        let mut tables = self.tables.lock().unwrap();
        let records = tables.entry(Self::key(document, table)).or_default();
        if record_ids
            .iter()
            .any(|id| !records.iter().any(|r| &r.record_id == id))
        {
            return Err(RemoteError::Api {
                api: "batch_delete_records".into(),
                code: 1254043,
                msg: "RecordIdNotFound".into(),
            });
        }
        records.retain(|r| !record_ids.contains(&r.record_id));
        Ok(())
    }
}

/// A fresh catalog plus a context wired to a [`MockBitable`].
pub struct TestEnv {
    pub dir: TempDir,
    pub ctx: DuckcpContext,
    pub api: Arc<MockBitable>,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let catalog = CatalogStore::new(dir.path().join("catalog.db"));
        catalog.create(false).unwrap();
        let api = Arc::new(MockBitable::default());
        let ctx = DuckcpContext::with_parts(Config::default(), catalog, api.clone());
        Self { dir, ctx, api }
    }

    pub fn repository(&self, code: &str, kind: &str, properties: JsonValue) -> Repository {
        self.ctx
            .catalog()
            .with_conn(|conn| {
                Repositories::insert(
                    conn,
                    &NewRepository {
                        kind,
                        code,
                        properties,
                    },
                )
            })
            .unwrap()
    }

    pub fn storage(&self, repository: &Repository, code: &str, properties: JsonValue) -> Storage {
        self.ctx
            .catalog()
            .with_conn(|conn| {
                Storages::insert(
                    conn,
                    &NewStorage {
                        repository_id: repository.id,
                        code,
                        properties,
                    },
                )
            })
            .unwrap()
    }

    /// A bitable repository with one storage per `(code, document, table)`.
    pub fn bitable_repository(&self, code: &str, storages: &[(&str, &str, &str)]) -> Repository {
        let repository = self.repository(
            code,
            "bitable",
            json!({"access_key": "app", "access_secret": "secret"}),
        );
        for (storage, document, table) in storages {
            self.storage(
                &repository,
                storage,
                json!({"document": document, "table": table}),
            );
        }
        repository
    }

    pub fn find_storage(&self, repository: &str, code: &str) -> Storage {
        self.ctx
            .catalog()
            .with_conn(|conn| Storages::find_by_code(conn, repository, code))
            .unwrap()
            .unwrap()
    }

    pub fn path(&self, name: &str) -> String {
        self.dir.path().join(name).to_string_lossy().into_owned()
    }
}

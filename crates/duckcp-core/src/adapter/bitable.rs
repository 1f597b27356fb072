use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use duckcp_db::{models::Repository, repository::Storages};
use duckcp_remote::BitableApi;
use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use super::{duckdb::DuckDbConnection, Connection};
use crate::{
    context::DuckcpContext,
    credential::Authenticator,
    error::{DuckcpError, DuckcpResult},
    properties::get_str,
    sql::{referenced_tables, Dialect},
    value::{Dataset, Value},
};

struct RemoteTable {
    document: String,
    table: String,
}

/// Bitable tables exposed as relations of an in-memory DuckDB session.
///
/// Before each statement the referenced storages that are not loaded yet are fetched and
/// registered under their storage code. Writes only change the local copy.
pub struct BitableConnection {
    engine: DuckDbConnection,
    api: Arc<dyn BitableApi>,
    authenticator: Authenticator,
    tables: HashMap<String, RemoteTable>,
    loaded: HashSet<String>,
}

impl BitableConnection {
    pub fn open(ctx: &DuckcpContext, repository: &Repository) -> DuckcpResult<Self> {
        let credential = |key: &str| {
            get_str(&repository.properties, key).ok_or_else(|| {
                DuckcpError::Validation(format!(
                    "bitable repository missing `--{}`",
                    key.replace('_', "-")
                ))
            })
        };
        let authenticator =
            ctx.bitable_authenticator(credential("access_key")?, credential("access_secret")?);

        let storages = ctx
            .catalog()
            .with_conn(|conn| Storages::list_by_repository(conn, repository.id))?;
        let tables: HashMap<String, RemoteTable> = storages
            .into_iter()
            .filter_map(|storage| {
                let document = get_str(&storage.properties, "document")?.to_string();
                let table = get_str(&storage.properties, "table")?.to_string();
                Some((storage.code, RemoteTable { document, table }))
            })
            .collect();
        debug!(repository = %repository.code, tables = tables.len(), "bitable tables mapped");

        Ok(Self {
            engine: DuckDbConnection::in_memory()?,
            api: ctx.bitable().clone(),
            authenticator,
            tables,
            loaded: HashSet::new(),
        })
    }

    fn prepare(&mut self, sql: &str) -> DuckcpResult<()> {
        for name in referenced_tables(sql)? {
            if self.loaded.contains(&name) {
                continue;
            }
            let Some(remote) = self.tables.get(&name) else {
                continue;
            };

            let token = self.authenticator.access_token()?;
            let records: Vec<Map<String, JsonValue>> = self
                .api
                .list_records(&token, &remote.document, &remote.table)?
                .into_iter()
                .map(|record| {
                    let mut row = record.fields;
                    row.insert("id".into(), JsonValue::String(record.record_id));
                    row
                })
                .collect();

            let dataset = Dataset::from_records(&["id"], &records);
            self.engine.register(&name, &dataset)?;
            debug!(table = %name, records = dataset.len(), "loaded bitable table");
            self.loaded.insert(name);
        }
        Ok(())
    }
}

impl Connection for BitableConnection {
    fn dialect(&self) -> Dialect {
        Dialect::DuckDb
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> DuckcpResult<Dataset> {
        self.prepare(sql)?;
        self.engine.query(sql, params)
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> DuckcpResult<usize> {
        self.prepare(sql)?;
        self.engine.execute(sql, params)
    }

    fn execute_many(&mut self, sql: &str, rows: &[Vec<Value>]) -> DuckcpResult<usize> {
        self.prepare(sql)?;
        self.engine.execute_many(sql, rows)
    }
}

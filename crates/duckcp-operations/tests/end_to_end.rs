use std::fs;

use duckcp_config::config::Config;
use duckcp_core::{
    adapter::{Connection, SqliteConnection},
    DuckcpContext, DuckcpError, Value,
};
use duckcp_operations::{
    meta::meta_create,
    repository::{repository_create, repository_execute},
    storage::storage_create,
    task::{task_bind, task_create, task_execute},
    transformer::{transformer_create, transformer_execute},
    Properties,
};
use serde_json::{json, Value as JsonValue};
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
    ctx: DuckcpContext,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let catalog = dir.path().join("configuration.db");
        let config = Config::default().with_catalog(catalog.to_string_lossy());
        let ctx = DuckcpContext::new(config).unwrap();
        assert!(meta_create(&ctx, false).unwrap());
        Self { dir, ctx }
    }

    fn path(&self, name: &str) -> String {
        self.dir.path().join(name).to_string_lossy().into_owned()
    }

    fn sqlite(&self, name: &str) -> SqliteConnection {
        SqliteConnection::open(Some(&self.path(name))).unwrap()
    }

    fn script(&self, name: &str, sql: &str) -> String {
        let path = self.path(name);
        fs::write(&path, sql).unwrap();
        path
    }
}

fn props(value: JsonValue) -> Properties {
    value.as_object().cloned().unwrap()
}

fn seed_source(ws: &Workspace) {
    let mut source = ws.sqlite("a.db");
    source
        .execute("create table t (id integer, name text)", &[])
        .unwrap();
    source
        .execute("insert into t values (1, 'a'), (2, 'b')", &[])
        .unwrap();
}

#[test]
fn test_transformer_copies_between_sqlite_files() {
    let ws = Workspace::new();
    seed_source(&ws);
    let mut target = ws.sqlite("b.db");
    target
        .execute("create table t2 (id integer, name text)", &[])
        .unwrap();
    target
        .execute("insert into t2 values (7, 'stale'), (8, 'stale'), (9, 'stale')", &[])
        .unwrap();

    repository_create(&ws.ctx, "src", "sqlite", props(json!({"file": ws.path("a.db")}))).unwrap();
    repository_create(&ws.ctx, "out", "sqlite", props(json!({"file": ws.path("b.db")}))).unwrap();
    storage_create(&ws.ctx, "out", "dst", props(json!({"table": "t2"}))).unwrap();
    let script = ws.script("m.sql", "select * from t");
    transformer_create(&ws.ctx, "m", "src", "out", "dst", &script).unwrap();

    transformer_execute(&ws.ctx, "m").unwrap();

    let rows = target
        .query("select id, name from t2 order by id", &[])
        .unwrap()
        .rows;
    assert_eq!(
        rows,
        vec![
            vec![Value::Integer(1), Value::from("a")],
            vec![Value::Integer(2), Value::from("b")],
        ]
    );

    let dataset = repository_execute(&ws.ctx, "out", "select count(*) as n from t2").unwrap();
    assert_eq!(dataset.rows, vec![vec![Value::Integer(2)]]);
}

#[test]
fn test_task_exports_and_snapshots() {
    let ws = Workspace::new();
    seed_source(&ws);

    repository_create(&ws.ctx, "src", "sqlite", props(json!({"file": ws.path("a.db")}))).unwrap();
    repository_create(
        &ws.ctx,
        "files",
        "file",
        props(json!({"folder": ws.path("exports")})),
    )
    .unwrap();
    repository_create(
        &ws.ctx,
        "lake",
        "duckdb",
        props(json!({"file": ws.path("lake.duckdb")})),
    )
    .unwrap();
    storage_create(
        &ws.ctx,
        "files",
        "csv",
        props(json!({"file": "daily/t.csv", "format": "csv", "header": true})),
    )
    .unwrap();
    storage_create(&ws.ctx, "lake", "copy", props(json!({"table": "t_copy"}))).unwrap();

    let script = ws.script("all.sql", "select id, name from t order by id");
    transformer_create(&ws.ctx, "to-csv", "src", "files", "csv", &script).unwrap();
    transformer_create(&ws.ctx, "to-lake", "src", "lake", "copy", &script).unwrap();
    task_create(&ws.ctx, "nightly").unwrap();
    task_bind(&ws.ctx, "nightly", "to-lake", None).unwrap();
    task_bind(&ws.ctx, "nightly", "to-csv", Some(1)).unwrap();

    task_execute(&ws.ctx, "nightly").unwrap();

    let csv = fs::read_to_string(ws.path("exports/daily/t.csv")).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines, vec!["id,name", "1,a", "2,b"]);

    let dataset = repository_execute(&ws.ctx, "lake", "select count(*) as n from t_copy").unwrap();
    assert_eq!(dataset.rows, vec![vec![Value::Integer(2)]]);
}

#[test]
fn test_task_reports_failing_transformer() {
    let ws = Workspace::new();
    seed_source(&ws);

    repository_create(&ws.ctx, "src", "sqlite", props(json!({"file": ws.path("a.db")}))).unwrap();
    repository_create(&ws.ctx, "out", "sqlite", props(json!({"file": ws.path("b.db")}))).unwrap();
    storage_create(&ws.ctx, "out", "dst", props(json!({"table": "t2"}))).unwrap();
    transformer_create(&ws.ctx, "ghost", "src", "out", "dst", &ws.path("ghost.sql")).unwrap();
    task_create(&ws.ctx, "nightly").unwrap();
    task_bind(&ws.ctx, "nightly", "ghost", None).unwrap();

    match task_execute(&ws.ctx, "nightly").unwrap_err() {
        DuckcpError::TaskStepFailed {
            transformer,
            source,
            ..
        } => {
            assert_eq!(transformer, "ghost");
            assert!(matches!(*source, DuckcpError::NotFound(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
}

use duckcp_db::models::{Repository, Storage};
use tracing::{debug, info};

use super::target_table;
use crate::{
    adapter::{self, Statement},
    context::DuckcpContext,
    error::DuckcpResult,
    sql,
};

/// Replaces the content of a relational table: `DELETE` everything, then insert every row.
///
/// The delete and the inserts are separate steps; re-running after a failure converges.
pub(super) fn overwrite(
    ctx: &DuckcpContext,
    statement: Statement,
    repository: &Repository,
    storage: &Storage,
) -> DuckcpResult<()> {
    let table = target_table(storage)?;
    let dataset = statement.execute()?;

    let mut conn = adapter::connect(ctx, repository)?;
    let dialect = conn.dialect();

    let delete = sql::Statement::DeleteAll {
        table: table.clone(),
    }
    .render(dialect)?;
    debug!(sql = %delete, "clearing table");
    conn.execute(&delete, &[])?;

    if dataset.is_empty() {
        info!("cleared table {}, no rows to insert", table.name);
        return Ok(());
    }

    let insert = sql::Statement::InsertInto {
        table,
        columns: dataset.columns.clone(),
    }
    .render(dialect)?;
    debug!(sql = %insert, rows = dataset.len(), "inserting rows");
    let inserted = conn.execute_many(&insert, &dataset.rows)?;
    info!("inserted {inserted} rows into storage {}", storage.code);

    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{
        adapter::{Connection, SqliteConnection, Statement},
        testing::TestEnv,
        transform::transform,
        value::Value,
    };

    fn source(env: &TestEnv, rows: &[(i64, &str)]) -> Statement {
        let file = env.path("a.db");
        let mut conn = SqliteConnection::open(Some(&file)).unwrap();
        conn.execute("create table if not exists t (id integer, name text)", &[])
            .unwrap();
        conn.execute("delete from t", &[]).unwrap();
        for (id, name) in rows {
            conn.execute(
                "insert into t values (?, ?)",
                &[Value::Integer(*id), Value::from(*name)],
            )
            .unwrap();
        }
        Statement::new(Box::new(conn), "select * from t order by id")
    }

    fn target_rows(env: &TestEnv) -> Vec<Vec<Value>> {
        let mut conn = SqliteConnection::open(Some(&env.path("b.db"))).unwrap();
        conn.query("select id, name from t2 order by id", &[])
            .unwrap()
            .rows
    }

    #[test]
    fn test_overwrite_replaces_prior_rows() {
        let env = TestEnv::new();
        let out = env.repository("out", "sqlite", json!({"file": env.path("b.db")}));
        let storage = env.storage(&out, "dst", json!({"table": "t2"}));

        let mut target = SqliteConnection::open(Some(&env.path("b.db"))).unwrap();
        target
            .execute("create table t2 (id integer, name text)", &[])
            .unwrap();
        for id in 0..5 {
            target
                .execute("insert into t2 values (?, 'old')", &[Value::Integer(100 + id)])
                .unwrap();
        }
        drop(target);

        transform(&env.ctx, source(&env, &[(1, "a"), (2, "b")]), &out, &storage).unwrap();
        assert_eq!(
            target_rows(&env),
            vec![
                vec![Value::Integer(1), Value::from("a")],
                vec![Value::Integer(2), Value::from("b")],
            ]
        );
    }

    #[test]
    fn test_empty_result_only_clears() {
        let env = TestEnv::new();
        let out = env.repository("out", "sqlite", json!({"file": env.path("b.db")}));
        let storage = env.storage(&out, "dst", json!({"table": "t2"}));

        let mut target = SqliteConnection::open(Some(&env.path("b.db"))).unwrap();
        target
            .execute("create table t2 (id integer, name text)", &[])
            .unwrap();
        target.execute("insert into t2 values (9, 'x')", &[]).unwrap();
        drop(target);

        transform(&env.ctx, source(&env, &[]), &out, &storage).unwrap();
        assert!(target_rows(&env).is_empty());
    }
}

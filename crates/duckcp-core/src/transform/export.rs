use std::path::Path;

use duckcp_db::models::{Repository, Storage};
use duckcp_utils::fs::ensure_parent_dir;
use tracing::{debug, info};

use super::required;
use crate::{
    adapter::{Connection, DuckDbConnection, Statement},
    error::{DuckcpError, DuckcpResult},
    kind::COPY_OPTIONS,
    properties::get_str,
    sql::{self, copy_options, Dialect, TableRef},
};

/// Writes the result to a file under the repository folder with `COPY ... TO`.
pub(super) fn export(
    statement: Statement,
    repository: &Repository,
    storage: &Storage,
) -> DuckcpResult<()> {
    let folder = get_str(&repository.properties, "folder").ok_or_else(|| {
        DuckcpError::Validation(format!(
            "file repository {} missing `--folder`",
            repository.code
        ))
    })?;
    let path = Path::new(folder).join(required(storage, "file")?);
    ensure_parent_dir(&path)?;

    let dataset = statement.execute()?;

    let mut conn = DuckDbConnection::in_folder(folder)?;
    conn.register(&storage.code, &dataset)?;

    let options = storage
        .properties
        .as_object()
        .map(|properties| copy_options(properties, COPY_OPTIONS))
        .unwrap_or_default();
    let copy = sql::Statement::CopyTo {
        source: TableRef::temporary(&storage.code),
        path: path.to_string_lossy().into_owned(),
        options,
    }
    .render(Dialect::DuckDb)?;
    debug!(sql = %copy, "exporting");
    conn.execute(&copy, &[])?;

    info!("exported {} rows to {}", dataset.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::json;

    use crate::{
        adapter::{SqliteConnection, Statement},
        testing::TestEnv,
        transform::transform,
    };

    #[test]
    fn test_export_csv_into_nested_folder() {
        let env = TestEnv::new();
        let folder = env.path("exports");
        let out = env.repository("files", "file", json!({"folder": folder}));
        let storage = env.storage(
            &out,
            "people",
            json!({"file": "daily/people.csv", "format": "csv", "header": true, "delimiter": "|"}),
        );

        let statement = Statement::new(
            Box::new(SqliteConnection::open(None).unwrap()),
            "select 1 as id, 'a' as name union all select 2, 'b'",
        );
        transform(&env.ctx, statement, &out, &storage).unwrap();

        let content = fs::read_to_string(env.dir.path().join("exports/daily/people.csv")).unwrap();
        assert_eq!(content.lines().collect::<Vec<_>>(), vec!["id|name", "1|a", "2|b"]);
    }

    #[test]
    fn test_export_without_header() {
        let env = TestEnv::new();
        let out = env.repository("files", "file", json!({"folder": env.path("exports")}));
        let storage = env.storage(
            &out,
            "people",
            json!({"file": "people.csv", "format": "csv", "header": false}),
        );

        let statement = Statement::new(
            Box::new(SqliteConnection::open(None).unwrap()),
            "select 1 as id",
        );
        transform(&env.ctx, statement, &out, &storage).unwrap();

        let content = fs::read_to_string(env.dir.path().join("exports/people.csv")).unwrap();
        assert_eq!(content.trim(), "1");
    }
}

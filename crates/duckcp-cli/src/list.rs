use duckcp_core::{Dataset, Value};
use duckcp_db::models::{
    RepositoryProjection, StorageProjection, TaskProjection, TaskTransformerProjection,
    TransformerProjection,
};
use nu_ansi_term::Color::{Cyan, Green, Magenta};
use tabled::{
    builder::Builder,
    settings::{themes::BorderCorrection, Panel, Style},
};
use tracing::{info, warn};

use crate::utils::Colored;

fn render<R>(title: &str, header: &[&str], rows: R) -> String
where
    R: IntoIterator<Item = Vec<String>>,
{
    let mut builder = Builder::new();
    builder.push_record(header.iter().map(|column| column.to_string()));
    for row in rows {
        builder.push_record(row);
    }

    builder
        .build()
        .with(Panel::header(title))
        .with(Style::rounded())
        .with(BorderCorrection {})
        .to_string()
}

fn print<T, F>(title: &str, header: &[&str], items: &[T], row: F)
where
    F: Fn(&T) -> Vec<String>,
{
    if items.is_empty() {
        warn!("no {} found", title.to_lowercase());
        return;
    }
    let table = render(title, header, items.iter().map(row));
    info!(count = items.len(), "\n{table}");
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => Colored(Magenta, "NULL").to_string(),
        Value::Blob(bytes) => format!("<{} bytes>", bytes.len()),
        other => other.to_string(),
    }
}

pub fn print_repositories(repositories: &[RepositoryProjection]) {
    print(
        "Repositories",
        &["Kind", "Name", "Storages", "Transformers"],
        repositories,
        |r| {
            vec![
                r.kind.clone(),
                Colored(Cyan, &r.code).to_string(),
                r.storages.to_string(),
                r.transformers.to_string(),
            ]
        },
    );
}

pub fn print_storages(storages: &[StorageProjection]) {
    print(
        "Storages",
        &["Kind", "Repository", "Name", "Transformers"],
        storages,
        |s| {
            vec![
                s.repository_kind.clone(),
                s.repository_code.clone(),
                Colored(Cyan, &s.code).to_string(),
                s.transformers.to_string(),
            ]
        },
    );
}

pub fn print_transformers(transformers: &[TransformerProjection]) {
    print(
        "Transformers",
        &["Name", "Source", "Target", "Script", "Tasks"],
        transformers,
        |t| {
            vec![
                Colored(Cyan, &t.code).to_string(),
                format!("{}({})", t.source_repository_code, t.source_repository_kind),
                format!(
                    "{}.{}({})",
                    t.target_repository_code, t.target_storage_code, t.target_repository_kind
                ),
                t.script_file.clone(),
                t.tasks.to_string(),
            ]
        },
    );
}

pub fn print_tasks(tasks: &[TaskProjection]) {
    print("Tasks", &["Name", "Transformers"], tasks, |t| {
        vec![Colored(Cyan, &t.code).to_string(), t.transformers.to_string()]
    });
}

pub fn print_task_transformers(bindings: &[TaskTransformerProjection]) {
    print(
        "Task Transformers",
        &["Task", "Sort", "Transformer", "Source", "Target", "Script"],
        bindings,
        |b| {
            vec![
                b.task_code.clone(),
                Colored(Green, b.sort).to_string(),
                Colored(Cyan, &b.transformer_code).to_string(),
                format!("{}({})", b.source_repository_code, b.source_repository_kind),
                format!(
                    "{}.{}({})",
                    b.target_repository_code, b.target_storage_code, b.target_repository_kind
                ),
                b.script_file.clone(),
            ]
        },
    );
}

pub fn print_dataset(repository: &str, dataset: &Dataset) {
    if dataset.columns.is_empty() {
        info!("statement executed on repository ({repository})");
        return;
    }
    let header: Vec<&str> = dataset.columns.iter().map(String::as_str).collect();
    let table = render(
        &format!("{repository} ({} rows)", dataset.len()),
        &header,
        dataset
            .rows
            .iter()
            .map(|row| row.iter().map(cell).collect()),
    );
    info!(rows = dataset.len(), "\n{table}");
}

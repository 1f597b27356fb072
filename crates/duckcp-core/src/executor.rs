//! Runs transformers and tasks.

use std::{fs, path::Path};

use duckcp_db::repository::{Repositories, Storages, TaskTransformers, Tasks, Transformers};
use tracing::{debug, info};

use crate::{
    adapter::{self, Statement},
    context::DuckcpContext,
    error::{DuckcpError, DuckcpResult, ErrorContext},
    transform::transform,
};

/// Executes a transformer: runs its script on the source repository and writes the result into
/// the target storage.
pub fn execute_transformer(ctx: &DuckcpContext, code: &str) -> DuckcpResult<()> {
    let catalog = ctx.catalog();
    let transformer = catalog
        .with_conn(|conn| Transformers::find_by_code(conn, code))?
        .ok_or_else(|| DuckcpError::NotFound(format!("transformer ({code}) does not exist")))?;

    let script_file = Path::new(&transformer.script_file);
    if !script_file.is_file() {
        return Err(DuckcpError::NotFound(format!(
            "script file ({}) of transformer ({code}) does not exist",
            script_file.display()
        )));
    }
    let script = fs::read_to_string(script_file)
        .with_context(|| format!("reading script {}", script_file.display()))?;

    let (source, target, storage) = catalog.with_conn(|conn| {
        let storage = Storages::find_by_id(conn, transformer.target_id)?;
        let source = Repositories::find_by_id(conn, transformer.source_id)?;
        let target = match &storage {
            Some(storage) => Repositories::find_by_id(conn, storage.repository_id)?,
            None => None,
        };
        Ok((source, target, storage))
    })?;
    let missing = |what: &str| {
        DuckcpError::NotFound(format!("{what} of transformer ({code}) does not exist"))
    };
    let source = source.ok_or_else(|| missing("source repository"))?;
    let storage = storage.ok_or_else(|| missing("target storage"))?;
    let target = target.ok_or_else(|| missing("target repository"))?;

    debug!(
        transformer = code,
        source = %source.code,
        target = %target.code,
        storage = %storage.code,
        "executing transformer"
    );
    let connection = adapter::connect(ctx, &source)?;
    transform(ctx, Statement::new(connection, script), &target, &storage)?;

    info!(
        "migrated data from repository({}) to storage({}.{})",
        source.code, target.code, storage.code
    );
    Ok(())
}

/// Executes every transformer bound to a task in order, stopping at the first failure.
pub fn execute_task(ctx: &DuckcpContext, code: &str) -> DuckcpResult<()> {
    let task = ctx
        .catalog()
        .with_conn(|conn| Tasks::find_by_code(conn, code))?
        .ok_or_else(|| DuckcpError::NotFound(format!("task ({code}) does not exist")))?;
    let transformers = ctx
        .catalog()
        .with_conn(|conn| TaskTransformers::transformer_codes(conn, task.id))?;
    debug!(task = code, transformers = transformers.len(), "executing task");

    for transformer in transformers {
        execute_transformer(ctx, &transformer).map_err(|err| {
            DuckcpError::TaskStepFailed {
                task: code.to_string(),
                transformer: transformer.clone(),
                source: Box::new(err),
            }
        })?;
    }

    info!("task ({code}) finished");
    Ok(())
}

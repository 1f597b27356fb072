//! Tasks: ordered sequences of transformers.

use diesel::{QueryResult, SqliteConnection};
use duckcp_core::{executor, DuckcpContext, DuckcpError, DuckcpResult};
use duckcp_db::{
    models::{NewTask, Task, TaskProjection, TaskTransformerProjection},
    repository::{TaskTransformers, Tasks, Transformers},
};
use tracing::{debug, info};

use crate::utils::{already_exists, not_found, require};

/// Removes a transformer from every task it belongs to, keeping each task's order dense.
pub(crate) fn unbind_everywhere(
    conn: &mut SqliteConnection,
    transformer_id: i32,
) -> QueryResult<()> {
    for task_id in TaskTransformers::task_ids_by_transformer(conn, transformer_id)? {
        TaskTransformers::unbind(conn, task_id, transformer_id)?;
    }
    Ok(())
}

fn find_existing(ctx: &DuckcpContext, code: &str) -> DuckcpResult<Task> {
    task_find(ctx, code)?.ok_or_else(|| not_found("task", code))
}

pub fn task_create(ctx: &DuckcpContext, code: &str) -> DuckcpResult<Task> {
    let code = require(code, "task name")?;
    let task = ctx.catalog().transaction(|conn| {
        if Tasks::find_by_code(conn, code)?.is_some() {
            return Ok(None);
        }
        Tasks::insert(conn, &NewTask { code }).map(Some)
    })?;
    let task = task.ok_or_else(|| already_exists("task", code))?;
    info!("created task ({code})");
    Ok(task)
}

pub fn task_delete(ctx: &DuckcpContext, code: &str) -> DuckcpResult<()> {
    let code = require(code, "task name")?;
    let deleted = ctx
        .catalog()
        .with_conn(|conn| Tasks::delete_by_code(conn, code))?;
    if deleted == 0 {
        return Err(not_found("task", code));
    }
    info!("deleted task ({code})");
    Ok(())
}

pub fn task_find(ctx: &DuckcpContext, code: &str) -> DuckcpResult<Option<Task>> {
    Ok(ctx
        .catalog()
        .with_conn(|conn| Tasks::find_by_code(conn, code))?)
}

pub fn task_list(ctx: &DuckcpContext) -> DuckcpResult<Vec<TaskProjection>> {
    Ok(ctx.catalog().with_conn(Tasks::list)?)
}

/// Binds a transformer to a task and returns the position it got.
///
/// `sort` inserts at that 1-based position and shifts later transformers down; a missing or
/// out-of-range position appends.
pub fn task_bind(
    ctx: &DuckcpContext,
    code: &str,
    transformer: &str,
    sort: Option<i32>,
) -> DuckcpResult<i32> {
    let code = require(code, "task name")?;
    let transformer_code = require(transformer, "transformer name")?;
    let task = find_existing(ctx, code)?;

    let sort = ctx.catalog().transaction(|conn| {
        let Some(transformer) = Transformers::find_by_code(conn, transformer_code)? else {
            return Ok(Err(not_found("transformer", transformer_code)));
        };
        if TaskTransformers::find(conn, task.id, transformer.id)?.is_some() {
            return Ok(Err(DuckcpError::Validation(format!(
                "transformer ({transformer_code}) is already bound to task ({code})"
            ))));
        }
        TaskTransformers::bind(conn, task.id, transformer.id, sort).map(Ok)
    })??;

    info!("bound transformer ({transformer_code}) to task ({code}) at {sort}");
    Ok(sort)
}

pub fn task_unbind(ctx: &DuckcpContext, code: &str, transformer: &str) -> DuckcpResult<()> {
    let code = require(code, "task name")?;
    let transformer_code = require(transformer, "transformer name")?;
    let task = find_existing(ctx, code)?;

    let removed = ctx.catalog().transaction(|conn| {
        let Some(transformer) = Transformers::find_by_code(conn, transformer_code)? else {
            return Ok(Err(not_found("transformer", transformer_code)));
        };
        TaskTransformers::unbind(conn, task.id, transformer.id).map(Ok)
    })??;

    match removed {
        Some(sort) => {
            debug!(task = code, transformer = transformer_code, sort, "unbound");
            info!("unbound transformer ({transformer_code}) from task ({code})");
            Ok(())
        }
        None => {
            Err(DuckcpError::Validation(format!(
                "transformer ({transformer_code}) is not bound to task ({code})"
            )))
        }
    }
}

/// Lists bindings in execution order, for one task or for all of them.
pub fn task_transformer_list(
    ctx: &DuckcpContext,
    code: Option<&str>,
) -> DuckcpResult<Vec<TaskTransformerProjection>> {
    if let Some(code) = code {
        find_existing(ctx, code)?;
    }
    Ok(ctx
        .catalog()
        .with_conn(|conn| TaskTransformers::list(conn, code))?)
}

/// Runs the transformers of a task in order, stopping at the first failure.
pub fn task_execute(ctx: &DuckcpContext, code: &str) -> DuckcpResult<()> {
    executor::execute_task(ctx, require(code, "task name")?)
}

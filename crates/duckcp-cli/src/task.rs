use duckcp_core::{DuckcpContext, DuckcpResult};
use duckcp_operations::task;

use crate::{
    cli::TaskCommand,
    list::{print_task_transformers, print_tasks},
    utils::confirm_cascade,
};

pub fn handle(ctx: &DuckcpContext, command: TaskCommand) -> DuckcpResult<()> {
    match command {
        TaskCommand::Create { name } => {
            task::task_create(ctx, &name)?;
        }
        TaskCommand::Delete { name, yes } => {
            let bound = i64::try_from(task::task_transformer_list(ctx, Some(&name))?.len())
                .unwrap_or(i64::MAX);
            let subject = format!("task ({name})");
            if confirm_cascade(&subject, &[(bound, "bound transformers")], yes)? {
                task::task_delete(ctx, &name)?;
            }
        }
        TaskCommand::List => print_tasks(&task::task_list(ctx)?),
        TaskCommand::Bind {
            name,
            transformer,
            sort,
        } => {
            task::task_bind(ctx, &name, &transformer, sort)?;
        }
        TaskCommand::Unbind { name, transformer } => {
            task::task_unbind(ctx, &name, &transformer)?;
        }
        TaskCommand::Transformers { name } => {
            print_task_transformers(&task::task_transformer_list(ctx, name.as_deref())?);
        }
        TaskCommand::Execute { names } => {
            for name in names {
                task::task_execute(ctx, &name)?;
            }
        }
    }
    Ok(())
}

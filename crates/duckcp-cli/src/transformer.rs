use duckcp_core::{DuckcpContext, DuckcpResult};
use duckcp_operations::{transformer, TransformerChanges, TransformerFilter};

use crate::{cli::TransformerCommand, list::print_transformers};

pub fn handle(ctx: &DuckcpContext, command: TransformerCommand) -> DuckcpResult<()> {
    match command {
        TransformerCommand::Create {
            name,
            source,
            target,
            storage,
            file,
        } => {
            transformer::transformer_create(ctx, &name, &source, &target, &storage, &file)?;
        }
        TransformerCommand::Update {
            name,
            source,
            target,
            storage,
            file,
        } => {
            transformer::transformer_update(
                ctx,
                &name,
                TransformerChanges {
                    source,
                    target_repository: target,
                    target_storage: storage,
                    script_file: file,
                },
            )?;
        }
        TransformerCommand::Delete { name } => transformer::transformer_delete(ctx, &name)?,
        TransformerCommand::List {
            source_kind,
            source,
            target_kind,
            target,
            storage,
        } => {
            let filter = TransformerFilter {
                source_kind,
                source,
                target_kind,
                target,
                storage,
            };
            print_transformers(&transformer::transformer_list(ctx, &filter)?);
        }
        TransformerCommand::Execute { names } => {
            for name in names {
                transformer::transformer_execute(ctx, &name)?;
            }
        }
    }
    Ok(())
}

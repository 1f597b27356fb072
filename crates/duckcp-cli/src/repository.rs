use std::fs;

use duckcp_core::{DuckcpContext, DuckcpResult, ErrorContext};
use duckcp_operations::{repository, Properties};
use serde_json::json;

use crate::{
    cli::{ConnectionArgs, RepositoryCommand},
    list::{print_dataset, print_repositories},
    utils::confirm_cascade,
};

impl ConnectionArgs {
    fn into_properties(self) -> Properties {
        let properties = json!({
            "host": self.host,
            "port": self.port,
            "database": self.database,
            "username": self.username,
            "password": self.password,
            "end_point": self.end_point,
            "project": self.project,
            "access_key": self.access_key,
            "access_secret": self.access_secret,
            "file": self.file,
            "folder": self.folder,
        });
        match properties {
            serde_json::Value::Object(map) => map,
            _ => Properties::new(),
        }
    }
}

pub fn handle(ctx: &DuckcpContext, command: RepositoryCommand) -> DuckcpResult<()> {
    match command {
        RepositoryCommand::Create {
            name,
            kind,
            connection,
        } => {
            repository::repository_create(ctx, &name, &kind, connection.into_properties())?;
        }
        RepositoryCommand::Update {
            name,
            kind,
            connection,
        } => {
            repository::repository_update(
                ctx,
                &name,
                kind.as_deref(),
                connection.into_properties(),
            )?;
        }
        RepositoryCommand::Delete { name, yes } => {
            let storages = repository::repository_storages(ctx, &name)?;
            let transformers = repository::repository_transformers(ctx, &name)?;
            let subject = format!("repository ({name})");
            if confirm_cascade(
                &subject,
                &[(storages, "storages"), (transformers, "transformers")],
                yes,
            )? {
                repository::repository_delete(ctx, &name)?;
            }
        }
        RepositoryCommand::List { kind } => {
            print_repositories(&repository::repository_list(ctx, kind.as_deref())?);
        }
        RepositoryCommand::Execute { name, file, sql } => {
            let sql = match (file, sql) {
                (Some(file), _) => {
                    fs::read_to_string(&file).with_context(|| format!("reading {file}"))?
                }
                (None, Some(sql)) => sql,
                (None, None) => String::new(),
            };
            let dataset = repository::repository_execute(ctx, &name, &sql)?;
            print_dataset(&name, &dataset);
        }
    }
    Ok(())
}

use duckcp_core::{DuckcpContext, DuckcpError, DuckcpResult};
use duckcp_operations::{storage, Properties};
use serde_json::{json, Value as JsonValue};

use crate::{
    cli::{MediumArgs, StorageCommand},
    list::print_storages,
    utils::confirm_cascade,
};

/// `--x/--no-x` pair: `None` when neither was given.
fn toggle(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

/// A lone switch is either set or not supplied.
fn switch(on: bool) -> Option<bool> {
    on.then_some(true)
}

fn columns(columns: Vec<String>) -> Option<Vec<String>> {
    (!columns.is_empty()).then_some(columns)
}

impl MediumArgs {
    /// Maps the flags onto the stored property names, which follow the DuckDB `COPY` options.
    fn into_properties(self) -> DuckcpResult<Properties> {
        let field_ids = self
            .field_ids
            .as_deref()
            .map(|ids| {
                serde_json::from_str::<JsonValue>(ids).map_err(|err| {
                    DuckcpError::Validation(format!("invalid `--field-ids` JSON: {err}"))
                })
            })
            .transpose()?;

        let properties = json!({
            "catalog": self.catalog,
            "schema": self.schema,
            "table": self.table,
            "document": self.document,
            "file": self.file,
            "format": self.format,
            "compression": self.compression,
            "compression_level": self.compression_level,
            "parquet_version": self.parquet_version,
            "field_ids": field_ids,
            "row_group_size": self.row_group_size,
            "row_group_size_bytes": self.row_group_size_bytes,
            "row_groups_per_file": self.row_group_per_file,
            "header": toggle(self.header, self.no_header),
            "delimiter": self.delimiter,
            "quote": self.quote_char,
            "escape": self.escape_char,
            "nullstr": self.null_literal,
            "force_quote": columns(self.force_quote),
            "prefix": self.prefix,
            "suffix": self.suffix,
            "dateformat": self.date_format,
            "timestampformat": self.timestamp_format,
            "array": toggle(self.array, self.no_array),
            "per_thread_output": switch(self.per_thread_output),
            "file_size_bytes": self.file_size_bytes,
            "partition_by": columns(self.partition_by),
            "filename_pattern": self.filename_pattern,
            "file_extension": self.file_extension,
            "write_partition_columns": switch(self.write_partition_columns),
            "use_tmp_file": switch(self.use_tmp_file),
            "overwrite": switch(self.delete_before_write),
            "overwrite_or_ignore": toggle(self.overwrite, self.no_overwrite),
            "append": toggle(self.append, self.no_append),
            "preserve_order": switch(self.preserve_order),
        });
        Ok(match properties {
            JsonValue::Object(map) => map,
            _ => Properties::new(),
        })
    }
}

pub fn handle(ctx: &DuckcpContext, command: StorageCommand) -> DuckcpResult<()> {
    match command {
        StorageCommand::Create {
            name,
            repository,
            medium,
        } => {
            storage::storage_create(ctx, &repository, &name, medium.into_properties()?)?;
        }
        StorageCommand::Update {
            name,
            repository,
            medium,
        } => {
            storage::storage_update(ctx, &repository, &name, medium.into_properties()?)?;
        }
        StorageCommand::Delete {
            name,
            repository,
            yes,
        } => {
            let transformers = storage::storage_transformers(ctx, &repository, &name)?;
            let subject = format!("storage ({repository}.{name})");
            if confirm_cascade(&subject, &[(transformers, "transformers")], yes)? {
                storage::storage_delete(ctx, &repository, &name)?;
            }
        }
        StorageCommand::List { kind, repository } => {
            print_storages(&storage::storage_list(
                ctx,
                kind.as_deref(),
                repository.as_deref(),
            )?);
        }
    }
    Ok(())
}

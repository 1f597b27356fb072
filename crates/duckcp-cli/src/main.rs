use std::path::Path;

use clap::Parser;
use cli::{Args, Commands, MetaCommand};
use duckcp_config::config::{generate_default_config, Config};
use duckcp_core::{DuckcpContext, DuckcpResult};
use duckcp_operations::meta;
use duckcp_utils::path::resolve_path;
use logging::setup_logging;
use tracing::{debug, info};
use utils::disable_color;

mod cli;
mod list;
mod logging;
mod repository;
mod storage;
mod task;
mod transformer;
mod utils;

fn load_config(config_path: Option<&Path>, catalog_file: Option<&str>) -> DuckcpResult<Config> {
    let mut config = Config::load(config_path)?;
    if let Some(catalog) = catalog_file {
        config = config.with_catalog(catalog);
    }
    debug!(catalog = ?config.catalog, "configuration loaded");
    Ok(config)
}

/// Dispatches a command. The catalog is only opened by commands that use it.
fn run(
    command: Commands,
    config_path: Option<&Path>,
    catalog_file: Option<&str>,
) -> DuckcpResult<()> {
    let config = || load_config(config_path, catalog_file);
    let context = || config().and_then(DuckcpContext::new);

    match command {
        Commands::DefConfig => {
            generate_default_config(config_path)?;
        }
        Commands::Config => {
            info!("{}", config()?.to_annotated_document()?);
        }
        Commands::Meta(MetaCommand::Create { force }) => {
            meta::meta_create(&context()?, force)?;
        }
        Commands::Meta(MetaCommand::Delete) => {
            meta::meta_delete(&context()?)?;
        }
        Commands::Repository(command) => repository::handle(&context()?, command)?,
        Commands::Storage(command) => storage::handle(&context()?, command)?,
        Commands::Transformer(command) => transformer::handle(&context()?, command)?,
        Commands::Task(command) => task::handle(&context()?, command)?,
    }
    Ok(())
}

fn handle_cli() -> DuckcpResult<()> {
    let args = Args::parse();

    setup_logging(&args);

    if args.no_color {
        disable_color();
    }

    let config_path = args.config.as_deref().map(resolve_path).transpose()?;
    run(
        args.command,
        config_path.as_deref(),
        args.catalog_file.as_deref(),
    )
}

fn main() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();

    if let Err(err) = handle_cli() {
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(1);
    }
}

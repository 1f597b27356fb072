use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand, ValueHint};

#[derive(Parser)]
#[command(
    author,
    version,
    about,
    help_template = "{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}",
    arg_required_else_help = true
)]
pub struct Args {
    /// Set output verbosity
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output logs as json
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Provide custom config file
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<String>,

    /// Use another catalog database for this invocation
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub catalog_file: Option<String>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the effective configuration
    Config,

    /// Write a default configuration file
    #[clap(name = "defconfig")]
    DefConfig,

    /// Manage the catalog database
    #[command(subcommand, arg_required_else_help = true)]
    Meta(MetaCommand),

    /// Manage repositories
    #[command(subcommand, arg_required_else_help = true)]
    #[clap(visible_alias = "repo")]
    Repository(RepositoryCommand),

    /// Manage storages within repositories
    #[command(subcommand, arg_required_else_help = true)]
    Storage(StorageCommand),

    /// Manage transformers
    #[command(subcommand, arg_required_else_help = true)]
    Transformer(TransformerCommand),

    /// Manage tasks
    #[command(subcommand, arg_required_else_help = true)]
    Task(TaskCommand),
}

#[derive(Subcommand)]
pub enum MetaCommand {
    /// Create the catalog database
    Create {
        /// Recreate the catalog if it already exists
        #[arg(short, long)]
        force: bool,
    },

    /// Delete the catalog database
    Delete,
}

/// Connection properties of a repository.
#[derive(ClapArgs, Default)]
pub struct ConnectionArgs {
    /// Server host [postgres]
    #[arg(long)]
    pub host: Option<String>,

    /// Server port [postgres]
    #[arg(long)]
    pub port: Option<u16>,

    /// Database name [postgres]
    #[arg(long)]
    pub database: Option<String>,

    /// User name [postgres]
    #[arg(long)]
    pub username: Option<String>,

    /// Password [postgres]
    #[arg(long)]
    pub password: Option<String>,

    /// Service end point [odps]
    #[arg(long)]
    pub end_point: Option<String>,

    /// Project [odps]
    #[arg(long)]
    pub project: Option<String>,

    /// Access key [odps, bitable]
    #[arg(long)]
    pub access_key: Option<String>,

    /// Access secret [odps, bitable]
    #[arg(long)]
    pub access_secret: Option<String>,

    /// Database file [sqlite, duckdb]
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub file: Option<String>,

    /// Output folder [file]
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub folder: Option<String>,
}

#[derive(Subcommand)]
pub enum RepositoryCommand {
    /// Create a repository
    #[command(arg_required_else_help = true)]
    Create {
        name: String,

        /// Repository kind
        #[arg(short, long)]
        kind: String,

        #[command(flatten)]
        connection: ConnectionArgs,
    },

    /// Update a repository; an empty value removes a property
    #[command(arg_required_else_help = true)]
    Update {
        name: String,

        /// Change the repository kind
        #[arg(short, long)]
        kind: Option<String>,

        #[command(flatten)]
        connection: ConnectionArgs,
    },

    /// Delete a repository with its storages and transformers
    #[command(arg_required_else_help = true)]
    Delete {
        name: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// List repositories
    #[clap(visible_alias = "ls")]
    List {
        /// Only list repositories of this kind
        #[arg(short, long)]
        kind: Option<String>,
    },

    /// Run a query on a repository and print the result
    #[command(arg_required_else_help = true)]
    Execute {
        name: String,

        /// Read the query from a file
        #[arg(short, long, conflicts_with = "sql", required_unless_present = "sql", value_hint = ValueHint::FilePath)]
        file: Option<String>,

        /// Query text
        #[arg(short = 'e', long)]
        sql: Option<String>,
    },
}

/// Medium properties of a storage.
#[derive(ClapArgs, Default)]
pub struct MediumArgs {
    /// Catalog [postgres, duckdb, odps]
    #[arg(long)]
    pub catalog: Option<String>,

    /// Schema [postgres, duckdb, odps, sqlite]
    #[arg(long)]
    pub schema: Option<String>,

    /// Table [postgres, duckdb, odps, sqlite, bitable]
    #[arg(long)]
    pub table: Option<String>,

    /// Bitable document [bitable]
    #[arg(long)]
    pub document: Option<String>,

    /// File name relative to the repository folder [file]
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub file: Option<String>,

    /// File format: csv, parquet or json [file]
    #[arg(long)]
    pub format: Option<String>,

    /// Compression: gzip, zstd, snappy, brotli, lz4 or lz4_raw [file]
    #[arg(long)]
    pub compression: Option<String>,

    /// Compression level [file, parquet]
    #[arg(long)]
    pub compression_level: Option<i64>,

    /// Parquet version: V1 or V2 [file, parquet]
    #[arg(long)]
    pub parquet_version: Option<String>,

    /// Field ids as JSON [file, parquet]
    #[arg(long, value_name = "JSON")]
    pub field_ids: Option<String>,

    /// Maximum rows per row group [file, parquet]
    #[arg(long)]
    pub row_group_size: Option<i64>,

    /// Maximum bytes per row group [file, parquet]
    #[arg(long)]
    pub row_group_size_bytes: Option<i64>,

    /// Maximum row groups per file [file, parquet]
    #[arg(long)]
    pub row_group_per_file: Option<i64>,

    /// Write a header line [file, csv]
    #[arg(long, overrides_with = "no_header")]
    pub header: bool,

    #[arg(long, overrides_with = "header", hide = true)]
    pub no_header: bool,

    /// Field delimiter [file, csv]
    #[arg(long)]
    pub delimiter: Option<String>,

    /// Quote character [file, csv]
    #[arg(long)]
    pub quote_char: Option<String>,

    /// Escape character [file, csv]
    #[arg(long)]
    pub escape_char: Option<String>,

    /// Literal written for nulls [file, csv]
    #[arg(long)]
    pub null_literal: Option<String>,

    /// Always quote these columns [file, csv]
    #[arg(long, value_name = "COLUMN", num_args = 1..)]
    pub force_quote: Vec<String>,

    /// Text written before the data [file, csv]
    #[arg(long)]
    pub prefix: Option<String>,

    /// Text written after the data [file, csv]
    #[arg(long)]
    pub suffix: Option<String>,

    /// Date format [file, csv, json]
    #[arg(long)]
    pub date_format: Option<String>,

    /// Timestamp format [file, csv, json]
    #[arg(long)]
    pub timestamp_format: Option<String>,

    /// Write a JSON array [file, json]
    #[arg(long, overrides_with = "no_array")]
    pub array: bool,

    #[arg(long, overrides_with = "array", hide = true)]
    pub no_array: bool,

    /// Write one file per thread [file]
    #[arg(long)]
    pub per_thread_output: bool,

    /// Maximum bytes per file [file]
    #[arg(long)]
    pub file_size_bytes: Option<i64>,

    /// Partition columns [file]
    #[arg(long, value_name = "COLUMN", num_args = 1..)]
    pub partition_by: Vec<String>,

    /// File name pattern of partitions [file]
    #[arg(long)]
    pub filename_pattern: Option<String>,

    /// File extension of partitions [file]
    #[arg(long)]
    pub file_extension: Option<String>,

    /// Keep partition columns in the files [file]
    #[arg(long)]
    pub write_partition_columns: bool,

    /// Write to a temporary file first [file]
    #[arg(long)]
    pub use_tmp_file: bool,

    /// Remove the whole output directory before writing [file]
    #[arg(long)]
    pub delete_before_write: bool,

    /// Overwrite existing partition files [file]
    #[arg(long, overrides_with = "no_overwrite")]
    pub overwrite: bool,

    #[arg(long, overrides_with = "overwrite", hide = true)]
    pub no_overwrite: bool,

    /// Append to existing partition files [file]
    #[arg(long, overrides_with = "no_append")]
    pub append: bool,

    #[arg(long, overrides_with = "append", hide = true)]
    pub no_append: bool,

    /// Keep the original row order [file]
    #[arg(long)]
    pub preserve_order: bool,
}

#[derive(Subcommand)]
pub enum StorageCommand {
    /// Create a storage
    #[command(arg_required_else_help = true)]
    Create {
        name: String,

        /// Owning repository
        #[arg(short, long)]
        repository: String,

        #[command(flatten)]
        medium: MediumArgs,
    },

    /// Update a storage; an empty value removes a property
    #[command(arg_required_else_help = true)]
    Update {
        name: String,

        /// Owning repository
        #[arg(short, long)]
        repository: String,

        #[command(flatten)]
        medium: MediumArgs,
    },

    /// Delete a storage with its transformers
    #[command(arg_required_else_help = true)]
    Delete {
        name: String,

        /// Owning repository
        #[arg(short, long)]
        repository: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// List storages
    #[clap(visible_alias = "ls")]
    List {
        /// Only list storages of repositories of this kind
        #[arg(short, long)]
        kind: Option<String>,

        /// Only list storages of this repository
        #[arg(short, long)]
        repository: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum TransformerCommand {
    /// Create a transformer
    #[command(arg_required_else_help = true)]
    Create {
        name: String,

        /// Source repository the script runs on
        #[arg(short, long)]
        source: String,

        /// Target repository
        #[arg(short, long)]
        target: String,

        /// Target storage within the target repository
        #[arg(short = 'T', long)]
        storage: String,

        /// SQL script file
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        file: String,
    },

    /// Update a transformer
    #[command(arg_required_else_help = true)]
    Update {
        name: String,

        /// Source repository the script runs on
        #[arg(short, long)]
        source: Option<String>,

        /// Target repository
        #[arg(short, long, requires = "storage")]
        target: Option<String>,

        /// Target storage within the target repository
        #[arg(short = 'T', long, requires = "target")]
        storage: Option<String>,

        /// SQL script file
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        file: Option<String>,
    },

    /// Delete a transformer
    #[command(arg_required_else_help = true)]
    Delete { name: String },

    /// List transformers
    #[clap(visible_alias = "ls")]
    List {
        #[arg(long)]
        source_kind: Option<String>,

        #[arg(long)]
        source: Option<String>,

        #[arg(long)]
        target_kind: Option<String>,

        #[arg(long)]
        target: Option<String>,

        #[arg(long)]
        storage: Option<String>,
    },

    /// Run transformers now
    #[command(arg_required_else_help = true)]
    Execute {
        #[arg(required = true)]
        names: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum TaskCommand {
    /// Create a task
    #[command(arg_required_else_help = true)]
    Create { name: String },

    /// Delete a task
    #[command(arg_required_else_help = true)]
    Delete {
        name: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// List tasks
    #[clap(visible_alias = "ls")]
    List,

    /// Add a transformer to a task
    #[command(arg_required_else_help = true)]
    Bind {
        name: String,

        /// Transformer to add
        #[arg(short, long)]
        transformer: String,

        /// Position to insert at, starting from 1; appends when omitted
        #[arg(short, long)]
        sort: Option<i32>,
    },

    /// Remove a transformer from a task
    #[command(arg_required_else_help = true)]
    Unbind {
        name: String,

        /// Transformer to remove
        #[arg(short, long)]
        transformer: String,
    },

    /// List the transformers of a task in execution order
    #[clap(visible_alias = "detail")]
    Transformers { name: Option<String> },

    /// Run tasks now
    #[command(arg_required_else_help = true)]
    Execute {
        #[arg(required = true)]
        names: Vec<String>,
    },
}

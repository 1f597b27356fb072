use duckcp_utils::error::{FileSystemError, PathError};
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("TOML serialization error: {0}")]
    #[diagnostic(
        code(duckcp_config::toml_serialize),
        help("Check your configuration structure for invalid values")
    )]
    TomlSerError(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    #[diagnostic(
        code(duckcp_config::toml_deserialize),
        help("Check your config.toml syntax and structure")
    )]
    TomlDeError(#[from] toml::de::Error),

    #[error("Failed to parse TOML: {0}")]
    #[diagnostic(code(duckcp_config::toml))]
    Toml(#[from] toml_edit::TomlError),

    #[error("Configuration file already exists: {0}")]
    #[diagnostic(
        code(duckcp_config::already_exists),
        help("Remove the existing config file or pass a different path with --config")
    )]
    ConfigAlreadyExists(String),

    #[error("Invalid HTTP timeout: {0}")]
    #[diagnostic(
        code(duckcp_config::invalid_timeout),
        help("`http.timeout` is a number of seconds greater than zero")
    )]
    InvalidTimeout(u64),

    #[error("Invalid open api address: {0}")]
    #[diagnostic(
        code(duckcp_config::invalid_open_api),
        help("`feishu.open_api` must start with http:// or https://")
    )]
    InvalidOpenApi(String),

    #[error("Encountered unexpected TOML item: {0}")]
    #[diagnostic(code(duckcp_config::unexpected_toml_item))]
    UnexpectedTomlItem(String),

    #[error("IO error: {0}")]
    #[diagnostic(code(duckcp_config::io))]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    #[diagnostic(code(duckcp_config::path))]
    Path(#[from] PathError),

    #[error(transparent)]
    #[diagnostic(code(duckcp_config::fs))]
    FileSystem(#[from] FileSystemError),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

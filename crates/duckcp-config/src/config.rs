use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use documented::{Documented, DocumentedFields};
use duckcp_utils::{
    fs::ensure_parent_dir,
    path::{resolve_path, xdg_config_home},
};
use serde::{Deserialize, Serialize};
use toml_edit::DocumentMut;
use tracing::{debug, info};

use crate::{
    annotations::annotate_toml_table,
    error::{ConfigError, Result},
};

pub const DEFAULT_OPEN_API: &str = "https://open.feishu.cn/open-apis";
pub const DEFAULT_HTTP_TIMEOUT: u64 = 10;

/// duckcp configuration
#[derive(Clone, Debug, Default, Deserialize, Serialize, Documented, DocumentedFields)]
#[serde(default)]
pub struct Config {
    /// Path of the catalog database holding repositories, storages, transformers and tasks.
    /// Default: $XDG_CONFIG_HOME/duckcp/configuration.db
    pub catalog: Option<String>,

    /// Outgoing HTTP settings.
    pub http: HttpConfig,

    /// Feishu open platform settings, used by bitable repositories.
    pub feishu: FeishuConfig,
}

/// Outgoing HTTP settings.
#[derive(Clone, Debug, Default, Deserialize, Serialize, Documented, DocumentedFields)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout in seconds.
    /// Default: 10
    pub timeout: Option<u64>,

    /// Proxy URL, e.g. `http://127.0.0.1:8080`.
    pub proxy: Option<String>,

    /// User-Agent header sent with every request.
    pub user_agent: Option<String>,
}

/// Feishu open platform settings.
#[derive(Clone, Debug, Default, Deserialize, Serialize, Documented, DocumentedFields)]
#[serde(default)]
pub struct FeishuConfig {
    /// Base address of the open api.
    /// Default: https://open.feishu.cn/open-apis
    pub open_api: Option<String>,
}

/// Location of `config.toml`: `$DUCKCP_CONFIG`, else `$XDG_CONFIG_HOME/duckcp/config.toml`.
pub fn default_config_path() -> PathBuf {
    match std::env::var("DUCKCP_CONFIG") {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => xdg_config_home().join("duckcp").join("config.toml"),
    }
}

impl Config {
    pub fn default_config() -> Self {
        Self {
            catalog: Some("$XDG_CONFIG_HOME/duckcp/configuration.db".into()),
            http: HttpConfig {
                timeout: Some(DEFAULT_HTTP_TIMEOUT),
                proxy: None,
                user_agent: Some(format!("duckcp/{}", env!("CARGO_PKG_VERSION"))),
            },
            feishu: FeishuConfig {
                open_api: Some(DEFAULT_OPEN_API.into()),
            },
        }
    }

    /// Loads the configuration at `path`, or at [`default_config_path`] when `None`.
    ///
    /// A missing file yields [`Config::default`].
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map_or_else(default_config_path, Path::to_path_buf);

        let config: Config = match fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "config file not found, using defaults");
                Self::default()
            }
            Err(err) => return Err(ConfigError::IoError(err)),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.http.timeout == Some(0) {
            return Err(ConfigError::InvalidTimeout(0));
        }
        if let Some(open_api) = &self.feishu.open_api {
            if !open_api.starts_with("http://") && !open_api.starts_with("https://") {
                return Err(ConfigError::InvalidOpenApi(open_api.clone()));
            }
        }
        Ok(())
    }

    /// Replaces the catalog location for this invocation.
    pub fn with_catalog<S: Into<String>>(mut self, catalog: S) -> Self {
        self.catalog = Some(catalog.into());
        self
    }

    pub fn catalog_path(&self) -> Result<PathBuf> {
        match &self.catalog {
            Some(catalog) => Ok(resolve_path(catalog)?),
            None => Ok(xdg_config_home().join("duckcp").join("configuration.db")),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout.unwrap_or(DEFAULT_HTTP_TIMEOUT))
    }

    pub fn open_api(&self) -> &str {
        self.feishu
            .open_api
            .as_deref()
            .map(|api| api.trim_end_matches('/'))
            .unwrap_or(DEFAULT_OPEN_API)
    }

    pub fn to_annotated_document(&self) -> Result<DocumentMut> {
        let mut doc = toml::to_string_pretty(self)?.parse::<DocumentMut>()?;

        annotate_toml_table::<Config>(doc.as_table_mut(), true)?;
        if let Some(table) = doc.get_mut("http").and_then(|item| item.as_table_mut()) {
            annotate_toml_table::<HttpConfig>(table, false)?;
        }
        if let Some(table) = doc.get_mut("feishu").and_then(|item| item.as_table_mut()) {
            annotate_toml_table::<FeishuConfig>(table, false)?;
        }

        Ok(doc)
    }
}

/// Writes an annotated default `config.toml` to `path`, refusing to overwrite.
pub fn generate_default_config(path: Option<&Path>) -> Result<PathBuf> {
    let path = path.map_or_else(default_config_path, Path::to_path_buf);

    if path.exists() {
        return Err(ConfigError::ConfigAlreadyExists(
            path.display().to_string(),
        ));
    }

    let document = Config::default_config().to_annotated_document()?;
    ensure_parent_dir(&path)?;
    fs::write(&path, document.to_string())?;
    info!(
        "Default configuration file generated with documentation at: {}",
        path.display()
    );
    Ok(path)
}

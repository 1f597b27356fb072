use duckcp_config::config::Config;
use duckcp_core::DuckcpContext;
use serde_json::Value as JsonValue;
use tempfile::TempDir;

use crate::types::Properties;

/// A context over a catalog in a temporary directory.
pub struct TestCatalog {
    pub dir: TempDir,
    pub ctx: DuckcpContext,
}

impl TestCatalog {
    /// The catalog file is not created yet.
    pub fn uncreated() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let catalog = dir.path().join("meta/catalog.db");
        let config = Config::default().with_catalog(catalog.to_string_lossy());
        let ctx = DuckcpContext::new(config).unwrap();
        Self { dir, ctx }
    }

    pub fn new() -> Self {
        let env = Self::uncreated();
        env.ctx.catalog().create(false).unwrap();
        env
    }

    pub fn path(&self, name: &str) -> String {
        self.dir.path().join(name).to_string_lossy().into_owned()
    }
}

pub fn props(value: JsonValue) -> Properties {
    value.as_object().cloned().unwrap()
}

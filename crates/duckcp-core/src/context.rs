use std::sync::Arc;

use duckcp_config::config::Config;
use duckcp_db::CatalogStore;
use duckcp_remote::{
    http_client::{ClientConfig, HttpClient},
    BitableApi, FeishuClient,
};

use crate::{
    credential::{Authenticator, Refresher},
    error::DuckcpResult,
};

/// Platform code under which bitable credentials are cached.
pub const FEISHU_PLATFORM: &str = "feishu";

/// Everything an operation needs: configuration, the catalog and the remote API.
#[derive(Clone)]
pub struct DuckcpContext {
    config: Config,
    catalog: CatalogStore,
    bitable: Arc<dyn BitableApi>,
}

impl DuckcpContext {
    /// Builds a context whose remote API talks to the configured Feishu endpoint.
    pub fn new(config: Config) -> DuckcpResult<Self> {
        let catalog = CatalogStore::new(config.catalog_path()?);
        let http = HttpClient::new(&ClientConfig {
            user_agent: config.http.user_agent.clone(),
            proxy: config.http.proxy.clone(),
            timeout: Some(config.http_timeout()),
        })?;
        let bitable = Arc::new(FeishuClient::new(http, config.open_api()));

        Ok(Self {
            config,
            catalog,
            bitable,
        })
    }

    pub fn with_parts(config: Config, catalog: CatalogStore, bitable: Arc<dyn BitableApi>) -> Self {
        Self {
            config,
            catalog,
            bitable,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    pub fn bitable(&self) -> &Arc<dyn BitableApi> {
        &self.bitable
    }

    /// Token source for a bitable app, cached in the catalog.
    pub fn bitable_authenticator(&self, app_id: &str, app_secret: &str) -> Authenticator {
        let api = self.bitable.clone();
        let (id, secret) = (app_id.to_string(), app_secret.to_string());
        let refresher: Refresher =
            Box::new(move || Ok(api.tenant_access_token(&id, &secret)?));
        Authenticator::new(self.catalog.clone(), FEISHU_PLATFORM, app_id, refresher)
    }
}

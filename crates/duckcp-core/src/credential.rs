//! Cached access tokens for remote platforms.

use chrono::Utc;
use duckcp_db::{
    models::{format_timestamp, NewCredential},
    repository::Credentials,
    CatalogStore,
};
use duckcp_remote::IssuedToken;
use tracing::{debug, info};

use crate::error::DuckcpResult;

/// Obtains a fresh token from the issuing platform.
pub type Refresher = Box<dyn Fn() -> DuckcpResult<IssuedToken> + Send + Sync>;

/// Hands out a valid access token for one app, refreshing through the catalog cache.
pub struct Authenticator {
    catalog: CatalogStore,
    platform: String,
    app: String,
    refresher: Refresher,
}

impl Authenticator {
    pub fn new(
        catalog: CatalogStore,
        platform: impl Into<String>,
        app: impl Into<String>,
        refresher: Refresher,
    ) -> Self {
        Self {
            catalog,
            platform: platform.into(),
            app: app.into(),
            refresher,
        }
    }

    /// Returns the cached token while it is valid; otherwise refreshes and stores a new one.
    pub fn access_token(&self) -> DuckcpResult<String> {
        let now = format_timestamp(Utc::now());
        let mut conn = self.catalog.connect()?;

        if let Some(credential) =
            Credentials::find_valid(&mut conn, &self.platform, &self.app, &now)?
        {
            debug!(platform = %self.platform, app = %self.app, "using cached credential");
            return Ok(credential.access_token);
        }

        let issued = (self.refresher)()?;
        Credentials::replace(
            &mut conn,
            &NewCredential {
                platform_code: &self.platform,
                app_code: &self.app,
                access_token: &issued.access_token,
                expired_at: format_timestamp(issued.expired_at),
            },
        )?;
        info!("refreshed credential ({}, {})", self.platform, self.app);

        Ok(issued.access_token)
    }
}

use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tracing::trace;
use ureq::{Agent, Proxy};

use crate::error::{RemoteError, Result};

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub user_agent: Option<String>,
    pub proxy: Option<String>,
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: Some(concat!("duckcp/", env!("CARGO_PKG_VERSION")).into()),
            proxy: None,
            timeout: Some(Duration::from_secs(10)),
        }
    }
}

impl ClientConfig {
    /// Builds an [`Agent`] with the configured proxy, timeout and user agent.
    ///
    /// Non-2xx responses are returned to the caller rather than turned into errors, so
    /// [`HttpClient`] can report the status together with the URL.
    pub fn build(&self) -> Result<Agent> {
        let proxy = self.proxy.as_deref().map(Proxy::new).transpose()?;
        let mut config = Agent::config_builder()
            .proxy(proxy)
            .timeout_global(self.timeout)
            .http_status_as_error(false);

        if let Some(user_agent) = &self.user_agent {
            config = config.user_agent(user_agent);
        }

        Ok(config.build().into())
    }
}

/// Blocking JSON-over-HTTP client.
#[derive(Clone)]
pub struct HttpClient {
    agent: Agent,
}

impl HttpClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            agent: config.build()?,
        })
    }

    /// POSTs `body` as JSON and decodes the JSON response.
    pub fn post_json<B, T>(&self, url: &str, bearer: Option<&str>, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        trace!(url, "POST");
        let mut request = self
            .agent
            .post(url)
            .header("Content-Type", "application/json; charset=utf-8");
        if let Some(token) = bearer {
            request = request.header("Authorization", &format!("Bearer {token}"));
        }

        let mut resp = request.send_json(body)?;
        if !resp.status().is_success() {
            return Err(RemoteError::HttpError {
                status: resp.status().as_u16(),
                url: url.to_string(),
            });
        }

        resp.body_mut()
            .read_json()
            .map_err(|err| RemoteError::InvalidResponse {
                url: url.to_string(),
                reason: err.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert!(config.user_agent.unwrap().starts_with("duckcp/"));
        assert!(config.proxy.is_none());
        assert_eq!(config.timeout, Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_invalid_proxy_is_rejected() {
        let config = ClientConfig {
            proxy: Some("::not a proxy::".into()),
            ..ClientConfig::default()
        };
        assert!(config.build().is_err());
    }
}

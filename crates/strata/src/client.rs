use std::time::Duration;

use reqwest::{Client, Proxy, Url};
use strata_fetch::ReqwestClient;
use thiserror::Error;

use crate::config::FileConfig;

#[derive(Debug, Error)]
pub enum ClientSettingError {
    #[error("Invalid proxy URL {url}: {reason}")]
    Proxy { url: String, reason: String },

    #[error("Failed to build client: {0}")]
    Build(#[from] reqwest::Error),
}

/// Transport settings for the HTTP client.
#[derive(Clone, Debug, Default)]
pub struct ClientSetting {
    pub proxies:         Vec<String>,
    pub connect_timeout: Option<Duration>,
}

impl From<&FileConfig> for ClientSetting {
    fn from(config: &FileConfig) -> Self {
        Self {
            proxies:         config.proxies.clone(),
            connect_timeout: config.connect_timeout_secs.map(Duration::from_secs),
        }
    }
}

impl ClientSetting {
    pub fn build(self) -> Result<ReqwestClient, ClientSettingError> {
        let mut cb = Client::builder();

        for raw in self.proxies {
            let url = Url::parse(&raw).map_err(|e| ClientSettingError::Proxy {
                url:    raw.clone(),
                reason: e.to_string(),
            })?;
            let proxy = if url.scheme() == "https" {
                Proxy::https(url.as_str())
            } else {
                Proxy::http(url.as_str())
            };
            cb = cb.proxy(proxy.map_err(|e| ClientSettingError::Proxy {
                url:    raw,
                reason: e.to_string(),
            })?);
        }

        if let Some(timeout) = self.connect_timeout {
            cb = cb.connect_timeout(timeout);
        }

        Ok(ReqwestClient::from_client(cb.build()?))
    }
}

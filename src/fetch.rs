//! Page fetching.
//!
//! The engine only depends on the [`Fetcher`] trait; [`HttpFetcher`] is the
//! production implementation backed by `reqwest`. Tests substitute an
//! in-memory map of URL to HTML.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::config::FetchConfig;
use crate::error::FetchError;

/// Retrieves raw HTML for an absolute URL.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url` and return the response body.
    ///
    /// Non-success statuses are errors ([`FetchError::Status`]).
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// HTTP fetcher with a per-request timeout.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let transport = |source| FetchError::Transport {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(transport)
    }
}

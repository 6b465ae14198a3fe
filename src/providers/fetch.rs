//! Plain HTTP page fetching.

use super::PageFetcher;
use crate::core::config::Config;
use crate::core::error::{AppError, FetchError, Result};

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

/// Fetches pages with a single shared `reqwest::Client`.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::Initialization(format!("Failed to build HTTP client: {}", e)))?;
        tracing::debug!(target: "fetch_task", "HTTP client initialized.");
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> std::result::Result<String, FetchError> {
        tracing::debug!(target: "fetch_task", "GET {}", url);
        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Http {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(target: "fetch_task", "{} responded with {}", url, status);
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let text = response.text().await.map_err(|e| FetchError::Http {
            url: url.to_string(),
            message: format!("Failed to read body: {}", e),
        })?;
        tracing::trace!(target: "fetch_task", "{} returned {} bytes", url, text.len());
        Ok(text)
    }
}

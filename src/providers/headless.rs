//! Page fetching through a headless Chrome driven over WebDriver.

use super::PageFetcher;
use crate::core::config::Config;
use crate::core::error::FetchError;

use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::map::Map as JsonMap;
use std::time::Duration;
use url::Url;

/// Renders pages in a fresh headless browser session per fetch.
///
/// One session per page keeps a crashed or hung tab from affecting the next
/// link. The WebDriver server (e.g. chromedriver) must already be running.
#[derive(Clone, Debug)]
pub struct HeadlessFetcher {
    webdriver_url: String,
    user_agent: String,
    page_timeout: Duration,
}

impl HeadlessFetcher {
    pub fn new(config: &Config, webdriver_url: impl Into<String>) -> Self {
        Self {
            webdriver_url: webdriver_url.into(),
            user_agent: config.user_agent.clone(),
            page_timeout: config.request_timeout,
        }
    }

    /// Creates a WebDriver client connection with headless Chrome capabilities.
    async fn create_client(&self, url: &Url) -> Result<Client, FetchError> {
        tracing::debug!(target: "fetch_headless", "Connecting to WebDriver at {}...", self.webdriver_url);

        let mut caps = JsonMap::new();
        let mut chrome_opts = JsonMap::new();

        let user_agent_arg = format!("--user-agent={}", self.user_agent);
        let args = vec![
            "--headless=new",
            "--no-sandbox",
            "--disable-gpu",
            "--disable-dev-shm-usage",
            "--disable-software-rasterizer",
            "--disable-extensions",
            "--disable-background-networking",
            "--disable-background-timer-throttling",
            "--disable-backgrounding-occluded-windows",
            "--disable-renderer-backgrounding",
            "--force-color-profile=srgb",
            "--window-size=1920,1080",
            "--mute-audio",
            "--log-level=1",
            user_agent_arg.as_str(),
        ];
        chrome_opts.insert("args".to_string(), serde_json::json!(args));

        caps.insert("browserName".to_string(), serde_json::json!("chrome"));
        caps.insert(
            "goog:chromeOptions".to_string(),
            serde_json::json!(chrome_opts),
        );

        tracing::trace!(target: "fetch_headless", "WebDriver capabilities: {:?}", caps);

        let mut builder = ClientBuilder::native();
        builder.capabilities(caps);

        builder.connect(&self.webdriver_url).await.map_err(|e| {
            tracing::error!(target: "fetch_headless", "Failed to connect to WebDriver at {}: {}", self.webdriver_url, e);
            FetchError::WebDriver {
                url: url.to_string(),
                message: format!("WebDriver connection failed: {}", e),
            }
        })
    }

    /// Closes a session, logging rather than failing on errors.
    async fn close_client(&self, client: Client, url: &Url) {
        if let Err(e) = client.close().await {
            tracing::warn!(target: "fetch_headless", "Failed to close WebDriver session for {}: {}", url, e);
        }
    }

    async fn render(&self, client: &Client, url: &Url) -> Result<String, FetchError> {
        let webdriver_err = |e: fantoccini::error::CmdError| FetchError::WebDriver {
            url: url.to_string(),
            message: e.to_string(),
        };

        client.goto(url.as_str()).await.map_err(webdriver_err)?;
        client
            .wait()
            .at_most(self.page_timeout)
            .for_element(Locator::Css("body"))
            .await
            .map_err(webdriver_err)?;
        client.source().await.map_err(webdriver_err)
    }
}

#[async_trait]
impl PageFetcher for HeadlessFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        let client = self.create_client(url).await?;
        tracing::debug!(target: "fetch_headless", "Rendering {}", url);

        let rendered = tokio::time::timeout(self.page_timeout, self.render(&client, url)).await;
        self.close_client(client, url).await;

        match rendered {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
            }),
        }
    }
}

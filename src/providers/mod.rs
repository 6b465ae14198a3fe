//! External collaborators of the pipeline: search, page retrieval and mail delivery.
//!
//! The pipeline only sees the traits below. Each call is awaited to completion
//! before the next one starts, so every implementation can assume it is never
//! called concurrently by the pipeline.

pub mod fetch;
pub mod headless;
pub mod mail;
pub mod search;

use crate::core::error::{DeliveryError, FetchError, SearchError};
use async_trait::async_trait;
use url::Url;

/// Turns a query into an ordered list of candidate pages.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, count: usize) -> Result<Vec<Url>, SearchError>;
}

/// Retrieves the text of one page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError>;
}

/// Delivers one message. Sender credentials belong to the implementation.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, body: &str)
        -> Result<(), DeliveryError>;
}

#[async_trait]
impl<T: PageFetcher + ?Sized> PageFetcher for Box<T> {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        (**self).fetch(url).await
    }
}

#[async_trait]
impl<T: PageFetcher + ?Sized> PageFetcher for std::sync::Arc<T> {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        (**self).fetch(url).await
    }
}

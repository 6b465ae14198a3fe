//! Search-engine results scraping.

use super::{PageFetcher, SearchProvider};
use crate::core::error::SearchError;
use crate::utils::links::{normalize_link, same_site};

use async_trait::async_trait;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Fetches a search engine's results page and collects the outbound links on it.
///
/// The results page is retrieved through any [`PageFetcher`], so the same
/// headless or HTTP fetcher used for candidate pages also drives the search.
pub struct WebSearchProvider<F> {
    fetcher: F,
    url_template: String,
}

impl<F: PageFetcher> WebSearchProvider<F> {
    /// `url_template` must contain `{query}`; `{count}` is optional.
    pub fn new(fetcher: F, url_template: impl Into<String>) -> Self {
        Self {
            fetcher,
            url_template: url_template.into(),
        }
    }

    pub(crate) fn search_url(&self, query: &str, count: usize) -> Result<Url, SearchError> {
        let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
        let raw = self
            .url_template
            .replace("{query}", &encoded)
            .replace("{count}", &count.to_string());
        Url::parse(&raw).map_err(|e| SearchError::InvalidUrl(format!("{}: {}", raw, e)))
    }
}

/// Collects distinct outbound result links from a results page, in page order.
pub(crate) fn parse_result_links(html: &str, page_url: &Url, count: usize) -> Vec<Url> {
    let document = Html::parse_document(html);
    let anchors = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for element in document.select(&anchors) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(link) = normalize_link(href, page_url) else {
            continue;
        };
        if same_site(&link, page_url) {
            continue;
        }
        if seen.insert(link.as_str().to_string()) {
            links.push(link);
            if links.len() >= count {
                break;
            }
        }
    }
    links
}

#[async_trait]
impl<F: PageFetcher> SearchProvider for WebSearchProvider<F> {
    async fn search(&self, query: &str, count: usize) -> Result<Vec<Url>, SearchError> {
        let url = self.search_url(query, count)?;
        tracing::debug!(target: "search_task", "Searching '{}' via {}", query, url);

        let html = self.fetcher.fetch(&url).await?;
        let links = parse_result_links(&html, &url, count);

        tracing::info!(target: "search_task", "Search for '{}' returned {} links", query, links.len());
        tracing::trace!(target: "search_task", "Links for '{}': {:?}", query, links);
        Ok(links)
    }
}

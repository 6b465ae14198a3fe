//! Turns one query into a deduplicated set of validated addresses.

use crate::core::context::RunContext;
use crate::core::error::SearchError;
use crate::core::models::Harvest;
use crate::providers::{PageFetcher, SearchProvider};
use crate::utils::extract::extract_emails;
use crate::utils::validate::accept_address;

use std::collections::HashSet;
use std::time::Instant;

/// Drives the search provider and page fetcher for a single query.
///
/// A failed search fails the query. A failed page fetch only skips that page.
pub struct LinkHarvester<'a, S: ?Sized, F: ?Sized> {
    search: &'a S,
    fetcher: &'a F,
    excluded_suffixes: &'a [String],
}

impl<'a, S, F> LinkHarvester<'a, S, F>
where
    S: SearchProvider + ?Sized,
    F: PageFetcher + ?Sized,
{
    pub fn new(search: &'a S, fetcher: &'a F, excluded_suffixes: &'a [String]) -> Self {
        Self {
            search,
            fetcher,
            excluded_suffixes,
        }
    }

    /// Harvests validated addresses from up to `count` result links for `query`.
    pub async fn harvest(
        &self,
        ctx: &mut RunContext,
        query: &str,
        count: usize,
    ) -> Result<Harvest, SearchError> {
        let start_time = Instant::now();
        let mut links = self.search.search(query, count).await?;
        if links.len() > count {
            tracing::debug!(target: "harvest_task", "[{}] Provider returned {} links; keeping the first {}", query, links.len(), count);
            links.truncate(count);
        }
        tracing::debug!(target: "harvest_task", "[{}] {} links to visit", query, links.len());

        let mut harvest = Harvest {
            links_found: links.len(),
            ..Harvest::default()
        };
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        for (index, link) in links.iter().enumerate() {
            let link_label = format!("[{}:{}/{}] {}", query, index + 1, links.len(), link);
            match self.fetcher.fetch(link).await {
                Ok(text) => {
                    let found = extract_emails(&text);
                    tracing::debug!(target: "harvest_task", "{} yielded {} candidate tokens", link_label, found.len());
                    for candidate in found {
                        if seen.insert(candidate.clone()) {
                            candidates.push(candidate);
                        }
                    }
                }
                Err(e) => {
                    harvest.links_failed += 1;
                    ctx.warn(format!("❌ Could not access {}: {}", link, e));
                }
            }
        }

        harvest.candidates_found = candidates.len();
        let (valid, rejected): (Vec<String>, Vec<String>) = candidates
            .into_iter()
            .partition(|c| accept_address(c, self.excluded_suffixes));
        if !rejected.is_empty() {
            tracing::debug!(target: "harvest_task", "[{}] Rejected {} candidates: {:?}", query, rejected.len(), rejected);
        }
        harvest.addresses = valid;

        tracing::info!(target: "harvest_task",
            "[{}] Harvest finished in {:.2?}: {} links, {} failed, {} candidates, {} valid",
            query, start_time.elapsed(), harvest.links_found, harvest.links_failed,
            harvest.candidates_found, harvest.addresses.len());

        Ok(harvest)
    }
}

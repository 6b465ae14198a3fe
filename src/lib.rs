//! # Email Courier Core Library
//!
//! This crate runs a harvest-and-dispatch pipeline: for each configured search
//! query it collects result pages, extracts and validates email addresses from
//! them, and sends one fixed message to every address that has never been
//! messaged before. A durable plain-text ledger guarantees that an address is
//! contacted at most once across runs.
//!
//! It is designed to be used either directly as a library or via the
//! `email-courier` command-line tool (which uses this library).

mod core;
pub mod providers;
mod utils;

pub use crate::core::config::{get_send_delay, Config, ConfigBuilder, ConfigFile};
pub use crate::core::context::{RunContext, RunListener};
pub use crate::core::dispatch::Courier;
pub use crate::core::error::{
    AppError, DeliveryError, FetchError, LedgerError, Result, SearchError,
};
pub use crate::core::harvester::LinkHarvester;
pub use crate::core::ledger::{FileLedger, RecipientLedger};
pub use crate::core::models::{
    DispatchOutcome, Harvest, LogEntry, LogLevel, QueryReport, RunSummary,
};
pub use crate::utils::extract::extract_emails;
pub use crate::utils::validate::{accept_address, has_excluded_suffix, is_valid_email};

use crate::providers::fetch::HttpFetcher;
use crate::providers::headless::HeadlessFetcher;
use crate::providers::search::WebSearchProvider;
use crate::providers::{MailTransport, PageFetcher};
use std::sync::Arc;

/// Picks the page fetcher: headless Chrome when a WebDriver URL is configured,
/// plain HTTP otherwise.
pub fn initialize_fetcher(config: &Config) -> Result<Arc<dyn PageFetcher>> {
    match config.webdriver_url.as_deref() {
        Some(url) => {
            tracing::info!("Using headless browser fetcher via WebDriver at {}", url);
            Ok(Arc::new(HeadlessFetcher::new(config, url)))
        }
        None => {
            tracing::info!("Using plain HTTP fetcher");
            Ok(Arc::new(HttpFetcher::new(config)?))
        }
    }
}

/// Wires the configured fetcher and search provider around `mailer`.
///
/// The search provider shares the page fetcher, so results pages and
/// candidate pages are retrieved the same way.
pub fn initialize_courier(config: &Config, mailer: Arc<dyn MailTransport>) -> Result<Courier> {
    let fetcher = initialize_fetcher(config)?;
    let search = WebSearchProvider::new(Arc::clone(&fetcher), config.search_url_template.clone());
    Ok(Courier::new(Arc::new(search), fetcher, mailer))
}

/// Opens the ledger named in `config` and runs every configured query.
///
/// # Arguments
/// * `config` - The application configuration.
/// * `courier` - An initialized `Courier`.
/// * `ctx` - Run context receiving the rolling log and progress.
///
/// # Returns
/// * `RunSummary` with per-query and overall totals, or an error when the
///   ledger cannot be loaded or a sent address could not be recorded.
pub async fn run_pipeline(
    config: &Config,
    courier: &Courier,
    ctx: &mut RunContext,
) -> Result<RunSummary> {
    let mut ledger = FileLedger::open(&config.ledger_path)?;
    courier.run(config, &mut ledger, ctx).await
}

use crate::core::config::{get_send_delay, Config};
use crate::core::context::RunContext;
use crate::core::error::{AppError, Result};
use crate::core::harvester::LinkHarvester;
use crate::core::ledger::RecipientLedger;
use crate::core::models::{DispatchOutcome, QueryReport, RunSummary};
use crate::providers::{MailTransport, PageFetcher, SearchProvider};
use crate::utils::validate::accept_address;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::sleep;

/// The main struct orchestrating harvest and delivery for a list of queries.
///
/// Holds the three collaborators; the ledger and run context are passed to
/// [`Courier::run`] so a single run owns them exclusively.
#[derive(Clone)]
pub struct Courier {
    search: Arc<dyn SearchProvider>,
    fetcher: Arc<dyn PageFetcher>,
    mailer: Arc<dyn MailTransport>,
}

impl Courier {
    pub fn new(
        search: Arc<dyn SearchProvider>,
        fetcher: Arc<dyn PageFetcher>,
        mailer: Arc<dyn MailTransport>,
    ) -> Self {
        Self {
            search,
            fetcher,
            mailer,
        }
    }

    /// Runs every configured query in order and returns the run totals.
    ///
    /// Search, fetch and delivery failures are logged and the run continues.
    /// A recipient whose delivery failed is not attempted again in the same run.
    /// A ledger write failure after a successful send ends the run with
    /// [`AppError::Ledger`].
    pub async fn run(
        &self,
        config: &Config,
        ledger: &mut dyn RecipientLedger,
        ctx: &mut RunContext,
    ) -> Result<RunSummary> {
        let start_time = Instant::now();
        let total_queries = config.queries.len();
        let mut summary = RunSummary {
            total_queries,
            ..RunSummary::default()
        };

        tracing::info!(target: "dispatch_task",
            "Starting run: {} queries, {} results each, {} addresses already in ledger.",
            total_queries, config.results_per_query, ledger.len());

        let harvester = LinkHarvester::new(
            self.search.as_ref(),
            self.fetcher.as_ref(),
            &config.excluded_suffixes,
        );
        let mut failed_recipients = HashSet::new();

        for (index, query) in config.queries.iter().enumerate() {
            if ctx.stop_requested() {
                ctx.warn(format!(
                    "⚠️ Stop requested. Ending run before query {}/{}.",
                    index + 1,
                    total_queries
                ));
                summary.stopped_early = true;
                break;
            }

            ctx.info(format!("🔍 Searching for: {}", query));
            let mut report = QueryReport::new(query);

            match harvester
                .harvest(ctx, query, config.results_per_query)
                .await
            {
                Ok(harvest) => {
                    report.links_found = harvest.links_found;
                    report.links_failed = harvest.links_failed;
                    report.candidates_found = harvest.candidates_found;
                    report.valid_addresses = harvest.addresses.len();

                    ctx.info(format!(
                        "🔎 Found {} valid emails for query: {}",
                        harvest.addresses.len(),
                        query
                    ));

                    for address in &harvest.addresses {
                        let outcome = self
                            .dispatch_one(config, ledger, ctx, &mut failed_recipients, address)
                            .await?;
                        report.tally(outcome);
                    }
                }
                Err(e) => {
                    ctx.error(format!("❌ Search failed for query '{}': {}", query, e));
                    report.failure = Some(e.to_string());
                }
            }

            summary.absorb(report);
            let progress = ctx.set_progress(index + 1, total_queries);
            tracing::debug!(target: "dispatch_task", "Progress: {:.0}%", progress * 100.0);
        }

        summary.elapsed = start_time.elapsed();
        if summary.stopped_early {
            ctx.warn(format!(
                "⚠️ Run stopped after {}/{} queries.",
                summary.queries_processed, total_queries
            ));
        } else {
            ctx.info("✅ Email sending process completed!");
        }
        Ok(summary)
    }

    /// Dispatches a caller-supplied list of addresses outside of a harvest.
    ///
    /// Every address is re-validated, so invalid entries come back as
    /// [`DispatchOutcome::SkippedInvalid`].
    pub async fn dispatch_addresses(
        &self,
        config: &Config,
        ledger: &mut dyn RecipientLedger,
        ctx: &mut RunContext,
        addresses: &[String],
    ) -> Result<Vec<(String, DispatchOutcome)>> {
        let mut outcomes = Vec::with_capacity(addresses.len());
        let mut failed_recipients = HashSet::new();
        for address in addresses {
            let outcome = self
                .dispatch_one(config, ledger, ctx, &mut failed_recipients, address)
                .await?;
            outcomes.push((address.clone(), outcome));
        }
        Ok(outcomes)
    }

    async fn dispatch_one(
        &self,
        config: &Config,
        ledger: &mut dyn RecipientLedger,
        ctx: &mut RunContext,
        failed_recipients: &mut HashSet<String>,
        address: &str,
    ) -> Result<DispatchOutcome> {
        if !accept_address(address, &config.excluded_suffixes) {
            ctx.warn(format!("⚠️ Skipping {}, invalid address.", address));
            return Ok(DispatchOutcome::SkippedInvalid);
        }

        if ledger.contains(address) {
            ctx.info(format!("⚠️ Skipping {}, already sent.", address));
            return Ok(DispatchOutcome::SkippedDuplicate);
        }

        // Kept out of the ledger so the next run retries it.
        if failed_recipients.contains(address) {
            ctx.info(format!(
                "⚠️ Skipping {}, delivery already failed in this run.",
                address
            ));
            return Ok(DispatchOutcome::SkippedDuplicate);
        }

        match self
            .mailer
            .send(address, &config.subject, &config.body)
            .await
        {
            Ok(()) => {
                if let Err(e) = ledger.record(address) {
                    ctx.error(format!(
                        "🛑 LEDGER WRITE FAILED: email to {} was sent but not recorded ({}). Aborting run to prevent a duplicate send.",
                        address, e
                    ));
                    return Err(AppError::Ledger(e));
                }
                ctx.info(format!("✅ Email sent to: {}", address));

                let delay = get_send_delay(config);
                tracing::trace!(target: "dispatch_task", "Sleeping {:?} after send to {}", delay, address);
                sleep(delay).await;
                Ok(DispatchOutcome::Sent)
            }
            Err(e) => {
                ctx.error(format!("❌ Failed to send email to {}: {}", address, e));
                failed_recipients.insert(address.to_string());
                Ok(DispatchOutcome::SendFailed)
            }
        }
    }
}

//! Data shapes produced by a run.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// What happened to one validated address during dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DispatchOutcome {
    Sent,
    SkippedDuplicate,
    SkippedInvalid,
    SendFailed,
}

impl fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchOutcome::Sent => write!(f, "sent"),
            DispatchOutcome::SkippedDuplicate => write!(f, "skipped-duplicate"),
            DispatchOutcome::SkippedInvalid => write!(f, "skipped-invalid"),
            DispatchOutcome::SendFailed => write!(f, "send-failed"),
        }
    }
}

/// Addresses harvested for one query, plus link-level bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct Harvest {
    /// Validated addresses, deduplicated, in first-seen order.
    pub addresses: Vec<String>,
    pub links_found: usize,
    pub links_failed: usize,
    /// Distinct candidates before validation.
    pub candidates_found: usize,
}

/// Per-query summary.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryReport {
    pub query: String,
    pub links_found: usize,
    pub links_failed: usize,
    pub candidates_found: usize,
    pub valid_addresses: usize,
    pub sent: usize,
    pub skipped_duplicate: usize,
    pub skipped_invalid: usize,
    pub send_failed: usize,
    /// Set when the search itself failed and nothing was harvested.
    pub failure: Option<String>,
}

impl QueryReport {
    pub(crate) fn new(query: &str) -> Self {
        Self {
            query: query.to_string(),
            ..Self::default()
        }
    }

    pub(crate) fn tally(&mut self, outcome: DispatchOutcome) {
        match outcome {
            DispatchOutcome::Sent => self.sent += 1,
            DispatchOutcome::SkippedDuplicate => self.skipped_duplicate += 1,
            DispatchOutcome::SkippedInvalid => self.skipped_invalid += 1,
            DispatchOutcome::SendFailed => self.send_failed += 1,
        }
    }
}

/// Totals for a whole run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub total_queries: usize,
    pub queries_processed: usize,
    pub queries_failed: usize,
    pub sent: usize,
    pub skipped_duplicate: usize,
    pub skipped_invalid: usize,
    pub send_failed: usize,
    pub links_failed: usize,
    pub stopped_early: bool,
    #[serde(serialize_with = "serialize_duration_secs")]
    pub elapsed: Duration,
    pub queries: Vec<QueryReport>,
}

impl RunSummary {
    pub(crate) fn absorb(&mut self, report: QueryReport) {
        self.queries_processed += 1;
        if report.failure.is_some() {
            self.queries_failed += 1;
        }
        self.sent += report.sent;
        self.skipped_duplicate += report.skipped_duplicate;
        self.skipped_invalid += report.skipped_invalid;
        self.send_failed += report.send_failed;
        self.links_failed += report.links_failed;
        self.queries.push(report);
    }
}

fn serialize_duration_secs<S: serde::Serializer>(
    d: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_f64(d.as_secs_f64())
}

/// Severity of a rolling-log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// One line of the operator-facing rolling log.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub at: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.at.format("%H:%M:%S"), self.message)
    }
}

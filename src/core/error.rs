//! Error types for the pipeline and its collaborators.
//!
//! Each collaborator has its own error type so the dispatch loop can branch on
//! the fault level: a [`SearchError`] ends one query, a [`FetchError`] skips one
//! link, a [`DeliveryError`] skips one recipient. [`LedgerError`] and everything
//! else folded into [`AppError`] end the run.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of the search provider for a whole query.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Search request failed: {0}")]
    Request(String),

    #[error("Could not build search URL: {0}")]
    InvalidUrl(String),

    #[error("Search results page could not be retrieved: {0}")]
    Fetch(#[from] FetchError),
}

/// Failure to retrieve one page.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request to {url} failed: {message}")]
    Http { url: String, message: String },

    #[error("{url} responded with status {status}")]
    Status { url: String, status: u16 },

    #[error("{url} timed out")]
    Timeout { url: String },

    #[error("WebDriver session error for {url}: {message}")]
    WebDriver { url: String, message: String },
}

/// Failure to deliver a message to one recipient.
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Invalid address '{address}': {message}")]
    InvalidAddress { address: String, message: String },

    #[error("Could not build message: {0}")]
    Message(String),

    #[error("SMTP authentication failed: {0}")]
    Authentication(String),

    #[error("Recipient rejected by server: {0}")]
    Rejected(String),

    #[error("Transient SMTP failure: {0}")]
    Transient(String),

    #[error("SMTP connection failed: {0}")]
    Connection(String),
}

/// A durable write to the sent-recipient ledger failed.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Failed to read ledger '{}': {source}", path.display())]
    Load { path: PathBuf, source: io::Error },

    #[error("Failed to record '{address}' in ledger '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        address: String,
        source: io::Error,
    },
}

/// Top-level library error. Anything surfacing as an `AppError` ends the run.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Initialization error: {0}")]
    Initialization(String),

    #[error("Ledger fault: {0}")]
    Ledger(#[from] LedgerError),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

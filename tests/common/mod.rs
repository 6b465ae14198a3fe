//! In-memory collaborators shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use email_courier_core::providers::{MailTransport, PageFetcher, SearchProvider};
use email_courier_core::{Config, DeliveryError, FetchError, SearchError};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use url::Url;

/// Returns a fixed list of links per query; unknown queries fail.
#[derive(Default)]
pub struct ScriptedSearch {
    pub results: HashMap<String, Vec<Url>>,
}

impl ScriptedSearch {
    pub fn with(mut self, query: &str, links: &[&str]) -> Self {
        self.results.insert(
            query.to_string(),
            links.iter().map(|l| Url::parse(l).unwrap()).collect(),
        );
        self
    }
}

#[async_trait]
impl SearchProvider for ScriptedSearch {
    async fn search(&self, query: &str, count: usize) -> Result<Vec<Url>, SearchError> {
        match self.results.get(query) {
            Some(links) => Ok(links.iter().take(count).cloned().collect()),
            None => Err(SearchError::Request(format!("no results for '{}'", query))),
        }
    }
}

/// Serves page bodies from memory; unknown URLs time out.
#[derive(Default)]
pub struct StaticWeb {
    pub pages: HashMap<String, String>,
}

impl StaticWeb {
    pub fn page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), body.to_string());
        self
    }
}

#[async_trait]
impl PageFetcher for StaticWeb {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        self.pages
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| FetchError::Timeout {
                url: url.to_string(),
            })
    }
}

/// Records every send attempt. When `ledger_path` is set, each attempt also
/// snapshots the ledger file so tests can check what was durable at that moment.
#[derive(Default)]
pub struct Outbox {
    pub attempts: Mutex<Vec<String>>,
    pub ledger_snapshots: Mutex<Vec<HashSet<String>>>,
    pub refuse: HashSet<String>,
    pub ledger_path: Option<PathBuf>,
}

impl Outbox {
    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for Outbox {
    async fn send(&self, recipient: &str, _subject: &str, _body: &str) -> Result<(), DeliveryError> {
        if let Some(ref path) = self.ledger_path {
            let on_disk = std::fs::read_to_string(path)
                .unwrap_or_default()
                .lines()
                .map(String::from)
                .collect();
            self.ledger_snapshots.lock().unwrap().push(on_disk);
        }
        self.attempts.lock().unwrap().push(recipient.to_string());
        if self.refuse.contains(recipient) {
            return Err(DeliveryError::Rejected(format!(
                "550 mailbox unavailable: {}",
                recipient
            )));
        }
        Ok(())
    }
}

pub fn config(queries: &[&str], ledger_path: PathBuf) -> Config {
    Config {
        queries: queries.iter().map(|q| q.to_string()).collect(),
        send_delay: (0.0, 0.0),
        ledger_path,
        ..Config::default()
    }
}

pub fn shared<T>(value: T) -> Arc<T> {
    Arc::new(value)
}

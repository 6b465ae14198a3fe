//! Runtime configuration.
//!
//! `Config` holds the effective settings for one run. It is produced by
//! [`ConfigBuilder`], which layers built-in defaults, an optional TOML file
//! ([`ConfigFile`]) and programmatic overrides, then validates the result.

mod builder;
mod loading;
mod validation;

pub use builder::ConfigBuilder;

use crate::core::error::Result;
use rand::Rng;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SEARCH_URL_TEMPLATE: &str = "https://www.google.com/search?q={query}&num={count}";

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

pub const DEFAULT_SUBJECT: &str = "Application for DevOps Engineer Position";

pub const DEFAULT_BODY: &str = "Hi,

I hope this message finds you well. I am writing to express my interest in the DevOps Engineer position.

I have hands-on experience with AWS services, CI/CD tooling (Jenkins, GitHub, Artifactory), and containerization with Docker and Kubernetes, and I am confident in my ability to deliver high-quality DevOps solutions.

Thank you for considering my application. I look forward to discussing how my skills can benefit your team.
";

pub const DEFAULT_QUERIES: &[&str] = &[
    "DevOps Engineer hiring contact email",
    "AWS DevOps hiring email",
    "Hiring SRE contact emails",
    "Kubernetes DevOps job email",
    "Python Developer hiring contact",
    "DevOps job opportunities contact",
    "Cloud Engineer hiring emails",
    "IT Manager hiring emails",
    "Software Engineer hiring contact email",
    "IT Support hiring email",
    "DevOps Consultant hiring contacts",
    "Sysadmin job contact emails",
    "Platform Engineer hiring email",
    "Automation Engineer hiring emails",
    "Tech Lead hiring emails",
    "Infrastructure Engineer hiring contacts",
    "Site Reliability Engineer hiring email",
    "Cloud Architect hiring contacts",
    "Full Stack Developer hiring email",
    "IT Operations hiring emails",
];

/// File suffixes that mark an extracted token as an asset filename rather than a mailbox.
pub const DEFAULT_EXCLUDED_SUFFIXES: &[&str] = &[
    ".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp", ".ico", ".bmp",
];

/// Effective configuration for a run.
#[derive(Clone)]
pub struct Config {
    // Pipeline
    pub queries: Vec<String>,
    pub results_per_query: usize,
    pub excluded_suffixes: Vec<String>,
    /// Seconds to pause after each successful send, as a (min, max) range.
    pub send_delay: (f32, f32),

    // Message
    pub subject: String,
    pub body: String,

    // Network
    pub request_timeout: Duration,
    pub user_agent: String,
    pub search_url_template: String,
    pub webdriver_url: Option<String>,

    // SMTP
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub from_address: Option<String>,

    // Storage
    pub ledger_path: PathBuf,
    pub diagnostic_log_path: PathBuf,
    pub log_capacity: usize,

    pub loaded_config_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            queries: DEFAULT_QUERIES.iter().map(|q| q.to_string()).collect(),
            results_per_query: 5,
            excluded_suffixes: DEFAULT_EXCLUDED_SUFFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            send_delay: (1.0, 1.0),
            subject: DEFAULT_SUBJECT.to_string(),
            body: DEFAULT_BODY.to_string(),
            request_timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            search_url_template: DEFAULT_SEARCH_URL_TEMPLATE.to_string(),
            webdriver_url: None,
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            smtp_username: None,
            smtp_password: None,
            from_address: None,
            ledger_path: PathBuf::from("sent_emails.txt"),
            diagnostic_log_path: PathBuf::from("app.log"),
            log_capacity: 100,
            loaded_config_path: None,
        }
    }
}

// The password never reaches the logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("queries", &self.queries.len())
            .field("results_per_query", &self.results_per_query)
            .field("excluded_suffixes", &self.excluded_suffixes)
            .field("send_delay", &self.send_delay)
            .field("subject", &self.subject)
            .field("request_timeout", &self.request_timeout)
            .field("user_agent", &self.user_agent)
            .field("search_url_template", &self.search_url_template)
            .field("webdriver_url", &self.webdriver_url)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field(
                "smtp_password",
                &self.smtp_password.as_ref().map(|_| "<redacted>"),
            )
            .field("from_address", &self.from_address)
            .field("ledger_path", &self.ledger_path)
            .field("diagnostic_log_path", &self.diagnostic_log_path)
            .field("log_capacity", &self.log_capacity)
            .field("loaded_config_path", &self.loaded_config_path)
            .finish()
    }
}

impl Config {
    /// Sender address used in the `From` header, falling back to the SMTP username.
    pub fn sender(&self) -> Option<&str> {
        self.from_address
            .as_deref()
            .or(self.smtp_username.as_deref())
    }

    /// Builds a config with defaults only, skipping file discovery.
    pub fn defaults() -> Result<Self> {
        let mut config = Config::default();
        validation::validate_config(&mut config)?;
        Ok(config)
    }
}

/// Picks the pause applied after a successful send.
pub fn get_send_delay(config: &Config) -> Duration {
    let (min, max) = config.send_delay;
    if max <= min {
        return Duration::from_secs_f32(min.max(0.0));
    }
    let secs = rand::thread_rng().gen_range(min..=max);
    Duration::from_secs_f32(secs)
}

/// Shape of the optional TOML configuration file. Every field is optional and
/// only overrides the defaults when present.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct ConfigFile {
    pub pipeline: PipelineSection,
    pub message: MessageSection,
    pub network: NetworkSection,
    pub smtp: SmtpSection,
    pub storage: StorageSection,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct PipelineSection {
    pub queries: Option<Vec<String>>,
    pub results_per_query: Option<usize>,
    pub excluded_suffixes: Option<Vec<String>>,
    pub min_send_delay: Option<f32>,
    pub max_send_delay: Option<f32>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct MessageSection {
    pub subject: Option<String>,
    pub body: Option<String>,
    pub body_file: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct NetworkSection {
    pub request_timeout: Option<u64>,
    pub user_agent: Option<String>,
    pub search_url_template: Option<String>,
    pub webdriver_url: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct SmtpSection {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_address: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct StorageSection {
    pub ledger_path: Option<String>,
    pub diagnostic_log_path: Option<String>,
    pub log_capacity: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_delay_when_range_is_flat() {
        let config = Config::default();
        assert_eq!(get_send_delay(&config), Duration::from_secs(1));
    }

    #[test]
    fn test_delay_stays_within_range() {
        let config = Config {
            send_delay: (0.5, 1.5),
            ..Config::default()
        };
        for _ in 0..50 {
            let d = get_send_delay(&config);
            assert!(d >= Duration::from_secs_f32(0.5) && d <= Duration::from_secs_f32(1.5));
        }
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = Config {
            smtp_password: Some("hunter2".to_string()),
            ..Config::default()
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_sender_falls_back_to_username() {
        let mut config = Config {
            smtp_username: Some("me@example.com".to_string()),
            ..Config::default()
        };
        assert_eq!(config.sender(), Some("me@example.com"));
        config.from_address = Some("Jobs <jobs@example.com>".to_string());
        assert_eq!(config.sender(), Some("Jobs <jobs@example.com>"));
    }
}

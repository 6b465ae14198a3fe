//! Handles loading configuration from files and applying it to the Config struct.

use super::{Config, ConfigFile};
use crate::core::error::{AppError, Result};
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Loads configuration settings from a TOML file.
/// Returns the parsed `ConfigFile` content.
pub(crate) fn load_config_file(file_path: &str) -> anyhow::Result<ConfigFile> {
    let path = Path::new(file_path);
    if !path.exists() || !path.is_file() {
        return Err(anyhow::anyhow!(
            "File not found or is not a file: {}",
            file_path
        ));
    }
    tracing::debug!("Attempting to read config file: {}", file_path);
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", file_path))?;

    tracing::debug!("Attempting to parse TOML from: {}", file_path);
    let config_file_content: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML configuration from {}", file_path))?;

    tracing::debug!("Successfully parsed configuration file: {}", file_path);
    Ok(config_file_content)
}

/// Merges the settings present in `file_config` onto `config`.
///
/// `base_dir` anchors a relative `body_file`; `None` resolves it against the
/// working directory.
pub(crate) fn apply_file_config(
    config: &mut Config,
    file_config: &ConfigFile,
    base_dir: Option<PathBuf>,
) -> Result<()> {
    // Pipeline
    if let Some(ref queries) = file_config.pipeline.queries {
        config.queries = queries
            .iter()
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .collect();
    }
    if let Some(count) = file_config.pipeline.results_per_query {
        config.results_per_query = count;
    }
    if let Some(ref suffixes) = file_config.pipeline.excluded_suffixes {
        config.excluded_suffixes = suffixes.clone();
    }
    if let Some(min_delay) = file_config.pipeline.min_send_delay {
        config.send_delay.0 = min_delay;
    }
    if let Some(max_delay) = file_config.pipeline.max_send_delay {
        config.send_delay.1 = max_delay;
    }

    // Message
    if let Some(ref subject) = file_config.message.subject {
        config.subject = subject.clone();
    }
    if let Some(ref body) = file_config.message.body {
        config.body = body.clone();
    }
    if let Some(ref body_file) = file_config.message.body_file {
        let path = match base_dir {
            Some(ref dir) if Path::new(body_file).is_relative() => dir.join(body_file),
            _ => PathBuf::from(body_file),
        };
        config.body = fs::read_to_string(&path).map_err(|e| {
            AppError::Config(format!(
                "Failed to read message body file '{}': {}",
                path.display(),
                e
            ))
        })?;
    }

    // Network
    if let Some(timeout) = file_config.network.request_timeout {
        config.request_timeout = Duration::from_secs(timeout);
    }
    if let Some(ref user_agent) = file_config.network.user_agent {
        config.user_agent = user_agent.clone();
    }
    if let Some(ref template) = file_config.network.search_url_template {
        config.search_url_template = template.clone();
    }
    if let Some(ref url) = file_config.network.webdriver_url {
        if !url.trim().is_empty() {
            config.webdriver_url = Some(url.trim().to_string());
        } else {
            config.webdriver_url = None
        }
    }

    // SMTP
    if let Some(ref host) = file_config.smtp.host {
        config.smtp_host = host.trim().to_string();
    }
    if let Some(port) = file_config.smtp.port {
        config.smtp_port = port;
    }
    if let Some(ref username) = file_config.smtp.username {
        config.smtp_username = Some(username.trim().to_string());
    }
    if let Some(ref password) = file_config.smtp.password {
        config.smtp_password = Some(password.clone());
    }
    if let Some(ref from) = file_config.smtp.from_address {
        config.from_address = Some(from.trim().to_string());
    }

    // Storage
    if let Some(ref path) = file_config.storage.ledger_path {
        config.ledger_path = PathBuf::from(path);
    }
    if let Some(ref path) = file_config.storage.diagnostic_log_path {
        config.diagnostic_log_path = PathBuf::from(path);
    }
    if let Some(capacity) = file_config.storage.log_capacity {
        config.log_capacity = capacity;
    }

    Ok(())
}

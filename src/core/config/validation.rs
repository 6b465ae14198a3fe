//! Contains validation logic for the final Config struct.

use super::Config;
use crate::core::error::{AppError, Result};
use std::time::Duration;

/// Validates the configuration settings after loading and potential overrides.
/// Mutates the config to clamp values where a sane fallback exists.
pub(crate) fn validate_config(config: &mut Config) -> Result<()> {
    if config.queries.is_empty() {
        return Err(AppError::Config(
            "At least one search query is required.".to_string(),
        ));
    }
    if config.results_per_query == 0 {
        tracing::warn!("Results per query was set to 0. Setting to 1.");
        config.results_per_query = 1;
    }
    if config.request_timeout.is_zero() {
        tracing::warn!("Request timeout was set to 0. Setting to 1 second.");
        config.request_timeout = Duration::from_secs(1);
    }
    if config.send_delay.0 < 0.0 || config.send_delay.1 < 0.0 {
        return Err(AppError::Config(
            "Send delays cannot be negative.".to_string(),
        ));
    }
    if config.send_delay.0 > config.send_delay.1 {
        tracing::warn!(
            "Min send delay ({:.2}s) > Max send delay ({:.2}s). Setting max = min.",
            config.send_delay.0,
            config.send_delay.1
        );
        config.send_delay.1 = config.send_delay.0;
    }
    if !config.search_url_template.contains("{query}") {
        return Err(AppError::Config(format!(
            "Search URL template must contain '{{query}}': {}",
            config.search_url_template
        )));
    }
    if config.log_capacity == 0 {
        tracing::warn!("Log capacity was set to 0. Setting to 1.");
        config.log_capacity = 1;
    }
    if let Some(ref from) = config.from_address {
        if !from.contains('@') {
            return Err(AppError::Config(format!(
                "Invalid sender address format: {}",
                from
            )));
        }
    }
    if config.subject.trim().is_empty() {
        tracing::warn!("Message subject is empty.");
    }
    if config.body.trim().is_empty() {
        tracing::warn!("Message body is empty.");
    }
    if let Some(ref url) = config.webdriver_url {
        if url.is_empty() {
            tracing::warn!("Provided WebDriver URL is empty. Falling back to plain HTTP fetching.");
            config.webdriver_url = None;
        }
    }
    Ok(())
}

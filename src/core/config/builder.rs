//! Provides the `ConfigBuilder` for fluent configuration construction.

use super::loading::{apply_file_config, load_config_file};
use super::validation::validate_config;
use super::{Config, ConfigFile};
use crate::core::error::{AppError, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Builder pattern for creating `Config` instances fluently.
///
/// Settings are applied in order: defaults, then the config file (explicit path,
/// or the first default location that exists), then the builder overrides.
/// The merged result is validated before it is returned.
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
    config_file_path: Option<String>,
    skip_default_locations: bool,
    overrides: ConfigFile,
}

impl ConfigBuilder {
    /// Creates a new builder with default configuration values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Specify an optional configuration file path to load.
    pub fn config_file(mut self, path: impl Into<String>) -> Self {
        self.config_file_path = Some(path.into());
        self
    }

    /// Do not probe `./email-courier.toml` and `./config.toml` when no file is given.
    pub fn skip_default_locations(mut self) -> Self {
        self.skip_default_locations = true;
        self
    }

    pub fn queries(mut self, queries: Vec<String>) -> Self {
        self.overrides.pipeline.queries = Some(queries);
        self
    }
    pub fn results_per_query(mut self, value: usize) -> Self {
        self.overrides.pipeline.results_per_query = Some(value);
        self
    }
    pub fn excluded_suffixes(mut self, suffixes: Vec<String>) -> Self {
        self.overrides.pipeline.excluded_suffixes = Some(suffixes);
        self
    }
    pub fn send_delay(mut self, min: f32, max: f32) -> Self {
        self.overrides.pipeline.min_send_delay = Some(min);
        self.overrides.pipeline.max_send_delay = Some(max);
        self
    }
    pub fn subject(mut self, value: impl Into<String>) -> Self {
        self.overrides.message.subject = Some(value.into());
        self
    }
    pub fn body(mut self, value: impl Into<String>) -> Self {
        self.overrides.message.body = Some(value.into());
        self
    }
    pub fn body_file(mut self, path: impl Into<String>) -> Self {
        self.overrides.message.body_file = Some(path.into());
        self
    }
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.overrides.network.request_timeout = Some(duration.as_secs());
        self
    }
    pub fn user_agent(mut self, value: impl Into<String>) -> Self {
        self.overrides.network.user_agent = Some(value.into());
        self
    }
    pub fn search_url_template(mut self, value: impl Into<String>) -> Self {
        self.overrides.network.search_url_template = Some(value.into());
        self
    }
    pub fn webdriver_url(mut self, url: Option<impl Into<String>>) -> Self {
        self.overrides.network.webdriver_url = url.map(|s| s.into());
        self
    }
    pub fn smtp_host(mut self, value: impl Into<String>) -> Self {
        self.overrides.smtp.host = Some(value.into());
        self
    }
    pub fn smtp_port(mut self, value: u16) -> Self {
        self.overrides.smtp.port = Some(value);
        self
    }
    pub fn smtp_username(mut self, value: impl Into<String>) -> Self {
        self.overrides.smtp.username = Some(value.into());
        self
    }
    pub fn smtp_password(mut self, value: impl Into<String>) -> Self {
        self.overrides.smtp.password = Some(value.into());
        self
    }
    pub fn from_address(mut self, value: impl Into<String>) -> Self {
        self.overrides.smtp.from_address = Some(value.into());
        self
    }
    pub fn ledger_path(mut self, path: impl Into<String>) -> Self {
        self.overrides.storage.ledger_path = Some(path.into());
        self
    }
    pub fn diagnostic_log_path(mut self, path: impl Into<String>) -> Self {
        self.overrides.storage.diagnostic_log_path = Some(path.into());
        self
    }
    pub fn log_capacity(mut self, value: usize) -> Self {
        self.overrides.storage.log_capacity = Some(value);
        self
    }

    /// Builds the final `Config` object, applying defaults, file settings, overrides, and validation.
    pub fn build(mut self) -> Result<Config> {
        let mut loaded_path: Option<String> = None;

        if let Some(ref path) = self.config_file_path {
            match load_config_file(path) {
                Ok(file_config) => {
                    apply_file_config(&mut self.config, &file_config, base_dir(path))?;
                    loaded_path = Some(path.clone());
                    tracing::info!("Loaded base configuration from specified file: {}", path);
                }
                Err(e) => {
                    tracing::error!("Failed to load specified config file '{}': {}", path, e);
                    return Err(AppError::Config(format!(
                        "Failed to load specified configuration file '{}': {}",
                        path, e
                    )));
                }
            }
        } else if !self.skip_default_locations {
            tracing::debug!("No config file specified, checking default locations.");
            for path_str in ["./email-courier.toml", "./config.toml"] {
                if Path::new(path_str).exists() {
                    tracing::debug!("Found potential default config file: {}", path_str);
                    match load_config_file(path_str) {
                        Ok(file_config) => {
                            apply_file_config(&mut self.config, &file_config, base_dir(path_str))?;
                            loaded_path = Some(path_str.to_string());
                            tracing::info!(
                                "Loaded base configuration from default location: {}",
                                path_str
                            );
                            break;
                        }
                        Err(e) => {
                            tracing::warn!(
                                "Failed to load or parse default config '{}': {}",
                                path_str,
                                e
                            );
                        }
                    }
                }
            }
            if loaded_path.is_none() {
                tracing::info!("No configuration file found. Using default values and overrides.");
            }
        }

        apply_file_config(&mut self.config, &self.overrides, None)?;
        self.config.loaded_config_path = loaded_path;
        validate_config(&mut self.config)?;

        tracing::debug!("Final configuration built successfully.");
        Ok(self.config)
    }
}

/// Relative `body_file` entries in a config file resolve against the file's directory.
fn base_dir(config_path: &str) -> Option<PathBuf> {
    Path::new(config_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_build() {
        let config = ConfigBuilder::new()
            .skip_default_locations()
            .build()
            .expect("default config should validate");
        assert_eq!(config.queries.len(), 20);
        assert_eq!(config.results_per_query, 5);
        assert_eq!(config.log_capacity, 100);
        assert!(config.loaded_config_path.is_none());
    }

    #[test]
    fn test_file_then_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("courier.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[pipeline]
queries = ["rust jobs", "go jobs"]
results_per_query = 3

[message]
subject = "Hello"

[smtp]
username = "me@example.com"
"#
        )
        .unwrap();

        let config = ConfigBuilder::new()
            .config_file(path.to_string_lossy())
            .results_per_query(8)
            .build()
            .unwrap();

        assert_eq!(config.queries, vec!["rust jobs", "go jobs"]);
        assert_eq!(config.results_per_query, 8);
        assert_eq!(config.subject, "Hello");
        assert_eq!(config.smtp_username.as_deref(), Some("me@example.com"));
        assert!(config.loaded_config_path.is_some());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = ConfigBuilder::new()
            .config_file("/definitely/not/here.toml")
            .build();
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_body_file_relative_to_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("body.txt"), "Body from file").unwrap();
        let path = dir.path().join("courier.toml");
        std::fs::write(&path, "[message]\nbody_file = \"body.txt\"\n").unwrap();

        let config = ConfigBuilder::new()
            .config_file(path.to_string_lossy())
            .build()
            .unwrap();
        assert_eq!(config.body, "Body from file");
    }
}

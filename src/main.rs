//! # Email Courier CLI
//!
//! Command-line interface for the Email Courier library (`email_courier_core`).
//! This binary parses arguments, sets up configuration and logging, initializes
//! the mail transport and page fetchers, runs every configured query, and
//! reports the results.

use email_courier_core::providers::mail::SmtpMailer;
use email_courier_core::{
    initialize_courier, run_pipeline, AppError, Config, ConfigBuilder, LogEntry, LogLevel,
    RunContext, RunListener, RunSummary,
};

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::{File, OpenOptions};
use std::io::BufWriter;
use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::fmt::format::{DefaultFields, Format};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

/// The diagnostic-file layer; empty until the configured log path is known.
type FileLayer = fmt::Layer<Registry, DefaultFields, Format, Mutex<File>>;
type FileLayerHandle = reload::Handle<Option<FileLayer>, Registry>;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Harvests contact addresses from search results and mails each one exactly once.",
    long_about = "Email Courier runs a list of search queries, extracts email addresses from the result pages, and sends one fixed message to every address not already recorded in the sent-recipient ledger."
)]
struct AppArgs {
    /// Path to a configuration file (TOML format) to load settings from. CLI args override file settings.
    #[arg(long, env = "EMAIL_COURIER_CONFIG")]
    config_file: Option<String>,

    /// File with one search query per line. Blank lines and lines starting with '#' are ignored.
    #[arg(short, long, env = "EMAIL_COURIER_QUERIES_FILE")]
    queries_file: Option<String>,

    /// Number of search results to visit per query.
    #[arg(short = 'n', long, env = "EMAIL_COURIER_RESULTS_PER_QUERY")]
    results_per_query: Option<usize>,

    /// Subject line of the outgoing message.
    #[arg(long, env = "EMAIL_COURIER_SUBJECT")]
    subject: Option<String>,

    /// File containing the plain-text message body.
    #[arg(long, env = "EMAIL_COURIER_BODY_FILE")]
    body_file: Option<String>,

    /// Path to the sent-recipient ledger.
    #[arg(short, long, env = "EMAIL_COURIER_LEDGER")]
    ledger: Option<String>,

    /// Path to the diagnostic log file (appended to).
    #[arg(long, env = "EMAIL_COURIER_LOG_FILE")]
    log_file: Option<String>,

    /// Minimum pause after each successful send, in seconds.
    #[arg(long, env = "EMAIL_COURIER_MIN_SEND_DELAY")]
    min_send_delay: Option<f32>,

    /// Maximum pause after each successful send, in seconds. Defaults to the minimum.
    #[arg(long, env = "EMAIL_COURIER_MAX_SEND_DELAY")]
    max_send_delay: Option<f32>,

    /// User agent string for HTTP and headless requests.
    #[arg(long, env = "EMAIL_COURIER_USER_AGENT")]
    user_agent: Option<String>,

    /// HTTP, WebDriver and SMTP timeout in seconds.
    #[arg(long, env = "EMAIL_COURIER_REQUEST_TIMEOUT")]
    request_timeout: Option<u64>,

    /// URL of a running WebDriver instance. When set, pages are rendered in headless Chrome.
    #[arg(long, env = "EMAIL_COURIER_WEBDRIVER_URL")]
    webdriver_url: Option<String>,

    /// SMTP relay host.
    #[arg(long, env = "EMAIL_COURIER_SMTP_HOST")]
    smtp_host: Option<String>,

    /// SMTP relay port (STARTTLS).
    #[arg(long, env = "EMAIL_COURIER_SMTP_PORT")]
    smtp_port: Option<u16>,

    /// SMTP username.
    #[arg(long, env = "EMAIL_COURIER_SMTP_USERNAME")]
    smtp_username: Option<String>,

    /// SMTP password (an app password for Gmail).
    #[arg(long, env = "EMAIL_COURIER_SMTP_PASSWORD", hide_env_values = true)]
    smtp_password: Option<String>,

    /// Sender address. Defaults to the SMTP username.
    #[arg(long, env = "EMAIL_COURIER_FROM")]
    from: Option<String>,

    /// Write the run summary as JSON to this path.
    #[arg(long, env = "EMAIL_COURIER_REPORT")]
    report: Option<String>,

    /// Skip the SMTP login check before the run starts.
    #[arg(long, default_value = "false", env = "EMAIL_COURIER_SKIP_SMTP_CHECK")]
    skip_smtp_check: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = AppArgs::parse();

    let file_log = init_tracing()?;
    let config = build_config(&args)?;
    attach_log_file(&file_log, &config.diagnostic_log_path)?;

    tracing::info!(
        "Email Courier CLI v{} starting...",
        env!("CARGO_PKG_VERSION")
    );
    if let Some(ref path) = config.loaded_config_path {
        tracing::info!("Loaded configuration file '{}'", path);
    }
    tracing::debug!("Effective configuration loaded: {:?}", config);

    let mailer = match SmtpMailer::new(&config) {
        Ok(m) => m,
        Err(e) => {
            tracing::error!("Initialization error: {}", e);
            return Err(anyhow::anyhow!("Failed to initialize SMTP mailer: {}", e));
        }
    };

    if args.skip_smtp_check {
        tracing::info!("Skipping SMTP login check.");
    } else {
        match mailer.test_connection().await {
            Ok(()) => tracing::info!(
                "SMTP login to {}:{} succeeded.",
                config.smtp_host,
                config.smtp_port
            ),
            Err(e) => {
                tracing::error!("SMTP connectivity test failed: {}", e);
                tracing::warn!("Every send in this run will likely fail. Check credentials, host and port.");
            }
        }
    }

    let courier = match initialize_courier(&config, Arc::new(mailer)) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Initialization error: {}", e);
            return Err(anyhow::anyhow!("Failed to initialize pipeline: {}", e));
        }
    };

    let progress_bar = ProgressBar::new(config.queries.len() as u64);
    progress_bar.set_style(ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) | ETA: {eta} | {msg}")
        .context("Failed to set progress bar template")?
        .progress_chars("=> "));
    progress_bar.set_message("Starting...");

    let mut ctx = RunContext::new(config.log_capacity).with_listener(Box::new(ProgressReporter {
        bar: progress_bar.clone(),
        total: config.queries.len() as u64,
    }));

    let stop = ctx.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Ctrl-C received. Finishing the current query, then stopping.");
            stop.store(true, Ordering::SeqCst);
        }
    });

    let result = run_pipeline(&config, &courier, &mut ctx).await;

    let summary = match result {
        Ok(summary) => summary,
        Err(e) => {
            progress_bar.abandon_with_message("Run aborted");
            if let AppError::Ledger(ref ledger_error) = e {
                tracing::error!(target: "ledger",
                    "Ledger failure: {}. The ledger at '{}' may be missing the last sent address; fix the file before running again.",
                    ledger_error, config.ledger_path.display());
            }
            tracing::error!("Execution failed: {}", e);
            return Err(anyhow::anyhow!("Run aborted: {}", e));
        }
    };

    progress_bar.finish_with_message(format!("Processed {} queries", summary.queries_processed));

    if let Some(ref path) = args.report {
        tracing::info!("Saving run report to '{}'...", path);
        save_report(&summary, path)?;
        tracing::info!("Run report saved successfully.");
    }

    log_summary(&summary, summary.elapsed);
    Ok(())
}

/// Layers defaults, the config file and CLI/env overrides.
fn build_config(args: &AppArgs) -> Result<Config> {
    let mut config_builder = ConfigBuilder::new();

    if let Some(ref path) = args.config_file {
        config_builder = config_builder.config_file(path);
    }
    if let Some(ref path) = args.queries_file {
        config_builder = config_builder.queries(load_queries(path)?);
    }
    if let Some(n) = args.results_per_query {
        config_builder = config_builder.results_per_query(n);
    }
    if let Some(ref s) = args.subject {
        config_builder = config_builder.subject(s);
    }
    if let Some(ref path) = args.body_file {
        config_builder = config_builder.body_file(path);
    }
    if let Some(ref path) = args.ledger {
        config_builder = config_builder.ledger_path(path);
    }
    if let Some(ref path) = args.log_file {
        config_builder = config_builder.diagnostic_log_path(path);
    }
    if let Some(min) = args.min_send_delay {
        let max = args.max_send_delay.unwrap_or(min);
        config_builder = config_builder.send_delay(min, max);
    } else if args.max_send_delay.is_some() {
        return Err(anyhow::anyhow!(
            "--max-send-delay requires --min-send-delay"
        ));
    }
    if let Some(ref ua) = args.user_agent {
        config_builder = config_builder.user_agent(ua);
    }
    if let Some(t) = args.request_timeout {
        config_builder = config_builder.request_timeout(Duration::from_secs(t));
    }
    if let Some(ref url) = args.webdriver_url {
        config_builder = config_builder.webdriver_url(Some(url));
    }
    if let Some(ref host) = args.smtp_host {
        config_builder = config_builder.smtp_host(host);
    }
    if let Some(port) = args.smtp_port {
        config_builder = config_builder.smtp_port(port);
    }
    if let Some(ref user) = args.smtp_username {
        config_builder = config_builder.smtp_username(user);
    }
    if let Some(ref password) = args.smtp_password {
        config_builder = config_builder.smtp_password(password);
    }
    if let Some(ref from) = args.from {
        config_builder = config_builder.from_address(from);
    }

    config_builder
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build configuration: {}", e))
}

/// Console output behind one `EnvFilter`, plus a slot for the diagnostic log file.
///
/// Installed before the configuration is built so loading and validation
/// warnings reach the console.
fn init_tracing() -> Result<FileLayerHandle> {
    let (subscriber, file_handle) = build_subscriber();
    subscriber
        .try_init()
        .context("Setting up tracing subscriber failed")?;
    Ok(file_handle)
}

fn build_subscriber() -> (impl tracing::Subscriber + Send + Sync, FileLayerHandle) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (file_layer, file_handle) = reload::Layer::new(None::<FileLayer>);
    let console_layer = fmt::layer().with_target(true).compact();

    let subscriber = tracing_subscriber::registry()
        .with(file_layer)
        .with(env_filter)
        .with(console_layer);
    (subscriber, file_handle)
}

/// Starts appending every event to the diagnostic log file at `log_path`.
fn attach_log_file(handle: &FileLayerHandle, log_path: &Path) -> Result<()> {
    if let Some(parent) = log_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create log directory '{}'", parent.display())
            })?;
        }
    }
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("Failed to open log file '{}'", log_path.display()))?;

    let file_layer: FileLayer = fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .with_writer(Mutex::new(log_file));
    handle
        .reload(Some(file_layer))
        .context("Attaching the diagnostic log file failed")?;
    tracing::debug!("Diagnostic log attached at '{}'", log_path.display());
    Ok(())
}

fn load_queries(file_path: &str) -> Result<Vec<String>> {
    tracing::debug!("Reading queries from: {}", file_path);
    let content = std::fs::read_to_string(file_path)
        .with_context(|| format!("Failed to read queries file '{}'", file_path))?;
    let queries: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect();
    if queries.is_empty() {
        return Err(anyhow::anyhow!(
            "Queries file '{}' contains no queries",
            file_path
        ));
    }
    Ok(queries)
}

/// Saves the run summary to the specified JSON file.
fn save_report(summary: &RunSummary, file_path: &str) -> Result<()> {
    let output_path = Path::new(file_path);
    if let Some(parent_dir) = output_path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            std::fs::create_dir_all(parent_dir).with_context(|| {
                format!(
                    "Failed to create output directory '{}'",
                    parent_dir.display()
                )
            })?;
        }
    }
    let file = File::create(file_path)
        .with_context(|| format!("Failed to create/truncate report file '{}'", file_path))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, summary)
        .with_context(|| format!("Failed to serialize run report to JSON for '{}'", file_path))?;
    Ok(())
}

/// Logs a summary of the run to the console using `tracing::info`.
fn log_summary(summary: &RunSummary, duration: Duration) {
    tracing::info!("-------------------- Run Summary --------------------");
    tracing::info!("Queries Configured          : {}", summary.total_queries);
    tracing::info!("Queries Processed           : {}", summary.queries_processed);
    tracing::info!("  - Search Failures         : {}", summary.queries_failed);
    tracing::info!("  - Unreachable Pages       : {}", summary.links_failed);
    tracing::info!("Emails Sent                 : {}", summary.sent);
    tracing::info!("  - Skipped (Already Sent)  : {}", summary.skipped_duplicate);
    tracing::info!("  - Skipped (Invalid)       : {}", summary.skipped_invalid);
    tracing::info!("  - Send Failures           : {}", summary.send_failed);
    if summary.stopped_early {
        tracing::warn!("Run was stopped before all queries were processed.");
    }
    tracing::info!("Total Time Taken            : {:.2?}", duration);
    tracing::info!("-----------------------------------------------------");
}

/// Mirrors run progress and the latest log line onto the progress bar.
struct ProgressReporter {
    bar: ProgressBar,
    total: u64,
}

impl RunListener for ProgressReporter {
    fn on_log(&mut self, entry: &LogEntry) {
        if entry.level != LogLevel::Info || entry.message.starts_with('🔍') {
            self.bar.set_message(entry.message.clone());
        }
    }

    fn on_progress(&mut self, fraction: f64) {
        self.bar
            .set_position((fraction * self.total as f64).round() as u64);
    }
}

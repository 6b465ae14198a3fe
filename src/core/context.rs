//! Per-run state: the rolling operator log, the progress fraction and the stop flag.

use crate::core::models::{LogEntry, LogLevel};
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Receives log lines and progress updates as they happen.
///
/// The CLI uses this to drive its progress bar; the default methods ignore everything.
pub trait RunListener: Send {
    fn on_log(&mut self, _entry: &LogEntry) {}
    fn on_progress(&mut self, _fraction: f64) {}
}

/// Owns everything the dispatch loop reports while it runs.
///
/// The log keeps only the newest `capacity` lines. Every line is also emitted
/// as a `tracing` event, so the diagnostic log file keeps the full history.
pub struct RunContext {
    entries: VecDeque<LogEntry>,
    capacity: usize,
    progress: f64,
    listener: Option<Box<dyn RunListener>>,
    stop: Arc<AtomicBool>,
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("entries", &self.entries.len())
            .field("capacity", &self.capacity)
            .field("progress", &self.progress)
            .field("stop_requested", &self.stop_requested())
            .finish()
    }
}

impl RunContext {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            progress: 0.0,
            listener: None,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_listener(mut self, listener: Box<dyn RunListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Info, message.into());
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Warn, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Error, message.into());
    }

    fn push(&mut self, level: LogLevel, message: String) {
        match level {
            LogLevel::Info => tracing::info!(target: "run_log", "{}", message),
            LogLevel::Warn => tracing::warn!(target: "run_log", "{}", message),
            LogLevel::Error => tracing::error!(target: "run_log", "{}", message),
        }

        let entry = LogEntry {
            at: Utc::now(),
            level,
            message,
        };
        if let Some(listener) = self.listener.as_mut() {
            listener.on_log(&entry);
        }

        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Records that `done` of `total` queries have been processed.
    ///
    /// Progress never moves backwards; a smaller value than the current one is ignored.
    pub fn set_progress(&mut self, done: usize, total: usize) -> f64 {
        let fraction = if total == 0 {
            1.0
        } else {
            done.min(total) as f64 / total as f64
        };
        if fraction > self.progress {
            self.progress = fraction;
        }
        let current = self.progress;
        if let Some(listener) = self.listener.as_mut() {
            listener.on_progress(current);
        }
        current
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// The retained log lines, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Renders the retained log as newline-separated text.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// A handle that can request a stop from another task (e.g. a Ctrl-C handler).
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }
}

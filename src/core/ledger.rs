//! The sent-recipient ledger: the durable record of every address already messaged.
//!
//! The on-disk format is plain text, one address per line, newline-terminated,
//! append-only. Lines are never rewritten or removed.

use crate::core::error::LedgerError;
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Membership test plus durable append. Implemented by [`FileLedger`]; tests
/// substitute their own.
pub trait RecipientLedger {
    /// True when `address` was recorded by a previous run or by this process.
    fn contains(&self, address: &str) -> bool;

    /// Durably records `address`. Returns only after the write has reached the disk.
    fn record(&mut self, address: &str) -> Result<(), LedgerError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// File-backed ledger, loaded once at startup and appended to after each send.
#[derive(Debug)]
pub struct FileLedger {
    path: PathBuf,
    sent: HashSet<String>,
    /// The file's last line is unterminated (torn write or hand edit).
    needs_separator: bool,
}

impl FileLedger {
    /// Loads the ledger at `path`. A missing file is an empty ledger; the file is
    /// created on the first `record`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref().to_path_buf();
        let (sent, needs_separator) = match fs::read_to_string(&path) {
            Ok(content) => {
                let sent: HashSet<String> = content
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(String::from)
                    .collect();
                let needs_separator = !content.is_empty() && !content.ends_with('\n');
                if needs_separator {
                    tracing::warn!(target: "ledger", "Ledger '{}' ends without a newline; the next record starts on a new line.", path.display());
                }
                (sent, needs_separator)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(target: "ledger", "No ledger at '{}' yet; starting empty.", path.display());
                (HashSet::new(), false)
            }
            Err(source) => return Err(LedgerError::Load { path, source }),
        };

        tracing::info!(target: "ledger", "Loaded {} previously sent addresses from '{}'.", sent.len(), path.display());
        Ok(Self {
            path,
            sent,
            needs_separator,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append_line(&self, address: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let line = if self.needs_separator {
            format!("\n{}\n", address)
        } else {
            format!("{}\n", address)
        };
        file.write_all(line.as_bytes())?;
        file.flush()?;
        file.sync_data()
    }
}

impl RecipientLedger for FileLedger {
    fn contains(&self, address: &str) -> bool {
        self.sent.contains(address)
    }

    fn record(&mut self, address: &str) -> Result<(), LedgerError> {
        if address.contains(['\n', '\r']) || address.trim().is_empty() {
            return Err(LedgerError::Write {
                path: self.path.clone(),
                address: address.to_string(),
                source: io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "address is empty or spans multiple lines",
                ),
            });
        }

        self.append_line(address)
            .map_err(|source| LedgerError::Write {
                path: self.path.clone(),
                address: address.to_string(),
                source,
            })?;
        self.needs_separator = false;
        self.sent.insert(address.to_string());
        tracing::debug!(target: "ledger", "Recorded '{}' in '{}'.", address, self.path.display());
        Ok(())
    }

    fn len(&self) -> usize {
        self.sent.len()
    }
}

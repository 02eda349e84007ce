//! Append-only scan log
//!
//! One line per classified document: `<path>: <matched phrases | Applicable>`.
//! The file is opened, appended and closed for every entry; a mutex keeps
//! concurrent writers in this process from interleaving lines.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::classification::ClassificationResult;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub path: String,
    pub label: String,
}

impl LogEntry {
    pub fn new(path: impl Into<String>, result: &ClassificationResult) -> Self {
        Self {
            path: path.into(),
            label: result.log_label(),
        }
    }

    pub fn for_path(path: &Path, result: &ClassificationResult) -> Self {
        Self::new(path.display().to_string(), result)
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.label)
    }
}

#[derive(Debug)]
pub struct ScanLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ScanLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry, creating the file if needed
    pub fn append(&self, entry: &LogEntry) -> Result<()> {
        let line = format!("{}\n", entry);
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }
}

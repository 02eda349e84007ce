//! Error taxonomy shared by the CLI and the HTTP server.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    /// Input path does not exist
    #[error("File '{}' does not exist.", .0.display())]
    FileNotFound(PathBuf),

    /// Corrupt, encrypted or otherwise undecodable PDF
    #[error("Error reading PDF: {0}")]
    Extraction(String),

    /// Model endpoint unreachable, timed out, or answered with a non-2xx status
    #[error("Model request failed: {0}")]
    Communication(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ScanError>;

//! PDF text extraction wrapper
//!
//! Wraps the pdf-extract crate with error handling for:
//! - Missing files
//! - Encrypted or corrupted PDFs
//! - Panics inside the decoder on malformed input

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use crate::error::{Result, ScanError};

/// Form feed emitted by pdf-extract between pages
const PAGE_BREAK: char = '\x0C';

/// Where the PDF comes from
#[derive(Debug, Clone, Copy)]
pub enum PdfSource<'a> {
    Path(&'a Path),
    Bytes(&'a [u8]),
}

/// Extract the full text of a PDF, pages concatenated in order
pub fn extract_text(source: PdfSource<'_>) -> Result<String> {
    match source {
        PdfSource::Path(path) => extract_text_from_path(path),
        PdfSource::Bytes(bytes) => extract_text_from_pdf(bytes),
    }
}

/// Read a PDF from disk and extract its text
pub fn extract_text_from_path(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(ScanError::FileNotFound(path.to_path_buf()));
    }
    let bytes = std::fs::read(path)?;
    let text = extract_text_from_pdf(&bytes)?;
    tracing::debug!(path = %path.display(), chars = text.len(), "extracted pdf text");
    Ok(text)
}

/// Extract full text from PDF bytes
pub fn extract_text_from_pdf(pdf_bytes: &[u8]) -> Result<String> {
    // pdf-extract panics on some malformed inputs instead of returning Err
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem(pdf_bytes)
    }));

    match outcome {
        Ok(Ok(text)) => Ok(text.chars().filter(|&c| c != PAGE_BREAK).collect()),
        Ok(Err(e)) => Err(ScanError::Extraction(e.to_string())),
        Err(payload) => {
            let msg = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "decoder panicked".to_string());
            Err(ScanError::Extraction(msg))
        }
    }
}

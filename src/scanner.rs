//! Scan a PDF on disk: extract, classify, log.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::classification::{ClassificationResult, Classifier};
use crate::error::{Result, ScanError};
use crate::pdf_extractor::{self, PdfSource};
use crate::scan_log::{LogEntry, ScanLog};

/// A successfully scanned and logged document
#[derive(Debug, Clone, Serialize)]
pub struct ScanOutcome {
    pub path: PathBuf,
    #[serde(flatten)]
    pub result: ClassificationResult,
    #[serde(skip)]
    pub entry: LogEntry,
}

/// Extract the text of the PDF at `path` off the async executor
pub async fn extract_path(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(ScanError::FileNotFound(path.to_path_buf()));
    }
    let owned = path.to_path_buf();
    tokio::task::spawn_blocking(move || pdf_extractor::extract_text(PdfSource::Path(&owned)))
        .await
        .map_err(|e| ScanError::Extraction(format!("extraction task failed: {}", e)))?
}

/// Classify one PDF and append its log entry.
///
/// Nothing is logged when extraction or classification fails.
pub async fn scan_pdf(path: &Path, classifier: &dyn Classifier, log: &ScanLog) -> Result<ScanOutcome> {
    let text = extract_path(path).await?;
    let result = classifier.classify(&text).await?;

    let entry = LogEntry::for_path(path, &result);
    log.append(&entry)?;

    tracing::info!(
        path = %path.display(),
        strategy = %result.strategy,
        matched = result.matched.len(),
        "scan logged"
    );

    Ok(ScanOutcome {
        path: path.to_path_buf(),
        result,
        entry,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::{ClassificationResult, Strategy};
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct Unreachable;

    #[async_trait]
    impl Classifier for Unreachable {
        fn strategy(&self) -> Strategy {
            Strategy::Model
        }

        async fn classify(&self, _text: &str) -> Result<ClassificationResult> {
            Err(ScanError::Communication("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_missing_file_not_logged() {
        let dir = TempDir::new().unwrap();
        let log = ScanLog::new(dir.path().join("scan_log.txt"));

        let err = scan_pdf(&dir.path().join("missing.pdf"), &Unreachable, &log).await.unwrap_err();
        assert!(matches!(err, ScanError::FileNotFound(_)));
        assert!(!log.path().exists());
    }
}

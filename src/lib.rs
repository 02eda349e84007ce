//! Scholarship eligibility scanning.
//!
//! Extracts text from PDFs and decides whether a document restricts who may
//! apply, either by local phrase matching or by asking a language model.

pub mod ai_client;
pub mod classification;
pub mod error;
pub mod http_server;
pub mod pdf_extractor;
pub mod phrases;
pub mod reply_parser;
pub mod scan_log;
pub mod scanner;
pub mod settings;
pub mod utils;

pub use classification::{build_classifier, ClassificationResult, Classifier, Strategy};
pub use error::ScanError;
pub use settings::Settings;

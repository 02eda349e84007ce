//! HTTP service for document classification
//!
//! Routes:
//! - GET  /         - Upload form
//! - POST /upload   - Classify an uploaded PDF (multipart field `pdf_file`)
//! - POST /analyze  - Classify raw text (`{"prompt"?: ..., "content": ...}`)
//! - GET  /health   - Liveness and configured strategy

use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::Arc;
use std::time::Instant;
use tower_http::limit::RequestBodyLimitLayer;

use crate::classification::{build_classifier, ClassificationResult, Classifier};
use crate::error::ScanError;
use crate::pdf_extractor::{self, PdfSource};
use crate::scan_log::{LogEntry, ScanLog};
use crate::settings::Settings;
use crate::utils::sanitize_filename;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const INDEX_HTML: &str = include_str!("../templates/index.html");

/// Multipart field carrying the document
const FILE_FIELD: &str = "pdf_file";

// ============================================================================
// AppState
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    settings: Arc<Settings>,
    classifier: Arc<dyn Classifier>,
    log: Option<Arc<ScanLog>>,
    start_time: Instant,
}

impl AppState {
    pub fn new(settings: Arc<Settings>, classifier: Arc<dyn Classifier>) -> Self {
        let log = settings
            .server_log_file
            .as_ref()
            .map(|path| Arc::new(ScanLog::new(path.clone())));
        Self {
            settings,
            classifier,
            log,
            start_time: Instant::now(),
        }
    }

    pub fn from_settings(settings: Settings) -> Result<Self, ScanError> {
        let classifier = build_classifier(&settings, settings.strategy)?;
        Ok(Self::new(Arc::new(settings), classifier))
    }
}

// ============================================================================
// Error type
// ============================================================================

pub struct AppError(StatusCode, String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.0, Json(serde_json::json!({"error": self.1}))).into_response()
    }
}

impl From<ScanError> for AppError {
    fn from(e: ScanError) -> Self {
        AppError(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    }
}

fn bad_request(msg: impl Into<String>) -> AppError {
    AppError(StatusCode::BAD_REQUEST, msg.into())
}

fn internal(msg: impl Into<String>) -> AppError {
    AppError(StatusCode::INTERNAL_SERVER_ERROR, msg.into())
}

// ============================================================================
// Request / Response types
// ============================================================================

#[derive(Serialize)]
struct UploadResponse {
    filename: String,
    #[serde(flatten)]
    result: ClassificationResult,
}

#[derive(Deserialize)]
struct AnalyzeRequest {
    #[serde(default)]
    prompt: Option<String>,
    content: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    strategy: String,
    uptime_secs: u64,
}

// ============================================================================
// Handlers
// ============================================================================

// GET /
async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

// POST /upload
async fn upload_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    // Not a multipart body at all: same answer as a form without the field
    let mut multipart = multipart.map_err(|_| bad_request("No file provided"))?;

    let (filename, bytes) = loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| AppError(e.status(), e.body_text()))?
            .ok_or_else(|| bad_request("No file provided"))?;

        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or("").to_string();
        if filename.is_empty() {
            return Err(bad_request("No file selected"));
        }
        if !filename.ends_with(".pdf") {
            return Err(bad_request("Only PDF files are allowed"));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError(e.status(), e.body_text()))?;
        break (sanitize_filename(&filename), bytes);
    };

    let upload_dir = state.settings.upload_dir.clone();
    let text = tokio::task::spawn_blocking(move || extract_staged(&upload_dir, &bytes))
        .await
        .map_err(|e| internal(format!("extraction task failed: {}", e)))?
        .map_err(|e| {
            tracing::warn!(file = %filename, error = %e, "upload extraction failed");
            AppError::from(e)
        })?;

    let result = state.classifier.classify(&text).await.map_err(|e| {
        tracing::warn!(file = %filename, error = %e, "upload classification failed");
        AppError::from(e)
    })?;

    if let Some(log) = &state.log {
        log.append(&LogEntry::new(filename.clone(), &result))?;
    }

    tracing::info!(
        "[POST /upload] {} -> {} ({} matched)",
        filename,
        result.status(),
        result.matched.len()
    );

    Ok(Json(UploadResponse { filename, result }))
}

/// Stage the upload in a temporary file, extract, and let the guard delete it
fn extract_staged(upload_dir: &std::path::Path, bytes: &[u8]) -> Result<String, ScanError> {
    std::fs::create_dir_all(upload_dir)?;
    let mut staged = tempfile::Builder::new()
        .prefix("upload-")
        .suffix(".pdf")
        .tempfile_in(upload_dir)?;
    staged.write_all(bytes)?;
    staged.flush()?;

    pdf_extractor::extract_text(PdfSource::Path(staged.path()))
}

// POST /analyze
async fn analyze_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ClassificationResult>, AppError> {
    let req: AnalyzeRequest = serde_json::from_slice(&body)
        .map_err(|e| bad_request(format!("Invalid request body: {}", e)))?;

    let result = match req.prompt.as_deref() {
        Some(prompt) => state.classifier.classify_with_instruction(&req.content, prompt).await,
        None => state.classifier.classify(&req.content).await,
    }
    .map_err(|e| {
        tracing::warn!(error = %e, "analyze failed");
        AppError::from(e)
    })?;

    tracing::info!("[POST /analyze] {} chars -> {}", req.content.len(), result.status());

    Ok(Json(result))
}

// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: VERSION.to_string(),
        strategy: state.classifier.strategy().to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

// ============================================================================
// Router / serve
// ============================================================================

pub fn router(state: AppState) -> Router {
    let limit = state.settings.max_upload_bytes;
    Router::new()
        .route("/", get(index_handler))
        .route("/upload", post(upload_handler))
        .route("/analyze", post(analyze_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(limit))
        .with_state(state)
}

/// Bind and serve until Ctrl-C
pub async fn serve(state: AppState, bind_addr: &str) -> Result<(), ScanError> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("[Server] Listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("[Server] Shutting down");
        })
        .await?;
    Ok(())
}

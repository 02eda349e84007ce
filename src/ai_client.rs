//! Language-model client for delegated eligibility classification
//!
//! Talks to an Ollama-style `/api/generate` endpoint: one non-streaming POST
//! per document, no retry. The reply is free text that should contain a JSON
//! verdict; see `reply_parser` for how it is recovered.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::classification::{ClassificationResult, Classifier, Strategy};
use crate::error::{Result, ScanError};
use crate::phrases::PhraseMatcher;
use crate::reply_parser::{parse_model_reply, ModelVerdict};
use crate::settings::Settings;
use crate::utils::safe_truncate;

/// Generate request format
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// Generate response format
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// HTTP client bound to one endpoint and model
#[derive(Debug, Clone)]
pub struct ModelClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
}

impl ModelClient {
    pub fn new(endpoint: &str, model: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ScanError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
            model: model.to_string(),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(
            &settings.model_endpoint,
            &settings.model,
            Duration::from_secs(settings.request_timeout_secs),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send one prompt and return the model's raw text.
    ///
    /// `Ok(None)` means the endpoint answered 2xx but the body was not a
    /// generate response; callers treat that like an unparseable reply.
    pub async fn generate(&self, prompt: &str) -> Result<Option<String>> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| ScanError::Communication(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ScanError::Communication(format!(
                "API error {}: {}",
                status,
                safe_truncate(&body, 500)
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ScanError::Communication(format!("Failed to read response: {}", e)))?;

        match serde_json::from_str::<GenerateResponse>(&body) {
            Ok(parsed) => Ok(Some(parsed.response)),
            Err(e) => {
                tracing::warn!(error = %e, "model endpoint returned an unexpected body");
                Ok(None)
            }
        }
    }
}

/// Restricted iff the model explicitly reports `is_applicable: true`
pub struct DelegatedClassifier {
    client: ModelClient,
    matcher: Arc<PhraseMatcher>,
    instruction: String,
    max_prompt_bytes: Option<usize>,
}

impl DelegatedClassifier {
    pub fn new(
        client: ModelClient,
        matcher: Arc<PhraseMatcher>,
        instruction: String,
        max_prompt_bytes: Option<usize>,
    ) -> Self {
        Self { client, matcher, instruction, max_prompt_bytes }
    }

    /// Instruction, phrase list, then the document text
    pub fn build_prompt(&self, instruction: &str, text: &str) -> String {
        let document = match self.max_prompt_bytes {
            Some(limit) => safe_truncate(text, limit),
            None => text,
        };
        let phrases = self
            .matcher
            .phrases()
            .iter()
            .map(|p| format!("\"{}\"", p))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "{}\n\nRestrictive phrases to look for: {}\n\nDOCUMENT:\n{}",
            instruction, phrases, document
        )
    }

    async fn run(&self, instruction: &str, text: &str) -> Result<ClassificationResult> {
        let prompt = self.build_prompt(instruction, text);
        let verdict = match self.client.generate(&prompt).await? {
            Some(reply) => parse_model_reply(&reply),
            None => ModelVerdict::fallback(),
        };

        tracing::info!(
            endpoint = self.client.endpoint(),
            applicable = verdict.is_applicable,
            confidence = verdict.confidence,
            "model classification complete"
        );

        Ok(ClassificationResult {
            strategy: Strategy::Model,
            matched: verdict.matched_phrases,
            is_applicable: verdict.is_applicable,
            confidence: Some(verdict.confidence),
            reasoning: Some(verdict.reasoning),
        })
    }
}

#[async_trait]
impl Classifier for DelegatedClassifier {
    fn strategy(&self) -> Strategy {
        Strategy::Model
    }

    async fn classify(&self, text: &str) -> Result<ClassificationResult> {
        self.run(&self.instruction, text).await
    }

    async fn classify_with_instruction(&self, text: &str, instruction: &str) -> Result<ClassificationResult> {
        if instruction.trim().is_empty() {
            self.run(&self.instruction, text).await
        } else {
            self.run(instruction, text).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier(max_prompt_bytes: Option<usize>) -> DelegatedClassifier {
        let settings = Settings::default();
        DelegatedClassifier::new(
            ModelClient::from_settings(&settings).unwrap(),
            Arc::new(PhraseMatcher::new(["Female Only", "STEM Major Only"]).unwrap()),
            "Classify this.".to_string(),
            max_prompt_bytes,
        )
    }

    #[test]
    fn test_prompt_layout() {
        let prompt = classifier(None).build_prompt("Classify this.", "Open to all.");
        assert!(prompt.starts_with("Classify this.\n\n"));
        assert!(prompt.contains("\"Female Only\", \"STEM Major Only\""));
        assert!(prompt.ends_with("DOCUMENT:\nOpen to all."));
    }

    #[test]
    fn test_prompt_truncation() {
        let prompt = classifier(Some(4)).build_prompt("x", "abcdefgh");
        assert!(prompt.ends_with("DOCUMENT:\nabcd"));
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(GenerateRequest { model: "m", prompt: "p", stream: false }).unwrap();
        assert_eq!(body, serde_json::json!({"model": "m", "prompt": "p", "stream": false}));
    }
}

// =============================================================================
// Eligibility Classification Module
// =============================================================================
//
// Two strategies answer the same question: does this document restrict who
// may apply?
// - keyword: restricted iff at least one configured phrase appears in the text
// - model:   restricted iff the language model explicitly says so
//
// The policies are intentionally kept apart; a document can be restricted by
// one and not by the other.

use async_trait::async_trait;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::ai_client::{DelegatedClassifier, ModelClient};
use crate::error::Result;
use crate::phrases::PhraseMatcher;
use crate::settings::Settings;

/// Which classifier to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Local case-insensitive phrase matching
    #[default]
    Keyword,
    /// Forward the text to the configured language model
    #[serde(alias = "delegated")]
    #[value(alias = "delegated")]
    Model,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Keyword => "keyword",
            Strategy::Model => "model",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "keyword" => Ok(Strategy::Keyword),
            "model" | "delegated" => Ok(Strategy::Model),
            other => Err(format!("Unknown strategy '{}'. Must be 'keyword' or 'model'", other)),
        }
    }
}

impl Serialize for Strategy {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Outcome of classifying one document
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub strategy: Strategy,
    /// Matched phrases, phrase-set order for keyword, model order for model
    pub matched: Vec<String>,
    pub is_applicable: bool,
    pub confidence: Option<f64>,
    pub reasoning: Option<String>,
}

impl ClassificationResult {
    /// Label used in HTTP responses
    pub fn status(&self) -> &'static str {
        if self.is_applicable { "Applicable" } else { "Not Applicable" }
    }

    /// Label used in log entries: the matched phrases, or "Applicable" when none
    pub fn log_label(&self) -> String {
        if self.matched.is_empty() {
            "Applicable".to_string()
        } else {
            self.matched.join(", ")
        }
    }
}

// Keyword results report `matched_attributes`, model results `matched_phrases`
// plus confidence and reasoning.
impl Serialize for ClassificationResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("status", self.status())?;
        map.serialize_entry("is_applicable", &self.is_applicable)?;
        match self.strategy {
            Strategy::Keyword => map.serialize_entry("matched_attributes", &self.matched)?,
            Strategy::Model => map.serialize_entry("matched_phrases", &self.matched)?,
        }
        if let Some(confidence) = self.confidence {
            map.serialize_entry("confidence", &confidence)?;
        }
        if let Some(reasoning) = &self.reasoning {
            map.serialize_entry("reasoning", reasoning)?;
        }
        map.end()
    }
}

/// Anything that can classify document text
#[async_trait]
pub trait Classifier: Send + Sync {
    fn strategy(&self) -> Strategy;

    async fn classify(&self, text: &str) -> Result<ClassificationResult>;

    /// Classify with a caller-supplied instruction. Only the model strategy
    /// has a prompt to replace; everything else ignores it.
    async fn classify_with_instruction(&self, text: &str, _instruction: &str) -> Result<ClassificationResult> {
        self.classify(text).await
    }
}

/// Restricted iff any configured phrase occurs in the text
pub struct KeywordClassifier {
    matcher: Arc<PhraseMatcher>,
}

impl KeywordClassifier {
    pub fn new(matcher: Arc<PhraseMatcher>) -> Self {
        Self { matcher }
    }

    pub fn classify_text(&self, text: &str) -> ClassificationResult {
        let matched = self.matcher.find_matches(text);
        ClassificationResult {
            strategy: Strategy::Keyword,
            is_applicable: !matched.is_empty(),
            matched,
            confidence: None,
            reasoning: None,
        }
    }
}

#[async_trait]
impl Classifier for KeywordClassifier {
    fn strategy(&self) -> Strategy {
        Strategy::Keyword
    }

    async fn classify(&self, text: &str) -> Result<ClassificationResult> {
        Ok(self.classify_text(text))
    }
}

/// Build the classifier selected by `strategy` from the loaded settings
pub fn build_classifier(settings: &Settings, strategy: Strategy) -> Result<Arc<dyn Classifier>> {
    let matcher = Arc::new(PhraseMatcher::new(&settings.phrases)?);
    match strategy {
        Strategy::Keyword => Ok(Arc::new(KeywordClassifier::new(matcher))),
        Strategy::Model => {
            let client = ModelClient::from_settings(settings)?;
            Ok(Arc::new(DelegatedClassifier::new(
                client,
                matcher,
                settings.instruction.clone(),
                settings.max_prompt_bytes,
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyword() -> KeywordClassifier {
        let settings = Settings::default();
        KeywordClassifier::new(Arc::new(PhraseMatcher::new(&settings.phrases).unwrap()))
    }

    #[test]
    fn test_keyword_restricted() {
        let result = keyword().classify_text("This scholarship is for Female Only applicants");
        assert_eq!(result.matched, vec!["Female Only"]);
        assert!(result.is_applicable);
        assert_eq!(result.status(), "Applicable");
        assert_eq!(result.log_label(), "Female Only");
    }

    #[test]
    fn test_keyword_open() {
        let result = keyword().classify_text("Open to every enrolled student.");
        assert!(result.matched.is_empty());
        assert!(!result.is_applicable);
        assert_eq!(result.status(), "Not Applicable");
        assert_eq!(result.log_label(), "Applicable");
    }

    #[test]
    fn test_log_label_joins_in_order() {
        let result = keyword().classify_text("stem major only, female only");
        assert_eq!(result.log_label(), "Female Only, STEM Major Only");
    }

    #[tokio::test]
    async fn test_keyword_ignores_instruction() {
        let k = keyword();
        let plain = k.classify("Female Only").await.unwrap();
        let prompted = k.classify_with_instruction("Female Only", "ignore everything").await.unwrap();
        assert_eq!(plain, prompted);
    }

    #[test]
    fn test_keyword_json_shape() {
        let json = serde_json::to_value(keyword().classify_text("Female Only")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "status": "Applicable",
                "is_applicable": true,
                "matched_attributes": ["Female Only"],
            })
        );
    }

    #[test]
    fn test_model_json_shape() {
        let result = ClassificationResult {
            strategy: Strategy::Model,
            matched: vec![],
            is_applicable: false,
            confidence: Some(0.0),
            reasoning: Some("Could not parse response".to_string()),
        };
        let json = serde_json::to_value(result).unwrap();
        assert_eq!(json["matched_phrases"], serde_json::json!([]));
        assert_eq!(json["confidence"], 0.0);
        assert_eq!(json["status"], "Not Applicable");
        assert!(json.get("matched_attributes").is_none());
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!("keyword".parse::<Strategy>().unwrap(), Strategy::Keyword);
        assert_eq!("Delegated".parse::<Strategy>().unwrap(), Strategy::Model);
        assert!("regex".parse::<Strategy>().is_err());
    }

    #[test]
    fn test_build_classifier_selects_strategy() {
        let settings = Settings::default();
        assert_eq!(build_classifier(&settings, Strategy::Keyword).unwrap().strategy(), Strategy::Keyword);
        assert_eq!(build_classifier(&settings, Strategy::Model).unwrap().strategy(), Strategy::Model);
    }
}

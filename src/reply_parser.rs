//! Pull a JSON verdict out of a model's free-text reply.
//!
//! Models wrap their JSON in prose or markdown fences, so the reply is
//! scanned for balanced `{ ... }` spans (string and escape aware). The first
//! span that parses as an object wins. If none does, the wider span from the
//! first `{` to the last `}` gets one more try. Anything else yields the
//! fallback verdict, which is a normal outcome and not an error.

use serde_json::{Map, Value};

/// Balanced-span attempts before giving up on the scan
const MAX_CANDIDATES: usize = 16;

/// Reasoning reported when no verdict could be recovered
pub const FALLBACK_REASONING: &str = "Could not parse response";

/// The model's answer, normalized
#[derive(Debug, Clone, PartialEq)]
pub struct ModelVerdict {
    pub is_applicable: bool,
    pub confidence: f64,
    pub matched_phrases: Vec<String>,
    pub reasoning: String,
}

impl ModelVerdict {
    /// Not applicable, zero confidence, unparseable
    pub fn fallback() -> Self {
        Self {
            is_applicable: false,
            confidence: 0.0,
            matched_phrases: Vec::new(),
            reasoning: FALLBACK_REASONING.to_string(),
        }
    }

    fn from_object(obj: &Map<String, Value>) -> Self {
        let is_applicable = obj.get("is_applicable").and_then(Value::as_bool) == Some(true);

        let confidence = obj
            .get("confidence")
            .and_then(Value::as_f64)
            .map(|c| c.clamp(0.0, 1.0))
            .unwrap_or(0.0);

        let matched_phrases = obj
            .get("matched_phrases")
            .or_else(|| obj.get("matched_attributes"))
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect())
            .unwrap_or_default();

        let reasoning = obj
            .get("reasoning")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();

        Self { is_applicable, confidence, matched_phrases, reasoning }
    }
}

/// Interpret a raw reply, falling back when no JSON object can be found
pub fn parse_model_reply(text: &str) -> ModelVerdict {
    match extract_json_object(text) {
        Some(obj) => ModelVerdict::from_object(&obj),
        None => {
            tracing::warn!(
                reply = crate::utils::safe_truncate(text, 200),
                "model reply has no parseable JSON object, using fallback verdict"
            );
            ModelVerdict::fallback()
        }
    }
}

/// Find the first JSON object embedded in `text`
pub fn extract_json_object(text: &str) -> Option<Map<String, Value>> {
    for (start, _) in text.match_indices('{').take(MAX_CANDIDATES) {
        if let Some(end) = balanced_end(text, start) {
            if let Some(obj) = parse_object(&text[start..=end]) {
                return Some(obj);
            }
        }
    }

    // Wide span: first '{' to last '}'
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => parse_object(&text[start..=end]),
        _ => None,
    }
}

fn parse_object(span: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(span) {
        Ok(Value::Object(obj)) => Some(obj),
        _ => None,
    }
}

/// Byte index of the `}` closing the `{` at `start`, if the braces balance
fn balanced_end(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, byte) in text.as_bytes()[start..].iter().enumerate() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }
    None
}

//! Phrase matching
//!
//! Each phrase is compiled as an escaped, case-insensitive literal. There are
//! no word boundaries: "Female Only" matches inside "NonFemale Only2025".

use regex::{Regex, RegexBuilder};

use crate::error::{Result, ScanError};

#[derive(Debug, Clone)]
pub struct PhraseMatcher {
    phrases: Vec<String>,
    patterns: Vec<Regex>,
}

impl PhraseMatcher {
    /// Compile a phrase set. Case-insensitive duplicates collapse to the first.
    pub fn new<I, S>(phrases: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut kept: Vec<String> = Vec::new();
        let mut patterns = Vec::new();

        for phrase in phrases {
            let phrase = phrase.as_ref();
            if phrase.trim().is_empty() {
                return Err(ScanError::Config("phrase set contains an empty phrase".to_string()));
            }
            if kept.iter().any(|p| p.to_lowercase() == phrase.to_lowercase()) {
                continue;
            }
            let re = RegexBuilder::new(&regex::escape(phrase))
                .case_insensitive(true)
                .build()
                .map_err(|e| ScanError::Config(format!("phrase '{}': {}", phrase, e)))?;
            kept.push(phrase.to_string());
            patterns.push(re);
        }

        Ok(Self { phrases: kept, patterns })
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    /// Phrases present in `text`, in phrase-set order
    pub fn find_matches(&self, text: &str) -> Vec<String> {
        self.phrases
            .iter()
            .zip(&self.patterns)
            .filter(|(_, re)| re.is_match(text))
            .map(|(phrase, _)| phrase.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> PhraseMatcher {
        PhraseMatcher::new(["Female Only", "STEM Major Only", "Service Member Only", "International only"])
            .unwrap()
    }

    #[test]
    fn test_case_insensitive() {
        let m = matcher();
        let texts = [
            "This scholarship is for Female Only applicants",
            "open to stem major only students",
            "Nothing restrictive here",
            "INTERNATIONAL ONLY",
        ];
        for text in texts {
            assert_eq!(m.find_matches(text), m.find_matches(&text.to_uppercase()), "{}", text);
            assert_eq!(m.find_matches(text), m.find_matches(&text.to_lowercase()), "{}", text);
        }
    }

    #[test]
    fn test_no_matches() {
        assert!(matcher().find_matches("Open to all undergraduate students.").is_empty());
        assert!(matcher().find_matches("").is_empty());
    }

    #[test]
    fn test_matches_inside_word() {
        assert_eq!(matcher().find_matches("NonFemale Only2025"), vec!["Female Only"]);
    }

    #[test]
    fn test_phrase_set_order_not_text_order() {
        let text = "International only. Also Service Member Only. Also female only.";
        assert_eq!(
            matcher().find_matches(text),
            vec!["Female Only", "Service Member Only", "International only"]
        );
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let m = PhraseMatcher::new(["U.S. citizens (only)"]).unwrap();
        assert_eq!(m.find_matches("for u.s. citizens (ONLY)"), vec!["U.S. citizens (only)"]);
        assert!(m.find_matches("for UxSx citizens only").is_empty());
    }

    #[test]
    fn test_duplicates_collapse() {
        let m = PhraseMatcher::new(["Female Only", "female only", "STEM Major Only"]).unwrap();
        assert_eq!(m.phrases(), ["Female Only", "STEM Major Only"]);
    }

    #[test]
    fn test_empty_phrase_rejected() {
        assert!(matches!(PhraseMatcher::new(["Female Only", "  "]), Err(ScanError::Config(_))));
    }

    #[test]
    fn test_deterministic() {
        let m = matcher();
        let text = "Female Only; STEM Major Only";
        assert_eq!(m.find_matches(text), m.find_matches(text));
    }
}

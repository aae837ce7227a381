use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSignals {
    pub normalized_text: String,
    pub language: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TextProcessor;

impl TextProcessor {
    /// Trims and collapses every whitespace run to one space.
    pub fn normalize(&self, text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    pub fn detect_language(&self, text: &str) -> &'static str {
        if text.is_empty() {
            return "unknown";
        }
        if text.chars().any(|ch| ('\u{0900}'..='\u{097F}').contains(&ch)) {
            return "hi";
        }
        if text.is_ascii() {
            return "en";
        }
        "unknown"
    }

    pub fn process(&self, text: Option<&str>) -> Option<TextSignals> {
        let normalized = self.normalize(text?);
        if normalized.is_empty() {
            return None;
        }
        let language = self.detect_language(&normalized).to_string();
        Some(TextSignals {
            normalized_text: normalized,
            language,
        })
    }
}

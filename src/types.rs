use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub type EscalationId = Uuid;

/// Citations are passed through exactly as the provider or officer wrote them.
pub type Citation = Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "High",
            Confidence::Medium => "Medium",
            Confidence::Low => "Low",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryResponse {
    #[serde(rename = "response_text")]
    pub text: String,
    pub confidence: Confidence,
    #[serde(default)]
    pub citations: Vec<Citation>,
    pub escalate: bool,
    pub reason: String,
    #[serde(default)]
    pub audio_output_url: String,
    #[serde(default)]
    pub escalation_id: Option<EscalationId>,
}

impl AdvisoryResponse {
    pub fn new(
        text: impl Into<String>,
        confidence: Confidence,
        citations: Vec<Citation>,
        escalate: bool,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            confidence,
            citations,
            escalate,
            reason: reason.into(),
            audio_output_url: String::new(),
            escalation_id: None,
        }
    }
}

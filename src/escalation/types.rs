use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::types::{AdvisoryResponse, EscalationId};

/// Context key that keeps the model's answer once an officer has replaced it.
pub const ORIGINAL_AI_RESPONSE_KEY: &str = "ai_response_original";

pub const VERIFIED_REASON: &str = "Verified by officer";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationStatus {
    PendingReview,
    Resolved,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Escalation {
    pub id: EscalationId,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub context: Value,
    pub ai_response: AdvisoryResponse,
    pub verified_response: Option<AdvisoryResponse>,
    /// Insertion order, used to keep listing stable when timestamps collide.
    #[serde(skip)]
    pub(crate) sequence: u64,
}

impl Escalation {
    pub fn status(&self) -> EscalationStatus {
        if self.verified_response.is_some() {
            EscalationStatus::Resolved
        } else {
            EscalationStatus::PendingReview
        }
    }

    pub fn original_ai_response(&self) -> Option<&Value> {
        self.context.get(ORIGINAL_AI_RESPONSE_KEY)
    }
}

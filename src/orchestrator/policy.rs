use crate::{
    reasoning::ReasoningOutput,
    types::{AdvisoryResponse, Confidence},
};

pub const LOW_CONFIDENCE_REASON: &str = "AI confidence is Low; escalate to a human expert.";
pub const UNCERTAINTY_REASON: &str = "Model indicated uncertainty; escalate to a human expert.";
pub const FALLBACK_REASON: &str =
    "AI reasoning service is unavailable or returned an invalid response.";
pub const FALLBACK_TEXT: &str = "I can't generate a reliable advisory response right now. \
     Please try again shortly or contact an agriculture officer.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    Escalate { reason: &'static str },
}

/// Low confidence wins over uncertainty when both are reported.
pub fn decide(confidence: Confidence, uncertainty: bool) -> Decision {
    if confidence == Confidence::Low {
        return Decision::Escalate {
            reason: LOW_CONFIDENCE_REASON,
        };
    }
    if uncertainty {
        return Decision::Escalate {
            reason: UNCERTAINTY_REASON,
        };
    }
    Decision::Proceed
}

pub fn advisory_from(output: ReasoningOutput) -> AdvisoryResponse {
    let (escalate, reason) = match decide(output.confidence, output.uncertainty) {
        Decision::Proceed => (false, ""),
        Decision::Escalate { reason } => (true, reason),
    };
    AdvisoryResponse::new(
        output.answer,
        output.confidence,
        output.citations,
        escalate,
        reason,
    )
}

pub fn fallback_response() -> AdvisoryResponse {
    AdvisoryResponse::new(
        FALLBACK_TEXT,
        Confidence::Low,
        Vec::new(),
        true,
        FALLBACK_REASON,
    )
}

use thiserror::Error;

use crate::types::EscalationId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EscalationError {
    #[error("escalation {id} not found")]
    NotFound { id: EscalationId },
}

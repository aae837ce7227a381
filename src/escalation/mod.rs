pub mod error;
pub mod store;
pub mod types;

pub use error::EscalationError;
pub use store::EscalationStore;
pub use types::{Escalation, EscalationStatus, ORIGINAL_AI_RESPONSE_KEY, VERIFIED_REASON};

pub mod error;
pub mod gemini;
pub mod prompt;
pub mod reliability;
pub mod types;

use async_trait::async_trait;
use serde_json::Value;

pub use error::{ProviderError, ProviderErrorKind};
pub use gemini::GeminiProvider;
pub use types::{GenerationConfig, ReasoningConfig, ReasoningOutput, ReliabilityConfig};

/// Produces a structured advisory answer for a normalized request context.
#[async_trait]
pub trait ReasoningProvider: Send + Sync {
    async fn generate(&self, context: &Value) -> Result<ReasoningOutput, ProviderError>;
}

pub mod bhashini;
pub mod error;
pub mod types;
pub mod whisper;

use async_trait::async_trait;

pub use bhashini::BhashiniClient;
pub use error::TranscriptionError;
pub use types::{
    AudioClip, FallbackCommandConfig, TranscriptProvider, Transcription, TranscriptionConfig,
};
pub use whisper::LocalWhisper;

use crate::credentials::{ConfigurationError, CredentialProvider};

/// Turns an uploaded clip into text. Implementations degrade instead of failing.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, clip: &AudioClip) -> Transcription;
}

/// Primary HTTP speech-to-text with a local command as fallback.
pub struct TranscriptionService {
    primary: BhashiniClient,
    fallback: LocalWhisper,
}

impl TranscriptionService {
    pub fn new(primary: BhashiniClient, fallback: LocalWhisper) -> Self {
        Self { primary, fallback }
    }

    pub fn from_config(
        config: &TranscriptionConfig,
        credentials: &dyn CredentialProvider,
    ) -> Result<Self, ConfigurationError> {
        Ok(Self::new(
            BhashiniClient::new(config, credentials)?,
            LocalWhisper::new(config.fallback.clone()),
        ))
    }
}

#[async_trait]
impl Transcriber for TranscriptionService {
    async fn transcribe(&self, clip: &AudioClip) -> Transcription {
        if clip.bytes.is_empty() {
            return Transcription::unavailable();
        }

        match self.primary.transcribe(clip).await {
            Ok(transcript) => Transcription {
                transcript,
                provider: TranscriptProvider::Bhashini,
                language: None,
            },
            Err(err) => {
                tracing::warn!(
                    target: "transcription",
                    error = %err,
                    "primary_transcriber_unavailable_falling_back"
                );
                self.fallback.transcribe(&clip.bytes).await
            }
        }
    }
}

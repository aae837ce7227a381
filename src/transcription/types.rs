use serde::{Deserialize, Serialize};

use crate::credentials::CredentialRef;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub content_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptProvider {
    Bhashini,
    Whisper,
    Unavailable,
}

impl TranscriptProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            TranscriptProvider::Bhashini => "bhashini",
            TranscriptProvider::Whisper => "whisper",
            TranscriptProvider::Unavailable => "unavailable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcription {
    pub transcript: String,
    pub provider: TranscriptProvider,
    pub language: Option<String>,
}

impl Transcription {
    pub fn unavailable() -> Self {
        Self {
            transcript: String::new(),
            provider: TranscriptProvider::Unavailable,
            language: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    /// Primary speech-to-text service; unset means fall back immediately.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_credential")]
    pub credential: CredentialRef,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default)]
    pub fallback: FallbackCommandConfig,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            credential: default_credential(),
            request_timeout_ms: default_request_timeout_ms(),
            fallback: FallbackCommandConfig::default(),
        }
    }
}

/// Local transcriber invocation. `{input}` in `args` is replaced by the audio
/// file path; without a placeholder the path is appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackCommandConfig {
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_fallback_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for FallbackCommandConfig {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            timeout_ms: default_fallback_timeout_ms(),
        }
    }
}

fn default_credential() -> CredentialRef {
    CredentialRef::None
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_fallback_timeout_ms() -> u64 {
    120_000
}

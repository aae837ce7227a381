use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    Configuration,
    Timeout,
    Transport,
    HttpStatus,
    InvalidJson,
    SchemaMismatch,
    CircuitOpen,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
    pub retryable: bool,
    pub http_status: Option<u16>,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable: matches!(
                kind,
                ProviderErrorKind::Timeout | ProviderErrorKind::Transport
            ),
            http_status: None,
        }
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn with_http_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.http_status {
            Some(status) => write!(f, "{} (status={})", self.message, status),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ProviderError {}

pub fn configuration_error(message: impl Into<String>) -> ProviderError {
    ProviderError::new(ProviderErrorKind::Configuration, message).with_retryable(false)
}

pub fn schema_mismatch(message: impl Into<String>) -> ProviderError {
    ProviderError::new(ProviderErrorKind::SchemaMismatch, message).with_retryable(false)
}

pub fn invalid_json(message: impl Into<String>) -> ProviderError {
    ProviderError::new(ProviderErrorKind::InvalidJson, message).with_retryable(false)
}

/// Maps a non-2xx reply; 408, 429 and 5xx are worth another attempt.
pub fn http_status_error(status: u16) -> ProviderError {
    let retryable = status == 408 || status == 429 || status >= 500;
    ProviderError::new(
        ProviderErrorKind::HttpStatus,
        "reasoning provider returned an error",
    )
    .with_retryable(retryable)
    .with_http_status(status)
}

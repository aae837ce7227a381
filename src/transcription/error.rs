use thiserror::Error;

#[derive(Debug, Error)]
pub enum TranscriptionError {
    #[error("speech-to-text service is not configured")]
    NotConfigured,
    #[error("speech-to-text request timed out")]
    Timeout,
    #[error("speech-to-text request failed: {0}")]
    Transport(String),
    #[error("speech-to-text service returned status {status}")]
    Status { status: u16 },
    #[error("speech-to-text reply is missing a transcript")]
    MissingTranscript,
}

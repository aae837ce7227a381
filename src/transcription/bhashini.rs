use std::time::Duration;

use reqwest::{Client, header, multipart};
use serde_json::Value;

use crate::{
    credentials::{ConfigurationError, CredentialProvider},
    transcription::{
        error::TranscriptionError,
        types::{AudioClip, TranscriptionConfig},
    },
};

const ERROR_BODY_EXCERPT: usize = 2_000;

/// Multipart client for the Bhashini-style `/transcribe` endpoint.
pub struct BhashiniClient {
    client: Client,
    endpoint: Option<String>,
    bearer_token: Option<String>,
    timeout: Duration,
}

impl BhashiniClient {
    pub fn new(
        config: &TranscriptionConfig,
        credentials: &dyn CredentialProvider,
    ) -> Result<Self, ConfigurationError> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| {
                ConfigurationError::new(format!("unable to build transcription http client: {err}"))
            })?;

        let bearer_token = match credentials.resolve(&config.credential, "speech-to-text") {
            Ok(token) => token,
            Err(err) => {
                tracing::warn!(
                    target: "transcription",
                    error = %err,
                    "transcription_credential_unavailable"
                );
                None
            }
        };

        Ok(Self {
            client,
            endpoint: config
                .base_url
                .as_deref()
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(|url| format!("{}/transcribe", url.trim_end_matches('/'))),
            bearer_token,
            timeout: Duration::from_millis(config.request_timeout_ms.max(1)),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }

    pub async fn transcribe(&self, clip: &AudioClip) -> Result<String, TranscriptionError> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or(TranscriptionError::NotConfigured)?;

        let part = multipart::Part::bytes(clip.bytes.clone())
            .file_name(clip.filename.clone())
            .mime_str(&clip.content_type)
            .map_err(|err| TranscriptionError::Transport(err.to_string()))?;
        let form = multipart::Form::new().part("audio", part);

        let mut request = self
            .client
            .post(endpoint)
            .timeout(self.timeout)
            .multipart(form);
        if let Some(token) = &self.bearer_token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = request.send().await.map_err(|err| {
            if err.is_timeout() {
                TranscriptionError::Timeout
            } else {
                TranscriptionError::Transport(err.without_url().to_string())
            }
        })?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            let excerpt: String = body.chars().take(ERROR_BODY_EXCERPT).collect();
            tracing::warn!(
                target: "transcription",
                status = status.as_u16(),
                body = %excerpt,
                "transcription_error_response"
            );
            return Err(TranscriptionError::Status {
                status: status.as_u16(),
            });
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|err| TranscriptionError::Transport(err.to_string()))?;

        ["transcript", "text"]
            .iter()
            .filter_map(|key| payload.get(*key).and_then(Value::as_str))
            .find(|text| !text.is_empty())
            .map(str::to_string)
            .ok_or(TranscriptionError::MissingTranscript)
    }
}

use std::{sync::OnceLock, time::Duration};

use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, header};
use serde_json::{Value, json};
use validator::Validate;

use crate::{
    credentials::CredentialProvider,
    reasoning::{
        ReasoningProvider,
        error::{
            ProviderError, ProviderErrorKind, configuration_error, http_status_error,
            invalid_json, schema_mismatch,
        },
        prompt::build_prompt,
        reliability::ReliabilityLayer,
        types::{GenerationConfig, ReasoningConfig, ReasoningOutput},
    },
};

/// Gemini `generateContent` adapter with retry and circuit breaking.
pub struct GeminiProvider {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    generation: GenerationConfig,
    reliability: ReliabilityLayer,
}

impl GeminiProvider {
    pub fn new(
        config: &ReasoningConfig,
        credentials: &dyn CredentialProvider,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| {
                configuration_error(format!("unable to build reasoning http client: {err}"))
            })?;

        let api_key = match credentials.resolve(&config.credential, "reasoning provider") {
            Ok(key) => key,
            Err(err) => {
                tracing::warn!(
                    target: "reasoning",
                    error = %err,
                    "reasoning_credential_unavailable"
                );
                None
            }
        };

        Ok(Self {
            client,
            endpoint: format!(
                "{}/models/{}:generateContent",
                config.base_url.trim_end_matches('/'),
                config.model
            ),
            model: config.model.clone(),
            api_key,
            generation: config.generation.clone(),
            reliability: ReliabilityLayer::new(config.reliability.clone()),
        })
    }

    async fn invoke_once(&self, api_key: &str, prompt: &str) -> Result<ReasoningOutput, ProviderError> {
        let body = json!({
            "contents": [{"role": "user", "parts": [{"text": prompt}]}],
            "generationConfig": {
                "temperature": self.generation.temperature,
                "topP": self.generation.top_p,
                "topK": self.generation.top_k,
                "maxOutputTokens": self.generation.max_output_tokens,
                "responseMimeType": "application/json",
            },
        });

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", api_key)])
            .timeout(self.reliability.request_timeout())
            .header(header::CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                let kind = if err.is_timeout() {
                    ProviderErrorKind::Timeout
                } else {
                    ProviderErrorKind::Transport
                };
                ProviderError::new(kind, format!("reasoning request failed: {}", err.without_url()))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(http_status_error(status.as_u16()));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|err| invalid_json(format!("reasoning reply is not JSON: {err}")))?;

        let text = payload
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(Value::as_str)
            .ok_or_else(|| schema_mismatch("reasoning reply carried no candidate text"))?;

        parse_output(text)
    }
}

#[async_trait]
impl ReasoningProvider for GeminiProvider {
    async fn generate(&self, context: &Value) -> Result<ReasoningOutput, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| configuration_error("reasoning provider API key is not configured"))?;

        let prompt = build_prompt(context);
        let mut attempt = 0_u32;
        loop {
            // Dropping the permit mid-request releases a held trial slot.
            let permit = self.reliability.ensure_allowed()?;
            match self.invoke_once(api_key, &prompt).await {
                Ok(output) => {
                    permit.succeeded();
                    tracing::debug!(
                        target: "reasoning",
                        model = %self.model,
                        attempts = attempt + 1,
                        confidence = output.confidence.as_str(),
                        uncertainty = output.uncertainty,
                        "reasoning_completed"
                    );
                    return Ok(output);
                }
                Err(err) => {
                    permit.failed(&err);
                    tracing::warn!(
                        target: "reasoning",
                        model = %self.model,
                        attempt = attempt,
                        kind = ?err.kind,
                        retryable = err.retryable,
                        error = %err,
                        "reasoning_attempt_failed"
                    );

                    if !self.reliability.can_retry(&err, attempt) {
                        return Err(err);
                    }

                    attempt += 1;
                    tokio::time::sleep(self.reliability.backoff_delay(attempt)).await;
                }
            }
        }
    }
}

/// Accepts a bare JSON object or the outermost `{...}` span of a chatty reply.
pub fn parse_output(text: &str) -> Result<ReasoningOutput, ProviderError> {
    let value = match serde_json::from_str::<Value>(text.trim()) {
        Ok(value) => value,
        Err(_) => {
            let span = object_span()
                .and_then(|pattern| pattern.find(text))
                .ok_or_else(|| invalid_json("reasoning reply contains no JSON object"))?;
            serde_json::from_str::<Value>(span.as_str())
                .map_err(|err| invalid_json(format!("reasoning reply is not valid JSON: {err}")))?
        }
    };

    let output: ReasoningOutput = serde_json::from_value(value)
        .map_err(|err| schema_mismatch(format!("reasoning reply does not match schema: {err}")))?;
    output
        .validate()
        .map_err(|err| schema_mismatch(format!("reasoning reply failed validation: {err}")))?;

    Ok(output)
}

fn object_span() -> Option<&'static Regex> {
    static OBJECT_SPAN: OnceLock<Option<Regex>> = OnceLock::new();
    OBJECT_SPAN
        .get_or_init(|| Regex::new(r"(?s)\{.*\}").ok())
        .as_ref()
}

pub mod policy;

use std::{sync::Arc, time::Duration};

use serde::Serialize;
use serde_json::{Value, json};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use uuid::Uuid;

use crate::{
    escalation::EscalationStore,
    reasoning::ReasoningProvider,
    store::{Clock, ExpiringStore},
    text::TextProcessor,
    transcription::{AudioClip, Transcriber},
    types::AdvisoryResponse,
    vision::ImageClassifier,
};

pub use policy::{Decision, decide, fallback_response};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub filename: String,
}

/// Whatever subset of inputs the farmer sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvisoryRequest {
    pub text: Option<String>,
    pub audio: Option<AudioClip>,
    pub image: Option<ImageUpload>,
}

impl AdvisoryRequest {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }
}

/// One handled request kept for audit.
#[derive(Debug, Clone, Serialize)]
pub struct ChatTurn {
    pub request: Value,
    pub response: AdvisoryResponse,
}

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Hard ceiling on one reasoning call, retries included.
    pub provider_deadline: Duration,
    pub turn_ttl: Duration,
    pub turn_capacity: usize,
}

pub struct AdvisoryOrchestrator {
    reasoning: Arc<dyn ReasoningProvider>,
    transcriber: Arc<dyn Transcriber>,
    classifier: Arc<dyn ImageClassifier>,
    text: TextProcessor,
    escalations: Arc<EscalationStore>,
    turns: ExpiringStore<Uuid, ChatTurn>,
    clock: Arc<dyn Clock>,
    provider_deadline: Duration,
}

impl AdvisoryOrchestrator {
    pub fn new(
        reasoning: Arc<dyn ReasoningProvider>,
        transcriber: Arc<dyn Transcriber>,
        classifier: Arc<dyn ImageClassifier>,
        escalations: Arc<EscalationStore>,
        clock: Arc<dyn Clock>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            reasoning,
            transcriber,
            classifier,
            text: TextProcessor,
            escalations,
            turns: ExpiringStore::new(settings.turn_ttl, settings.turn_capacity, clock.clone()),
            clock,
            provider_deadline: settings.provider_deadline,
        }
    }

    pub fn escalations(&self) -> &Arc<EscalationStore> {
        &self.escalations
    }

    pub async fn handle(&self, request: AdvisoryRequest) -> AdvisoryResponse {
        self.handle_recorded(request).await.1
    }

    /// Like [`handle`](Self::handle) but also returns the id of the recorded chat turn.
    pub async fn handle_recorded(&self, request: AdvisoryRequest) -> (Uuid, AdvisoryResponse) {
        let context = self.build_context(&request).await;

        let mut response =
            match tokio::time::timeout(self.provider_deadline, self.reasoning.generate(&context))
                .await
            {
                Ok(Ok(output)) => policy::advisory_from(output),
                Ok(Err(err)) => {
                    tracing::warn!(
                        target: "orchestrator",
                        kind = ?err.kind,
                        http_status = ?err.http_status,
                        error = %err,
                        "reasoning_unavailable"
                    );
                    fallback_response()
                }
                Err(_) => {
                    tracing::warn!(
                        target: "orchestrator",
                        deadline = ?self.provider_deadline,
                        "reasoning_deadline_exceeded"
                    );
                    fallback_response()
                }
            };

        if response.escalate {
            let id = self.escalations.add(context.clone(), response.clone());
            response.escalation_id = Some(id);
        }

        let turn_id = Uuid::new_v4();
        self.turns.set(
            turn_id,
            ChatTurn {
                request: context,
                response: response.clone(),
            },
        );

        tracing::info!(
            target: "orchestrator",
            turn_id = %turn_id,
            confidence = response.confidence.as_str(),
            escalate = response.escalate,
            escalation_id = ?response.escalation_id,
            "advisory_handled"
        );

        (turn_id, response)
    }

    pub fn recent_turn(&self, turn_id: &Uuid) -> Option<ChatTurn> {
        self.turns.get(turn_id)
    }

    async fn build_context(&self, request: &AdvisoryRequest) -> Value {
        let text = self.text.process(request.text.as_deref());

        let transcription = match &request.audio {
            Some(clip) => Some(self.transcriber.transcribe(clip).await),
            None => None,
        };

        let predictions = match &request.image {
            Some(image) => self.classifier.detect(&image.bytes, &image.filename).await,
            None => Vec::new(),
        };

        let timestamp = self
            .clock
            .wall_now()
            .format(&Rfc3339)
            .unwrap_or_else(|_| OffsetDateTime::UNIX_EPOCH.unix_timestamp().to_string());

        json!({
            "timestamp": timestamp,
            "inputs": {
                "text": text.as_ref().map(|signals| signals.normalized_text.clone()),
                "text_language": text.as_ref().map(|signals| signals.language.clone()),
                "audio_transcript": transcription.as_ref().map(|t| t.transcript.clone()),
                "audio_provider": transcription.as_ref().map(|t| t.provider.as_str()),
                "audio_language": transcription.as_ref().and_then(|t| t.language.clone()),
                "image_filename": request.image.as_ref().map(|image| image.filename.clone()),
                "image_predictions": predictions,
            },
        })
    }
}

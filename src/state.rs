use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};

use crate::{
    admission::AdmissionController,
    auth::AuthService,
    config::Config,
    credentials::{CredentialProvider, EnvCredentialProvider},
    escalation::EscalationStore,
    orchestrator::{AdvisoryOrchestrator, OrchestratorSettings},
    reasoning::{GeminiProvider, ReasoningProvider},
    store::{Clock, SystemClock},
    transcription::{Transcriber, TranscriptionService},
    vision::{ImageClassifier, StubCropDiseaseDetector},
};

/// External collaborators the orchestrator depends on.
pub struct Collaborators {
    pub reasoning: Arc<dyn ReasoningProvider>,
    pub transcriber: Arc<dyn Transcriber>,
    pub classifier: Arc<dyn ImageClassifier>,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub orchestrator: Arc<AdvisoryOrchestrator>,
    pub escalations: Arc<EscalationStore>,
    pub admission: Arc<AdmissionController>,
    pub auth: Arc<AuthService>,
}

impl AppState {
    /// Wires production collaborators from configuration.
    pub fn from_config(config: Config) -> Result<Self> {
        let credentials = EnvCredentialProvider;
        let reasoning = GeminiProvider::new(&config.reasoning, &credentials)
            .context("failed to build reasoning provider")?;
        let transcriber = TranscriptionService::from_config(&config.transcription, &credentials)
            .context("failed to build transcription service")?;

        let collaborators = Collaborators {
            reasoning: Arc::new(reasoning),
            transcriber: Arc::new(transcriber),
            classifier: Arc::new(StubCropDiseaseDetector),
        };
        Ok(Self::build(
            config,
            collaborators,
            &credentials,
            Arc::new(SystemClock),
        ))
    }

    pub fn build(
        config: Config,
        collaborators: Collaborators,
        credentials: &dyn CredentialProvider,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let ttl = Duration::from_secs(config.cache.ttl_seconds);
        let capacity = config.cache.max_items;

        let escalations = Arc::new(EscalationStore::new(ttl, capacity, clock.clone()));
        let orchestrator = Arc::new(AdvisoryOrchestrator::new(
            collaborators.reasoning,
            collaborators.transcriber,
            collaborators.classifier,
            escalations.clone(),
            clock.clone(),
            OrchestratorSettings {
                provider_deadline: Duration::from_millis(config.reasoning.deadline_ms.max(1)),
                turn_ttl: ttl,
                turn_capacity: capacity,
            },
        ));
        let admission = Arc::new(AdmissionController::new(
            config.rate_limit.policy(),
            clock.clone(),
        ));
        let auth = Arc::new(AuthService::new(&config.auth, credentials, clock));

        Self {
            config: Arc::new(config),
            orchestrator,
            escalations,
            admission,
            auth,
        }
    }
}

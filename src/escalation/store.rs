use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{
    escalation::{
        error::EscalationError,
        types::{Escalation, ORIGINAL_AI_RESPONSE_KEY, VERIFIED_REASON},
    },
    store::{Clock, ExpiringStore},
    types::{AdvisoryResponse, Citation, Confidence, EscalationId},
};

/// Escalations awaiting or carrying an officer's verified answer.
///
/// Records are never deleted explicitly; they fall out through TTL expiry or
/// capacity eviction of the underlying store.
pub struct EscalationStore {
    records: ExpiringStore<EscalationId, Escalation>,
    clock: Arc<dyn Clock>,
    sequence: AtomicU64,
}

impl EscalationStore {
    pub fn new(ttl: Duration, capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            records: ExpiringStore::new(ttl, capacity, Arc::clone(&clock)),
            clock,
            sequence: AtomicU64::new(0),
        }
    }

    pub fn add(&self, context: Value, ai_response: AdvisoryResponse) -> EscalationId {
        let id = Uuid::new_v4();
        let escalation = Escalation {
            id,
            created_at: self.clock.wall_now(),
            context,
            ai_response,
            verified_response: None,
            sequence: self.sequence.fetch_add(1, Ordering::Relaxed),
        };
        self.records.set(id, escalation);

        tracing::info!(target: "escalation", escalation_id = %id, "escalation_created");
        id
    }

    /// Live escalations, newest first.
    pub fn list_all(&self) -> Vec<Escalation> {
        let mut records: Vec<Escalation> = self.records.snapshot().into_values().collect();
        records.sort_by(|left, right| {
            right
                .created_at
                .cmp(&left.created_at)
                .then_with(|| right.sequence.cmp(&left.sequence))
        });
        records
    }

    pub fn get(&self, id: &EscalationId) -> Result<Escalation, EscalationError> {
        self.records
            .get(id)
            .ok_or(EscalationError::NotFound { id: *id })
    }

    /// Records an officer's answer. The verified response replaces the AI
    /// answer, the first AI answer is kept in the context for audit, and the
    /// TTL restarts. Responding again overwrites the previous verified answer.
    /// The verified response carries no `escalation_id`; the record's own
    /// `id` already names it.
    pub fn respond(
        &self,
        id: &EscalationId,
        response_text: impl Into<String>,
        citations: Vec<Citation>,
    ) -> Result<Escalation, EscalationError> {
        let verified = AdvisoryResponse::new(
            response_text,
            Confidence::High,
            citations,
            false,
            VERIFIED_REASON,
        );

        let updated = self
            .records
            .update(id, |escalation| {
                preserve_original_ai_response(escalation);
                escalation.ai_response = verified.clone();
                escalation.verified_response = Some(verified);
            })
            .ok_or(EscalationError::NotFound { id: *id })?;

        tracing::info!(target: "escalation", escalation_id = %id, "escalation_resolved");
        Ok(updated)
    }
}

fn preserve_original_ai_response(escalation: &mut Escalation) {
    let original = match serde_json::to_value(&escalation.ai_response) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(
                target: "escalation",
                escalation_id = %escalation.id,
                error = %err,
                "original_ai_response_not_serializable"
            );
            return;
        }
    };

    if !escalation.context.is_object() {
        let mut wrapped = Map::new();
        wrapped.insert("context".to_string(), escalation.context.take());
        escalation.context = Value::Object(wrapped);
    }

    if let Value::Object(context) = &mut escalation.context {
        context
            .entry(ORIGINAL_AI_RESPONSE_KEY.to_string())
            .or_insert(original);
    }
}

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    api::{
        auth::OfficerUser,
        error::{ApiError, ApiResult},
    },
    escalation::Escalation,
    state::AppState,
    types::Citation,
};

#[derive(Debug, Deserialize, Validate)]
pub struct VerifiedAdviceRequest {
    #[validate(length(min = 1))]
    pub response_text: String,
    #[serde(default)]
    pub citations: Vec<Citation>,
}

pub async fn list_escalations(
    OfficerUser(_officer): OfficerUser,
    State(state): State<AppState>,
) -> Json<Vec<Escalation>> {
    Json(state.escalations.list_all())
}

pub async fn respond(
    OfficerUser(officer): OfficerUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<VerifiedAdviceRequest>, JsonRejection>,
) -> ApiResult<Json<Escalation>> {
    let Json(payload) = payload?;
    payload
        .validate()
        .map_err(|err| ApiError::Validation(err.to_string()))?;

    let id = Uuid::parse_str(&id)
        .map_err(|_| ApiError::NotFound("Escalation not found".to_string()))?;
    let record = state
        .escalations
        .respond(&id, payload.response_text, payload.citations)?;

    tracing::info!(
        target: "escalation",
        escalation_id = %id,
        officer = %officer.username,
        "escalation_verified_via_api"
    );

    Ok(Json(record))
}

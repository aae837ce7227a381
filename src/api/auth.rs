use async_trait::async_trait;
use axum::{
    Form, Json,
    extract::{FromRequestParts, State, rejection::FormRejection},
    http::{header, request::Parts},
};
use serde::{Deserialize, Serialize};

use crate::{
    api::error::{ApiError, ApiResult},
    auth::{Role, UserPublic},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub role: Role,
    pub expires_in: u64,
}

pub async fn login(
    State(state): State<AppState>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> ApiResult<Json<TokenResponse>> {
    let Form(form) = form?;
    let user = state
        .auth
        .authenticate(&form.username, &form.password)
        .ok_or_else(|| ApiError::Unauthorized("Incorrect username or password".to_string()))?;
    let access_token = state.auth.create_access_token(&user)?;

    tracing::info!(target: "auth", username = %user.username, role = user.role.as_str(), "login_succeeded");

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer",
        role: user.role,
        expires_in: state.auth.token_ttl().as_secs(),
    }))
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token.trim()).filter(|token| !token.is_empty())
}

/// A verified bearer whose account has the officer role.
#[derive(Debug, Clone)]
pub struct OfficerUser(pub UserPublic);

#[async_trait]
impl FromRequestParts<AppState> for OfficerUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if !state.auth.is_configured() {
            return Err(ApiError::Internal("Server auth is not configured.".to_string()));
        }

        let token = bearer_token(parts)
            .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;
        let user = state.auth.verify_token(token)?;
        if user.role != Role::Officer {
            return Err(ApiError::Forbidden("Not enough permissions".to_string()));
        }

        Ok(OfficerUser(user))
    }
}

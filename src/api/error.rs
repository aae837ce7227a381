use axum::{
    Json,
    body::Body,
    extract::rejection::{FormRejection, JsonRejection},
    extract::multipart::{MultipartError, MultipartRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

use crate::{
    admission::RateLimited, auth::AuthError, credentials::ConfigurationError,
    escalation::EscalationError,
};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("Too many requests")]
    RateLimited(#[from] RateLimited),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    UnsupportedMediaType(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    pub details: Option<Value>,
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Rides along in response extensions so the request-context layer can stamp
/// the request id into the JSON body.
#[derive(Debug, Clone)]
pub(crate) struct PendingErrorBody(pub ErrorBody);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::RateLimited(_) => "RATE_LIMITED",
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::UnsupportedMediaType(_) => "UNSUPPORTED_MEDIA_TYPE",
            ApiError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn details(&self) -> Option<Value> {
        match self {
            ApiError::RateLimited(limited) => Some(json!({
                "limit": limited.limit,
                "window_seconds": limited.window.as_secs(),
            })),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(target: "http", code = self.code(), error = %self, "request_failed");
        }

        let body = ErrorBody {
            code: self.code(),
            message: self.to_string(),
            details: self.details(),
            request_id: None,
        };

        let mut response = (status, Json(ErrorResponse { error: body.clone() })).into_response();
        if matches!(self, ApiError::Unauthorized(_)) {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response.extensions_mut().insert(PendingErrorBody(body));
        response
    }
}

/// Re-renders an error body produced by [`ApiError`] with the request id filled in.
pub(crate) fn stamp_request_id(response: Response, request_id: &str) -> Response {
    let (mut parts, body) = response.into_parts();
    let Some(PendingErrorBody(mut error)) = parts.extensions.remove::<PendingErrorBody>() else {
        return Response::from_parts(parts, body);
    };

    error.request_id = Some(request_id.to_string());
    match serde_json::to_vec(&ErrorResponse { error }) {
        Ok(bytes) => {
            parts.headers.remove(header::CONTENT_LENGTH);
            Response::from_parts(parts, Body::from(bytes))
        }
        Err(_) => Response::from_parts(parts, body),
    }
}

impl From<EscalationError> for ApiError {
    fn from(err: EscalationError) -> Self {
        match err {
            EscalationError::NotFound { .. } => ApiError::NotFound("Escalation not found".to_string()),
        }
    }
}

impl From<ConfigurationError> for ApiError {
    fn from(err: ConfigurationError) -> Self {
        ApiError::Internal(err.message)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::NotConfigured => ApiError::Internal("Server auth is not configured.".to_string()),
            AuthError::InvalidToken(_) | AuthError::UnknownUser(_) => {
                ApiError::Unauthorized("Could not validate credentials".to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge("Upload too large.".to_string())
        } else {
            ApiError::Validation(err.body_text())
        }
    }
}

pub mod auth;
pub mod chat;
pub mod error;
pub mod health;
pub mod middleware;
pub mod officer;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use tower_http::cors::{AllowHeaders, AllowMethods, Any, CorsLayer};

use crate::state::AppState;

pub use error::{ApiError, ApiResult};

/// Multipart framing and the text field on top of the two file limits.
const CHAT_BODY_OVERHEAD_BYTES: usize = 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let uploads = &state.config.uploads;
    let chat_body_limit = uploads
        .max_audio_bytes
        .saturating_add(uploads.max_image_bytes)
        .saturating_add(CHAT_BODY_OVERHEAD_BYTES);

    let routes = Router::new()
        .route(
            "/chat",
            post(chat::chat).layer(DefaultBodyLimit::max(chat_body_limit)),
        )
        .route("/auth/login", post(auth::login))
        .route("/officer/escalations", get(officer::list_escalations))
        .route("/officer/respond/:id", post(officer::respond));

    Router::new()
        .route("/api/v1/health", get(health::health))
        .nest("/api/v1", routes.clone())
        .merge(routes)
        .fallback(route_not_found)
        .layer(from_fn_with_state(state.clone(), middleware::admission_guard))
        .layer(from_fn(middleware::request_context))
        .layer(cors_layer(&state.config.server.allowed_origins))
        .with_state(state)
}

async fn route_not_found() -> ApiError {
    ApiError::NotFound("Not Found".to_string())
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.is_empty() || allowed_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin.trim()).ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

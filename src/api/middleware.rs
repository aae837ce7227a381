use std::{net::SocketAddr, time::Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    admission::AdmissionKey,
    api::error::{ApiError, stamp_request_id},
    state::AppState,
};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Clone)]
pub struct RequestId(pub String);

fn client_ip(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Assigns or echoes `x-request-id`, logs one `request` event per call.
pub async fn request_context(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let client_ip = client_ip(&request);
    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let span = tracing::info_span!(
        target: "http",
        "http_request",
        request_id = %request_id,
        method = %method,
        path = %path,
    );
    let started_at = Instant::now();
    let response = next.run(request).instrument(span.clone()).await;

    let mut response = stamp_request_id(response, &request_id);
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    span.in_scope(|| {
        tracing::info!(
            target: "http",
            method = %method,
            path = %path,
            status_code = response.status().as_u16(),
            client_ip = %client_ip,
            duration_ms = started_at.elapsed().as_secs_f64() * 1000.0,
            request_id = %request_id,
            "request"
        );
    });

    response
}

/// Fixed-window admission keyed by client address and request path.
pub async fn admission_guard(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if !state.config.rate_limit.enabled {
        return next.run(request).await;
    }

    let key = AdmissionKey::new(client_ip(&request), request.uri().path());
    if let Err(limited) = state.admission.admit(key.clone()) {
        tracing::warn!(
            target: "admission",
            client = %key.client,
            route = %key.route,
            limit = limited.limit,
            window_seconds = limited.window.as_secs(),
            "request_rate_limited"
        );
        return ApiError::from(limited).into_response();
    }

    next.run(request).await
}

use agri_advisory::types::Confidence;
use axum::{body::Body, http::Request};
use serde_json::json;

use crate::support::{app, get, json_body};

#[tokio::test]
async fn given_running_service_when_health_checked_then_reports_ok() {
    let app = app(Confidence::High);

    let response = app.send(get("/api/v1/health")).await;

    assert_eq!(response.status(), 200);
    let body = json_body(response).await;
    assert_eq!(body["status"], json!("ok"));
    assert_eq!(body["service"], json!("agri-advisory"));
    assert_eq!(body["version"], json!(env!("CARGO_PKG_VERSION")));
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn given_unknown_route_when_requested_then_error_envelope_carries_request_id() {
    let app = app(Confidence::High);

    let response = app.send(get("/api/v1/weather")).await;

    assert_eq!(response.status(), 404);
    let header_id = response
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .expect("request id header");
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], json!("NOT_FOUND"));
    assert_eq!(body["error"]["request_id"], json!(header_id));
    assert_eq!(body["error"]["details"], json!(null));
}

#[tokio::test]
async fn given_caller_request_id_when_served_then_it_is_echoed() {
    let app = app(Confidence::High);
    let request = Request::builder()
        .uri("/api/v1/health")
        .header("x-request-id", "field-visit-42")
        .body(Body::empty())
        .expect("request");

    let response = app.send(request).await;

    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|value| value.to_str().ok()),
        Some("field-visit-42")
    );
}

use std::time::Duration;

use agri_advisory::types::Confidence;
use serde_json::json;

use crate::support::{app, app_with, get, json_body, test_config};

fn limited_config(requests: u64) -> agri_advisory::config::Config {
    let mut config = test_config();
    config.rate_limit.requests = requests;
    config.rate_limit.window_seconds = 60;
    config
}

#[tokio::test]
async fn given_exhausted_window_when_requesting_then_rate_limited_envelope() {
    let app = app_with(Confidence::High, limited_config(2));

    for _ in 0..2 {
        let response = app.send(get("/api/v1/health")).await;
        assert_eq!(response.status(), 200);
    }

    let response = app.send(get("/api/v1/health")).await;
    assert_eq!(response.status(), 429);
    let header_id = response
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .expect("request id header");
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], json!("RATE_LIMITED"));
    assert_eq!(body["error"]["message"], json!("Too many requests"));
    assert_eq!(
        body["error"]["details"],
        json!({"limit": 2, "window_seconds": 60})
    );
    assert_eq!(body["error"]["request_id"], json!(header_id));
}

#[tokio::test]
async fn given_exhausted_window_when_other_client_or_path_requests_then_admitted() {
    let app = app_with(Confidence::High, limited_config(1));

    assert_eq!(app.send(get("/api/v1/health")).await.status(), 200);
    assert_eq!(app.send(get("/api/v1/health")).await.status(), 429);

    let other_client = app
        .send_from("198.51.100.20:41000", get("/api/v1/health"))
        .await;
    assert_eq!(other_client.status(), 200);

    let other_path = app.send(get("/api/v1/missing")).await;
    assert_eq!(other_path.status(), 404);
}

#[tokio::test]
async fn given_exhausted_window_when_window_elapses_then_requests_resume() {
    let app = app_with(Confidence::High, limited_config(1));

    assert_eq!(app.send(get("/api/v1/health")).await.status(), 200);
    assert_eq!(app.send(get("/api/v1/health")).await.status(), 429);

    app.clock.advance(Duration::from_secs(60));
    assert_eq!(app.send(get("/api/v1/health")).await.status(), 200);
}

#[tokio::test]
async fn given_rate_limiting_disabled_when_flooding_then_every_request_passes() {
    let mut config = limited_config(1);
    config.rate_limit.enabled = false;
    let app = app_with(Confidence::High, config);

    for _ in 0..5 {
        assert_eq!(app.send(get("/api/v1/health")).await.status(), 200);
    }
}

#[tokio::test]
async fn given_default_policy_when_sixty_one_requests_then_last_is_denied() {
    let app = app(Confidence::High);

    for _ in 0..60 {
        assert_eq!(app.send(get("/api/v1/health")).await.status(), 200);
    }
    assert_eq!(app.send(get("/api/v1/health")).await.status(), 429);
}

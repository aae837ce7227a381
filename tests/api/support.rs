use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use agri_advisory::{
    api::build_router,
    config::Config,
    credentials::{CredentialRef, EnvCredentialProvider},
    reasoning::{ProviderError, ReasoningOutput, ReasoningProvider},
    state::{AppState, Collaborators},
    store::ManualClock,
    transcription::{AudioClip, TranscriptProvider, Transcriber, Transcription},
    types::Confidence,
    vision::StubCropDiseaseDetector,
};
use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    extract::ConnectInfo,
    http::{Request, Response, header},
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

pub const BOUNDARY: &str = "agri-advisory-test-boundary";

pub struct CannedReasoning {
    output: ReasoningOutput,
    last_context: Mutex<Option<Value>>,
}

impl CannedReasoning {
    pub fn last_context(&self) -> Option<Value> {
        self.last_context.lock().expect("context lock").clone()
    }
}

#[async_trait]
impl ReasoningProvider for CannedReasoning {
    async fn generate(&self, context: &Value) -> Result<ReasoningOutput, ProviderError> {
        *self.last_context.lock().expect("context lock") = Some(context.clone());
        Ok(self.output.clone())
    }
}

struct EchoTranscriber;

#[async_trait]
impl Transcriber for EchoTranscriber {
    async fn transcribe(&self, clip: &AudioClip) -> Transcription {
        Transcription {
            transcript: String::from_utf8_lossy(&clip.bytes).into_owned(),
            provider: TranscriptProvider::Bhashini,
            language: None,
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub clock: Arc<ManualClock>,
    pub reasoning: Arc<CannedReasoning>,
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.auth.jwt_secret = CredentialRef::InlineToken {
        token: "api-test-signing-secret".to_string(),
    };
    config
}

pub fn app(confidence: Confidence) -> TestApp {
    app_with(confidence, test_config())
}

pub fn app_with(confidence: Confidence, config: Config) -> TestApp {
    let clock = Arc::new(ManualClock::new());
    let reasoning = Arc::new(CannedReasoning {
        output: ReasoningOutput {
            answer: "Spray neem oil in the evening and remove affected leaves.".to_string(),
            confidence,
            citations: vec![Value::String("State agriculture handbook".to_string())],
            assumptions: vec![],
            uncertainty: false,
        },
        last_context: Mutex::new(None),
    });

    let state = AppState::build(
        config,
        Collaborators {
            reasoning: reasoning.clone(),
            transcriber: Arc::new(EchoTranscriber),
            classifier: Arc::new(StubCropDiseaseDetector),
        },
        &EnvCredentialProvider,
        clock.clone(),
    );

    TestApp {
        router: build_router(state.clone()),
        state,
        clock,
        reasoning,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.send_from("203.0.113.7:50000", request).await
    }

    pub async fn send_from(&self, peer: &str, mut request: Request<Body>) -> Response<Body> {
        let peer: SocketAddr = peer.parse().expect("peer address");
        request.extensions_mut().insert(ConnectInfo(peer));
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self.send(login_request(username, password)).await;
        assert_eq!(response.status(), 200, "login for {username} should succeed");
        let body = json_body(response).await;
        body["access_token"]
            .as_str()
            .expect("access token")
            .to_string()
    }
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body collects")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body is json")
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

pub fn authed_get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .expect("request")
}

pub fn authed_json_post(uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn login_request(username: &str, password: &str) -> Request<Body> {
    let form = format!(
        "username={}&password={}",
        username,
        password.replace('@', "%40")
    );
    Request::builder()
        .method("POST")
        .uri("/api/v1/auth/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form))
        .expect("request")
}

pub struct Part<'a> {
    pub name: &'a str,
    pub filename: Option<&'a str>,
    pub content_type: Option<&'a str>,
    pub bytes: &'a [u8],
}

impl<'a> Part<'a> {
    pub fn text(name: &'a str, value: &'a str) -> Self {
        Self {
            name,
            filename: None,
            content_type: None,
            bytes: value.as_bytes(),
        }
    }

    pub fn file(name: &'a str, filename: &'a str, content_type: &'a str, bytes: &'a [u8]) -> Self {
        Self {
            name,
            filename: Some(filename),
            content_type: Some(content_type),
            bytes,
        }
    }
}

pub fn multipart(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        let mut disposition = format!("Content-Disposition: form-data; name=\"{}\"", part.name);
        if let Some(filename) = part.filename {
            disposition.push_str(&format!("; filename=\"{filename}\""));
        }
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(b"\r\n");
        if let Some(content_type) = part.content_type {
            body.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(part.bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("request")
}

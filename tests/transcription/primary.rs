use agri_advisory::{
    credentials::EnvCredentialProvider,
    transcription::{
        BhashiniClient, FallbackCommandConfig, TranscriptProvider, Transcriber,
        TranscriptionError, TranscriptionService,
    },
};
use serde_json::json;

use crate::support::{FakeStt, clip, echo_fallback, stt_config};

#[tokio::test]
async fn given_primary_transcript_when_transcribing_then_bhashini_result_is_returned() {
    let stt = FakeStt::start(200, json!({"transcript": "gehun mein peela rog"})).await;
    let service = TranscriptionService::from_config(
        &stt_config(Some(&stt.base_url), echo_fallback()),
        &EnvCredentialProvider,
    )
    .expect("service");

    let result = service.transcribe(&clip(b"RIFF-audio")).await;

    assert_eq!(result.transcript, "gehun mein peela rog");
    assert_eq!(result.provider, TranscriptProvider::Bhashini);

    let upload = stt.last_upload();
    assert_eq!(upload.path, "/stt/transcribe");
    assert_eq!(upload.authorization.as_deref(), Some("Bearer stt-token"));
    assert!(upload.body.contains("name=\"audio\""));
    assert!(upload.body.contains("filename=\"voice.wav\""));
    assert!(upload.body.contains("RIFF-audio"));
}

#[tokio::test]
async fn given_reply_with_text_field_when_transcribing_then_text_is_accepted() {
    let stt = FakeStt::start(200, json!({"text": "dhaan ki fasal"})).await;
    let client = BhashiniClient::new(
        &stt_config(Some(&stt.base_url), FallbackCommandConfig::default()),
        &EnvCredentialProvider,
    )
    .expect("client");

    let transcript = client.transcribe(&clip(b"abc")).await.expect("transcript");
    assert_eq!(transcript, "dhaan ki fasal");
}

#[tokio::test]
async fn given_reply_without_transcript_when_transcribing_then_missing_transcript_error() {
    let stt = FakeStt::start(200, json!({"status": "ok"})).await;
    let client = BhashiniClient::new(
        &stt_config(Some(&stt.base_url), FallbackCommandConfig::default()),
        &EnvCredentialProvider,
    )
    .expect("client");

    let err = client.transcribe(&clip(b"abc")).await.expect_err("no transcript");
    assert!(matches!(err, TranscriptionError::MissingTranscript));
}

#[tokio::test]
async fn given_error_status_when_transcribing_then_status_error_is_reported() {
    let stt = FakeStt::start(404, json!({"detail": "no such model"})).await;
    let client = BhashiniClient::new(
        &stt_config(Some(&stt.base_url), FallbackCommandConfig::default()),
        &EnvCredentialProvider,
    )
    .expect("client");

    let err = client.transcribe(&clip(b"abc")).await.expect_err("404");
    assert!(matches!(err, TranscriptionError::Status { status: 404 }));
}

#[tokio::test]
async fn given_no_base_url_when_transcribing_then_client_is_not_configured() {
    let client = BhashiniClient::new(
        &stt_config(Some("   "), FallbackCommandConfig::default()),
        &EnvCredentialProvider,
    )
    .expect("client");

    assert!(!client.is_configured());
    let err = client.transcribe(&clip(b"abc")).await.expect_err("unconfigured");
    assert!(matches!(err, TranscriptionError::NotConfigured));
}

#[tokio::test]
async fn given_empty_clip_when_transcribing_then_unavailable_without_calling_primary() {
    let stt = FakeStt::start(200, json!({"transcript": "never"})).await;
    let service = TranscriptionService::from_config(
        &stt_config(Some(&stt.base_url), echo_fallback()),
        &EnvCredentialProvider,
    )
    .expect("service");

    let result = service.transcribe(&clip(b"")).await;

    assert_eq!(result.provider, TranscriptProvider::Unavailable);
    assert!(result.transcript.is_empty());
    assert_eq!(stt.hits(), 0);
}

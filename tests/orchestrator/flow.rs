use std::{sync::Arc, time::Duration};

use agri_advisory::{
    escalation::EscalationStatus,
    orchestrator::{AdvisoryRequest, ImageUpload},
    transcription::AudioClip,
    types::Confidence,
};
use serde_json::json;

use crate::{
    support::{Script, ScriptedReasoning, answer, harness, harness_with_deadline},
    upstream::{Step, Upstream},
};

#[tokio::test(start_paused = true)]
async fn given_provider_exceeding_deadline_when_handled_then_fallback_is_escalated() {
    let reasoning = ScriptedReasoning::new(Script::Hang);
    let h = harness_with_deadline(reasoning.clone(), Duration::from_secs(30));

    let response = h.orchestrator.handle(AdvisoryRequest::text("no answer")).await;

    assert!(response.escalate);
    assert_eq!(
        response.reason,
        "AI reasoning service is unavailable or returned an invalid response."
    );
    assert!(response.escalation_id.is_some());
    assert_eq!(reasoning.calls(), 1);
}

#[tokio::test]
async fn given_deadline_fires_during_trial_call_when_next_request_arrives_then_provider_is_reached() {
    let upstream = Upstream::start(vec![
        Step::Status(503),
        Step::Stall,
        Step::Answer(
            r#"{"answer": "Spray neem oil at dusk.", "confidence": "High", "citations": [], "assumptions": [], "uncertainty": false}"#,
        ),
    ])
    .await;
    let provider = Arc::new(upstream.provider(Duration::from_millis(50)));
    let h = harness_with_deadline(provider, Duration::from_millis(300));

    let opened = h.orchestrator.handle(AdvisoryRequest::text("aphids")).await;
    assert!(opened.escalate);
    assert_eq!(upstream.hits(), 1);

    tokio::time::sleep(Duration::from_millis(80)).await;
    let stalled = h.orchestrator.handle(AdvisoryRequest::text("aphids")).await;
    assert!(stalled.escalate);
    assert_eq!(upstream.hits(), 2);

    let recovered = h.orchestrator.handle(AdvisoryRequest::text("aphids")).await;
    assert_eq!(upstream.hits(), 3);
    assert!(!recovered.escalate);
    assert_eq!(recovered.text, "Spray neem oil at dusk.");
}

#[tokio::test]
async fn given_all_modalities_when_handled_then_context_carries_every_signal() {
    let reasoning = ScriptedReasoning::new(Script::Answer(answer(Confidence::High, false)));
    let h = harness(reasoning.clone());

    h.orchestrator
        .handle(AdvisoryRequest {
            text: Some("  tomato   leaves\n curling ".to_string()),
            audio: Some(AudioClip {
                bytes: vec![1, 2, 3],
                filename: "voice.wav".to_string(),
                content_type: "audio/wav".to_string(),
            }),
            image: Some(ImageUpload {
                bytes: vec![9, 9, 9],
                filename: "leaf.jpg".to_string(),
            }),
        })
        .await;

    let context = reasoning.last_context();
    assert!(context["timestamp"].is_string());
    assert_eq!(
        context["inputs"],
        json!({
            "text": "tomato leaves curling",
            "text_language": "en",
            "audio_transcript": "meri fasal mein keede hain",
            "audio_provider": "bhashini",
            "audio_language": null,
            "image_filename": "leaf.jpg",
            "image_predictions": [{"label": "unclassified", "confidence": 0.10}],
        })
    );
}

#[tokio::test]
async fn given_text_only_when_handled_then_absent_modalities_are_null() {
    let reasoning = ScriptedReasoning::new(Script::Answer(answer(Confidence::High, false)));
    let h = harness(reasoning.clone());

    h.orchestrator.handle(AdvisoryRequest::text("पत्ते पीले")).await;

    let inputs = reasoning.last_context()["inputs"].clone();
    assert_eq!(inputs["text_language"], json!("hi"));
    assert_eq!(inputs["audio_transcript"], json!(null));
    assert_eq!(inputs["audio_provider"], json!(null));
    assert_eq!(inputs["image_filename"], json!(null));
    assert_eq!(inputs["image_predictions"], json!([]));
}

#[tokio::test]
async fn given_escalated_request_when_officer_responds_then_fetch_returns_verified_answer() {
    let reasoning = ScriptedReasoning::new(Script::Answer(answer(Confidence::Low, false)));
    let h = harness(reasoning);

    let pending = h.orchestrator.handle(AdvisoryRequest::text("stem borer")).await;
    let id = pending.escalation_id.expect("escalated");
    h.escalations
        .respond(&id, "Use pheromone traps.", vec![])
        .expect("respond");

    let record = h.escalations.get(&id).expect("record");
    assert_eq!(record.status(), EscalationStatus::Resolved);
    assert_eq!(record.ai_response.text, "Use pheromone traps.");
    assert_eq!(
        record.context["ai_response_original"]["response_text"],
        json!(pending.text)
    );
    assert_eq!(record.context["inputs"]["text"], json!("stem borer"));
}

#[tokio::test]
async fn given_three_escalated_requests_when_listed_then_newest_is_first() {
    let reasoning = ScriptedReasoning::new(Script::Answer(answer(Confidence::Low, true)));
    let h = harness(reasoning);

    let mut ids = Vec::new();
    for question in ["t1", "t2", "t3"] {
        let response = h.orchestrator.handle(AdvisoryRequest::text(question)).await;
        ids.push(response.escalation_id.expect("escalated"));
        h.clock.advance(Duration::from_secs(1));
    }

    let listed: Vec<_> = h.escalations.list_all().into_iter().map(|r| r.id).collect();
    assert_eq!(listed, vec![ids[2], ids[1], ids[0]]);
}

#[tokio::test]
async fn given_handled_request_when_turn_is_read_back_then_it_expires_with_the_cache_ttl() {
    let reasoning = ScriptedReasoning::new(Script::Answer(answer(Confidence::High, false)));
    let h = harness(reasoning);

    let (turn_id, response) = h
        .orchestrator
        .handle_recorded(AdvisoryRequest::text("soil test"))
        .await;

    let turn = h.orchestrator.recent_turn(&turn_id).expect("turn recorded");
    assert_eq!(turn.response, response);
    assert_eq!(turn.request["inputs"]["text"], json!("soil test"));

    h.clock.advance(Duration::from_secs(900));
    assert!(h.orchestrator.recent_turn(&turn_id).is_none());
}

//! Wiremock integration tests for GeminiClient.
//!
//! These tests verify correct HTTP interaction and the status-code mapping
//! the rotator relies on.

use std::sync::Arc;
use std::time::Duration;

use acebot::credentials::StaticCredentials;
use acebot::providers::{ContentProvider, GeminiClient, GeminiConfig};
use acebot::{
    Acebot, AcebotError, ChatMessage, FailureClass, KeyRotator, RetryConfig, StudyService,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEXT_PATH: &str = "/v1beta/models/gemini-flash-latest:generateContent";
const AUDIO_PATH: &str = "/v1beta/models/gemini-2.5-flash-preview-tts:generateContent";
const IMAGE_PATH: &str = "/v1beta/models/gemini-2.5-flash-image:generateContent";
const CHAT_PATH: &str = "/v1beta/models/gemini-3-flash-preview:generateContent";

fn client(server: &MockServer) -> GeminiClient {
    GeminiClient::new(GeminiConfig::with_base_url(server.uri())).unwrap()
}

fn text_body(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{"content": {"parts": [{"text": text}]}}]
    })
}

fn error_body(code: u16, message: &str) -> serde_json::Value {
    serde_json::json!({
        "error": {"code": code, "message": message, "status": "ERROR"}
    })
}

/// Test successful text generation.
#[tokio::test]
async fn test_generate_text_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TEXT_PATH))
        .and(header("x-goog-api-key", "test-key-0001"))
        .and(body_partial_json(serde_json::json!({
            "contents": [{"parts": [{"text": "Explain optics"}]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_body("TOPIC: Lenses")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let text = client(&mock_server)
        .generate_text("test-key-0001", "Explain optics")
        .await
        .expect("generate_text should succeed");
    assert_eq!(text, "TOPIC: Lenses");
}

/// Test audio request shape and inline payload extraction.
#[tokio::test]
async fn test_generate_audio_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(AUDIO_PATH))
        .and(body_partial_json(serde_json::json!({
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {"voiceConfig": {"prebuiltVoiceConfig": {"voiceName": "Kore"}}}
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{"content": {"parts": [
                {"inlineData": {"mimeType": "audio/L16;rate=24000", "data": "UklGRgAAAA=="}}
            ]}}]
        })))
        .mount(&mock_server)
        .await;

    let audio = client(&mock_server)
        .generate_audio("test-key-0001", "Narrate")
        .await
        .expect("generate_audio should succeed");
    assert_eq!(audio, "UklGRgAAAA==");
}

/// Test image request asks for the configured aspect ratio.
#[tokio::test]
async fn test_generate_image_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(IMAGE_PATH))
        .and(body_partial_json(serde_json::json!({
            "generationConfig": {"imageConfig": {"aspectRatio": "4:3"}}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{"content": {"parts": [
                {"text": "Here is the formula"},
                {"inlineData": {"mimeType": "image/png", "data": "iVBORw0KGgo="}}
            ]}}]
        })))
        .mount(&mock_server)
        .await;

    let image = client(&mock_server)
        .generate_image("test-key-0001", "E = mc^2")
        .await
        .expect("generate_image should succeed");
    assert_eq!(image, "iVBORw0KGgo=");
}

/// Test chat sends the earlier turns, the new message, and the system instruction.
#[tokio::test]
async fn test_chat_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .and(header("x-goog-api-key", "test-key-0001"))
        .and(body_partial_json(serde_json::json!({
            "systemInstruction": {"parts": [{"text": "Be a tutor."}]},
            "contents": [
                {"role": "model", "parts": [{"text": "Hello!"}]},
                {"role": "user", "parts": [{"text": "What is emf?"}]}
            ]
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(text_body("Emf matlab work per charge.")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let reply = client(&mock_server)
        .chat(
            "test-key-0001",
            "Be a tutor.",
            &[ChatMessage::model("Hello!")],
            "What is emf?",
        )
        .await
        .expect("chat should succeed");
    assert_eq!(reply, "Emf matlab work per charge.");
}

/// Test a response with no candidates.
#[tokio::test]
async fn test_empty_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TEXT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"candidates": []})))
        .mount(&mock_server)
        .await;

    let result = client(&mock_server).generate_text("test-key-0001", "hi").await;
    assert!(matches!(result, Err(AcebotError::EmptyResponse)));
}

// ============================================================================
// Status mapping
// ============================================================================

#[tokio::test]
async fn test_forbidden_is_invalid_credential() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TEXT_PATH))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(error_body(403, "API key not valid")),
        )
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .generate_text("bad-key-0001", "hi")
        .await
        .unwrap_err();
    match &err {
        AcebotError::InvalidCredential { status, message } => {
            assert_eq!(*status, 403);
            assert_eq!(message, "API key not valid");
        }
        other => panic!("expected InvalidCredential, got {other:?}"),
    }
    assert_eq!(err.failure_class(), FailureClass::InvalidCredential);
}

#[tokio::test]
async fn test_bad_request_is_invalid_credential() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TEXT_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .generate_text("bad-key-0001", "hi")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AcebotError::InvalidCredential { status: 400, .. }
    ));
}

#[tokio::test]
async fn test_unknown_model_is_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TEXT_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_json(error_body(
            404,
            "models/gemini-flash-latest is not found for API version v1beta",
        )))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .generate_text("test-key-0001", "hi")
        .await
        .unwrap_err();
    assert!(matches!(err, AcebotError::Api { status: 404, .. }));
    assert_eq!(err.failure_class(), FailureClass::Unclassified);
}

#[tokio::test]
async fn test_not_found_blaming_key_is_invalid_credential() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TEXT_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "error": {
                "code": 404,
                "message": "API key not found",
                "details": [{"reason": "API_KEY_INVALID"}]
            }
        })))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .generate_text("test-key-0001", "hi")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AcebotError::InvalidCredential { status: 404, .. }
    ));
}

#[tokio::test]
async fn test_rate_limited_with_retry_after() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TEXT_PATH))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "30")
                .set_body_json(error_body(429, "Resource has been exhausted")),
        )
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .generate_text("test-key-0001", "hi")
        .await
        .unwrap_err();
    assert_eq!(err.retry_after(), Some(Duration::from_secs(30)));
    assert_eq!(err.failure_class(), FailureClass::Transient { overloaded: false });
}

#[tokio::test]
async fn test_service_unavailable_is_overloaded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TEXT_PATH))
        .respond_with(
            ResponseTemplate::new(503).set_body_json(error_body(503, "The model is overloaded")),
        )
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .generate_text("test-key-0001", "hi")
        .await
        .unwrap_err();
    assert!(matches!(err, AcebotError::Overloaded(ref m) if m == "The model is overloaded"));
}

#[tokio::test]
async fn test_server_error_is_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TEXT_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_json(error_body(500, "Internal")))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .generate_text("test-key-0001", "hi")
        .await
        .unwrap_err();
    assert!(matches!(err, AcebotError::Api { status: 500, .. }));
    assert_eq!(err.failure_class(), FailureClass::Unclassified);
}

// ============================================================================
// Rotation over HTTP
// ============================================================================

/// A revoked key is dropped and the next key serves the request.
#[tokio::test]
async fn test_rotator_skips_revoked_key() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TEXT_PATH))
        .and(header("x-goog-api-key", "revoked-key-01"))
        .respond_with(ResponseTemplate::new(403).set_body_json(error_body(403, "revoked")))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path(TEXT_PATH))
        .and(header("x-goog-api-key", "working-key-02"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_body("ok")))
        .expect(2)
        .mount(&mock_server)
        .await;

    let provider = client(&mock_server);
    let rotator = KeyRotator::new(
        Arc::new(StaticCredentials::new("revoked-key-01,working-key-02")),
        RetryConfig::new(),
    );

    for _ in 0..2 {
        let text = rotator
            .execute(|key| {
                let provider = &provider;
                async move { provider.generate_text(&key, "hi").await }
            })
            .await
            .unwrap();
        assert_eq!(text, "ok");
    }

    let status = rotator.status();
    assert_eq!(status.active_credentials, 1);
    assert_eq!(status.current_index, 1);
}

/// A misspelled model must not cost any keys: other operations keep working.
#[tokio::test]
async fn test_model_typo_keeps_pool_intact() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-typo-tts:generateContent"))
        .respond_with(ResponseTemplate::new(404).set_body_json(error_body(
            404,
            "models/gemini-typo-tts is not found",
        )))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path(TEXT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_body("TOPIC: Optics")))
        .mount(&mock_server)
        .await;

    let mut config = GeminiConfig::with_base_url(mock_server.uri());
    config.audio_model = "gemini-typo-tts".to_string();
    let gateway = Acebot::builder()
        .credentials(StaticCredentials::new(
            "key-alpha-0001,key-bravo-0002,key-charlie-03",
        ))
        .retry(RetryConfig::new().max_attempts(3))
        .gemini(config)
        .build()
        .unwrap();

    let err = gateway
        .generate_audio("TOPIC: Optics", "Physics")
        .await
        .unwrap_err();
    match err {
        AcebotError::ExhaustedRetries { source, .. } => {
            assert!(matches!(*source, AcebotError::Api { status: 404, .. }));
        }
        other => panic!("expected ExhaustedRetries, got {other:?}"),
    }
    assert_eq!(gateway.status().active_credentials, 3);

    let notes = gateway.generate_notes("Physics", "Ray Optics").await.unwrap();
    assert_eq!(notes, "TOPIC: Optics");
}

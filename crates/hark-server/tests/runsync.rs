//! `/runsync` against a fake model, through the full router.

use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hark_server::{HarkServer, ServerConfig};
use hark_settings::{HarkSettings, MIB};
use hark_transcription::{
    ModelState, Segment, TranscribeOptions, Transcriber, Transcript, TranscriptionError,
};
use hark_worker::{Limits, ProcessorConfig, RequestProcessor};
use serde_json::{Value, json};
use tower::ServiceExt;

/// Echoes the staged file length as the transcript text.
struct LengthEcho;

impl Transcriber for LengthEcho {
    fn model_name(&self) -> &str {
        "tiny"
    }

    fn transcribe(
        &self,
        audio_path: &Path,
        options: &TranscribeOptions,
    ) -> Result<Transcript, TranscriptionError> {
        let len = std::fs::metadata(audio_path)?.len();
        Ok(Transcript {
            text: format!("{len} bytes"),
            segments: vec![Segment {
                start: 0.0,
                end: 1.25,
                text: format!("{len} bytes"),
            }],
            language: options.language.clone().or_else(|| Some("en".into())),
            duration_seconds: 1.25,
        })
    }
}

fn server(scratch: &Path) -> HarkServer {
    let processor = RequestProcessor::new(
        ModelState::ready(Arc::new(LengthEcho)),
        ProcessorConfig {
            scratch_dir: Some(scratch.to_path_buf()),
            ..ProcessorConfig::default()
        },
    );
    HarkServer::new(ServerConfig::default(), processor)
}

async fn post(app: axum::Router, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri("/runsync")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), 1_000_000)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn transcribes_and_echoes_id() {
    let dir = tempfile::tempdir().unwrap();
    let app = server(dir.path()).router();

    let (status, body) = post(
        app,
        json!({"id": "req-7", "input": {"audio_base64": STANDARD.encode([0u8; 10])}}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "id": "req-7",
            "status": "COMPLETED",
            "output": {
                "text": "10 bytes",
                "segments": [{"start": 0.0, "end": 1.25, "text": "10 bytes"}],
                "detected_language": "en",
                "duration": 1.25,
            }
        })
    );
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn generates_id_when_absent() {
    let dir = tempfile::tempdir().unwrap();
    let (_, body) = post(
        server(dir.path()).router(),
        json!({"input": {"audio_base64": STANDARD.encode(b"abc"), "force_language": "es"}}),
    )
    .await;

    assert!(uuid::Uuid::parse_str(body["id"].as_str().unwrap()).is_ok());
    assert_eq!(body["output"]["detected_language"], "es");
}

#[tokio::test]
async fn missing_audio_is_reported_in_output() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body) = post(server(dir.path()).router(), json!({"input": {}})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "COMPLETED");
    assert_eq!(body["output"], json!({"error": "No audio_base64 provided"}));
}

/// Server whose body limit is derived from a 1 MiB audio ceiling.
fn small_ceiling_server(scratch: &Path) -> HarkServer {
    let mut settings = HarkSettings::default();
    settings.limits.max_audio_bytes = MIB;
    let processor = RequestProcessor::new(
        ModelState::ready(Arc::new(LengthEcho)),
        ProcessorConfig {
            limits: Limits::from(&settings.limits),
            scratch_dir: Some(scratch.to_path_buf()),
            ..ProcessorConfig::default()
        },
    );
    HarkServer::new(ServerConfig::from_settings(&settings), processor)
}

#[tokio::test]
async fn oversized_audio_within_body_limit_reaches_size_policy() {
    let dir = tempfile::tempdir().unwrap();
    let audio = vec![0u8; 3 * MIB as usize / 2];
    let (status, body) = post(
        small_ceiling_server(dir.path()).router(),
        json!({"input": {"audio_base64": STANDARD.encode(&audio)}}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["output"], json!({"error": "File too large: 1.5MB (max 1MB)"}));
}

#[tokio::test]
async fn body_over_transport_limit_is_file_too_large() {
    let dir = tempfile::tempdir().unwrap();
    let audio = vec![0u8; 3 * MIB as usize];
    let payload = json!({"input": {"audio_base64": STANDARD.encode(&audio)}}).to_string();
    let req = Request::builder()
        .method("POST")
        .uri("/runsync")
        .header("content-type", "application/json")
        .header("content-length", payload.len())
        .body(Body::from(payload))
        .unwrap();

    let resp = small_ceiling_server(dir.path())
        .router()
        .oneshot(req)
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let bytes = axum::body::to_bytes(resp.into_body(), 10_000).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({"error": "File too large: 3.0MB (max 1MB)"}));
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn health_reports_loaded_model() {
    let dir = tempfile::tempdir().unwrap();
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let resp = server(dir.path()).router().oneshot(req).await.unwrap();
    let bytes = axum::body::to_bytes(resp.into_body(), 10_000).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(body["status"], "ok");
    assert_eq!(body["model"], "tiny");
    assert_eq!(body["model_ready"], true);
}

#[tokio::test]
async fn serve_on_stops_at_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    server(dir.path())
        .serve_on(listener, std::future::ready(()))
        .await
        .unwrap();
}

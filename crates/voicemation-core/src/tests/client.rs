use crate::{
    CoreError, SubmissionClient, SubmissionInput, SubmissionRequest, audio::AudioPayload,
};

use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Multipart, State},
    http::StatusCode,
    routing::post,
};
use serde_json::{Value, json};

/// Canned `/generate_audio` endpoint that records what it was sent.
#[derive(Clone)]
struct MockService {
    status: StatusCode,
    body: Value,
    seen: Arc<Mutex<Vec<Value>>>,
}

impl MockService {
    fn new(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body,
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    #[allow(clippy::unwrap_used)]
    fn requests(&self) -> Vec<Value> {
        self.seen.lock().unwrap().clone()
    }

    /// Bind an ephemeral port serving the JSON (text) route and return the
    /// base URL.
    #[allow(clippy::unwrap_used)]
    async fn serve_json(self) -> String {
        let app = Router::new()
            .route("/generate_audio", post(json_handler))
            .with_state(self);
        serve(app).await
    }

    /// Same, but parsing multipart (audio) requests.
    #[allow(clippy::unwrap_used)]
    async fn serve_multipart(self) -> String {
        let app = Router::new()
            .route("/generate_audio", post(multipart_handler))
            .with_state(self);
        serve(app).await
    }
}

#[allow(clippy::unwrap_used)]
async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{}", addr)
}

#[allow(clippy::unwrap_used)]
async fn json_handler(
    State(mock): State<MockService>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    mock.seen.lock().unwrap().push(body);
    (mock.status, Json(mock.body.clone()))
}

#[allow(clippy::unwrap_used)]
async fn multipart_handler(
    State(mock): State<MockService>,
    mut multipart: Multipart,
) -> (StatusCode, Json<Value>) {
    let mut fields = serde_json::Map::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        if name == "audio" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await.unwrap();
            fields.insert(String::from("audio_file_name"), json!(file_name));
            fields.insert(String::from("audio_len"), json!(bytes.len()));
        } else {
            fields.insert(name, json!(field.text().await.unwrap()));
        }
    }
    mock.seen.lock().unwrap().push(Value::Object(fields));
    (mock.status, Json(mock.body.clone()))
}

fn text_request(text: &str, in_depth_mode: bool) -> SubmissionRequest {
    SubmissionRequest {
        input: SubmissionInput::Text(String::from(text)),
        in_depth_mode,
    }
}

/// WHAT: A text submission is one request carrying the exact text and flag
/// WHY: The wire contract is a single JSON object per submission
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_text_input_when_submitting_then_single_exact_json_request() {
    // Given: A service answering success
    let mock = MockService::new(
        StatusCode::OK,
        json!({"success": true, "video_url": "/v/1.mp4"}),
    );
    let base = mock.clone().serve_json().await;
    let client = SubmissionClient::new(base).unwrap();

    // When: Submitting text with in-depth mode on
    let result = client
        .submit(text_request("draw a pendulum", true))
        .await;

    // Then: Ok, and the service saw exactly one request with both values
    assert!(result.is_ok());
    let requests = mock.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0],
        json!({"text": "draw a pendulum", "inDepthMode": true})
    );
}

/// WHAT: A snake_case video_url response normalizes to the canonical field
/// WHY: Spec scenario -- {success:true, video_url:"/v/1.mp4"} yields Ok
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_snake_case_video_url_when_submitting_then_ok_with_url() {
    // Given: The older response spelling and no recognized text
    let mock = MockService::new(
        StatusCode::OK,
        json!({"success": true, "video_url": "/v/1.mp4"}),
    );
    let base = mock.serve_json().await;
    let client = SubmissionClient::new(base).unwrap();

    // When: Submitting
    let generation = client
        .submit(text_request("draw a pendulum", false))
        .await
        .unwrap();

    // Then: Canonical fields populated
    assert_eq!(generation.video_url, "/v/1.mp4");
    assert_eq!(generation.recognized_text, None);
}

/// WHAT: A camelCase videoUrl response resolves to the same canonical field
/// WHY: Both historical spellings must be accepted as synonyms
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_camel_case_video_url_when_submitting_then_ok_with_url() {
    // Given: The newer response spelling plus a recognized prompt
    let mock = MockService::new(
        StatusCode::OK,
        json!({"success": true, "videoUrl": "/v/2.mp4", "prompt": "ohms law"}),
    );
    let base = mock.serve_json().await;
    let client = SubmissionClient::new(base).unwrap();

    // When: Submitting
    let generation = client.submit(text_request("ohms law", false)).await.unwrap();

    // Then: Same canonical field regardless of spelling
    assert_eq!(generation.video_url, "/v/2.mp4");
    assert_eq!(generation.recognized_text.as_deref(), Some("ohms law"));
}

/// WHAT: When both spellings are present, snake_case wins; prompt beats text
/// WHY: The service sends both for compatibility; preference must be stable
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_both_spellings_when_submitting_then_preference_is_stable() {
    // Given: A body carrying every synonym at once
    let mock = MockService::new(
        StatusCode::OK,
        json!({
            "success": true,
            "video_url": "/v/snake.mp4",
            "videoUrl": "/v/camel.mp4",
            "prompt": "from prompt",
            "text": "from text"
        }),
    );
    let base = mock.serve_json().await;
    let client = SubmissionClient::new(base).unwrap();

    // When: Submitting
    let generation = client.submit(text_request("anything", false)).await.unwrap();

    // Then: snake_case URL and the prompt field are preferred
    assert_eq!(generation.video_url, "/v/snake.mp4");
    assert_eq!(generation.recognized_text.as_deref(), Some("from prompt"));
}

/// WHAT: success:true without any video reference is MalformedSuccess
/// WHY: A broken contract must not look like a transient network problem
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_success_without_video_when_submitting_then_malformed_success() {
    // Given: A success claim with only a blank URL
    let mock = MockService::new(
        StatusCode::OK,
        json!({"success": true, "video_url": "   ", "text": "heard you"}),
    );
    let base = mock.serve_json().await;
    let client = SubmissionClient::new(base).unwrap();

    // When: Submitting
    let result = client.submit(text_request("anything", false)).await;

    // Then: MalformedSuccess, not Transport or ServerRejected
    assert!(matches!(result, Err(CoreError::MalformedSuccess { .. })));
}

/// WHAT: success:false carries the server's error text verbatim
/// WHY: The user should see what the service actually said
#[tokio::test]
#[allow(clippy::unwrap_used, clippy::panic)]
async fn given_rejection_with_error_when_submitting_then_message_verbatim() {
    // Given: A rejection with an explanation
    let mock = MockService::new(
        StatusCode::OK,
        json!({"success": false, "error": "Could not understand audio"}),
    );
    let base = mock.serve_json().await;
    let client = SubmissionClient::new(base).unwrap();

    // When: Submitting
    let result = client.submit(text_request("mumble", false)).await;

    // Then: ServerRejected with the exact server text
    match result {
        Err(CoreError::ServerRejected { message, .. }) => {
            assert_eq!(message, "Could not understand audio");
        }
        other => panic!("expected ServerRejected, got {:?}", other),
    }
}

/// WHAT: success:false without error text falls back to a generic message
/// WHY: The caller always gets something displayable
#[tokio::test]
#[allow(clippy::unwrap_used, clippy::panic)]
async fn given_rejection_without_error_when_submitting_then_fallback_message() {
    // Given: A bare rejection
    let mock = MockService::new(StatusCode::OK, json!({"success": false}));
    let base = mock.serve_json().await;
    let client = SubmissionClient::new(base).unwrap();

    // When: Submitting
    let result = client.submit(text_request("anything", false)).await;

    // Then: The fallback message is used
    match result {
        Err(CoreError::ServerRejected { message, .. }) => {
            assert_eq!(message, "Failed to generate animation");
        }
        other => panic!("expected ServerRejected, got {:?}", other),
    }
}

/// WHAT: An HTTP 500 yields ServerRejected with a non-empty message
/// WHY: Bad statuses are a server verdict, not a transport failure
#[tokio::test]
#[allow(clippy::unwrap_used, clippy::panic)]
async fn given_http_500_when_submitting_then_server_rejected() {
    // Given: A service answering 500 with a body error
    let mock = MockService::new(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({"success": false, "error": "Pipeline error: render failed"}),
    );
    let base = mock.serve_json().await;
    let client = SubmissionClient::new(base).unwrap();

    // When: Submitting
    let result = client.submit(text_request("anything", false)).await;

    // Then: ServerRejected carrying the body's error text
    match result {
        Err(CoreError::ServerRejected { message, .. }) => {
            assert!(!message.is_empty());
            assert_eq!(message, "Pipeline error: render failed");
        }
        other => panic!("expected ServerRejected, got {:?}", other),
    }
}

/// WHAT: A connection failure is Transport, with the cause preserved
/// WHY: Transport problems are retriable by the user; server verdicts are not
#[tokio::test]
#[allow(clippy::unwrap_used, clippy::panic)]
async fn given_unreachable_service_when_submitting_then_transport_error() {
    // Given: A port nothing is listening on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    let client = SubmissionClient::new(base).unwrap();

    // When: Submitting
    let result = client.submit(text_request("anything", false)).await;

    // Then: Transport with a non-empty reason
    match result {
        Err(CoreError::Transport { reason, .. }) => assert!(!reason.is_empty()),
        other => panic!("expected Transport, got {:?}", other),
    }
}

/// WHAT: An audio submission is multipart with the fixed field names
/// WHY: The service reads `audio` and `inDepthMode` from the form by name
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_audio_input_when_submitting_then_multipart_fields_match() {
    // Given: A multipart-parsing service and a small payload
    let mock = MockService::new(
        StatusCode::OK,
        json!({"success": true, "videoUrl": "/v/3.mp4", "prompt": "projectile motion"}),
    );
    let base = mock.clone().serve_multipart().await;
    let client = SubmissionClient::new(base).unwrap();
    let payload = AudioPayload {
        bytes: vec![0u8; 2048],
        mime: "audio/wav",
    };

    // When: Submitting audio with in-depth mode on
    let generation = client
        .submit(SubmissionRequest {
            input: SubmissionInput::Audio(payload),
            in_depth_mode: true,
        })
        .await
        .unwrap();

    // Then: One request whose fields carry the payload and the flag
    assert_eq!(generation.video_url, "/v/3.mp4");
    let requests = mock.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["audio_file_name"], "recording.wav");
    assert_eq!(requests[0]["audio_len"], 2048);
    assert_eq!(requests[0]["inDepthMode"], "true");
}

/// WHAT: Trailing slashes in the base URL do not double up in the endpoint
/// WHY: The base URL is operator-supplied configuration
#[test]
#[allow(clippy::unwrap_used)]
fn given_trailing_slash_base_url_when_building_endpoint_then_normalized() {
    // Given/When: A client configured with a trailing slash
    let client = SubmissionClient::new("http://localhost:5001/").unwrap();

    // Then: A single slash before the route
    assert_eq!(client.endpoint(), "http://localhost:5001/generate_audio");
}

//! HTTP submission to the remote animation generation service.
//!
//! One `submit` call is exactly one `POST {base_url}/generate_audio`
//! round trip. The service's response envelope has drifted over time
//! (`video_url` vs `videoUrl`, `text` vs `prompt`); the synonym handling
//! is a compatibility shim kept in one place, [`Generation::from_raw`].

use crate::{CoreError, CoreResult, audio::AudioPayload};

use std::{panic::Location, time::Duration};

use error_location::ErrorLocation;
use reqwest::multipart;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Message used when the service rejects a submission without saying why.
pub(crate) const FALLBACK_REJECTION: &str = "Failed to generate animation";

/// How long to wait for a TCP connection before giving up.
///
/// Generation itself legitimately takes minutes, so there is no overall
/// request timeout -- only an unreachable host fails fast.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// What a submission carries: a typed-out description or a captured
/// recording.
#[derive(Debug, Clone)]
pub enum SubmissionInput {
    /// Free-text concept description.
    Text(String),
    /// Finished audio capture from a [`RecordingSession`].
    ///
    /// [`RecordingSession`]: crate::RecordingSession
    Audio(AudioPayload),
}

/// One submission to the generation service.
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    /// Text or audio input.
    pub input: SubmissionInput,
    /// Request a more elaborate multi-scene generation. Opaque here;
    /// passed through to the service.
    pub in_depth_mode: bool,
}

/// Normalized successful generation result.
///
/// Created once per submission and handed to the caller, which owns it
/// from then on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    /// Playable video reference, exactly as the server sent it (possibly
    /// server-relative; absolutizing is the caller's concern).
    pub video_url: String,
    /// What the service understood the user to have said, when provided.
    pub recognized_text: Option<String>,
}

#[derive(Serialize)]
struct TextBody<'a> {
    text: &'a str,
    #[serde(rename = "inDepthMode")]
    in_depth_mode: bool,
}

/// The service's response envelope with every historical field spelling.
///
/// Both spellings of a synonym pair can appear in the same body, so each
/// is kept as its own field rather than a serde alias (an alias would
/// reject such bodies as duplicates).
#[derive(Debug, Deserialize)]
pub(crate) struct RawGenerateResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    video_url: Option<String>,
    #[serde(default, rename = "videoUrl")]
    video_url_camel: Option<String>,
    #[serde(default)]
    prompt: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Generation {
    /// Normalize the service's envelope into a result value.
    ///
    /// Synonym preference: `video_url` over `videoUrl`, `prompt` over
    /// `text`. A success claim without a usable (non-blank) video
    /// reference is a broken contract, not a success.
    #[track_caller]
    pub(crate) fn from_raw(raw: RawGenerateResponse) -> CoreResult<Self> {
        if !raw.success {
            return Err(CoreError::ServerRejected {
                message: raw
                    .error
                    .unwrap_or_else(|| String::from(FALLBACK_REJECTION)),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let video_url = non_blank(raw.video_url).or_else(|| non_blank(raw.video_url_camel));

        match video_url {
            Some(video_url) => Ok(Generation {
                video_url,
                recognized_text: non_blank(raw.prompt).or_else(|| non_blank(raw.text)),
            }),
            None => Err(CoreError::MalformedSuccess {
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }
}

/// Client for the remote generation endpoint.
///
/// Stateless between calls -- every `submit` is an independent request;
/// no session or connection state is retained, and nothing is ever
/// retried automatically. Re-submission is the caller's decision.
pub struct SubmissionClient {
    http: reqwest::Client,
    base_url: String,
}

impl SubmissionClient {
    /// Create a client for the service at `base_url` (trailing slashes
    /// tolerated).
    #[track_caller]
    #[instrument(skip(base_url))]
    pub fn new(base_url: impl Into<String>) -> CoreResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| CoreError::Transport {
                reason: format!("Failed to build HTTP client: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let base_url = base_url.into().trim_end_matches('/').to_string();

        info!(base_url = %base_url, "SubmissionClient initialized");

        Ok(Self { http, base_url })
    }

    /// The full generation endpoint URL.
    pub fn endpoint(&self) -> String {
        format!("{}/generate_audio", self.base_url)
    }

    /// Submit text or audio and await the normalized result.
    ///
    /// Exactly one network round trip. Text goes as a JSON object, audio
    /// as a multipart form with the payload under the `audio` field and
    /// the in-depth flag as a stringified second field.
    #[instrument(skip(self, request), fields(in_depth = request.in_depth_mode))]
    pub async fn submit(&self, request: SubmissionRequest) -> CoreResult<Generation> {
        let url = self.endpoint();
        let SubmissionRequest {
            input,
            in_depth_mode,
        } = request;

        let builder = match input {
            SubmissionInput::Text(text) => {
                debug!(text_len = text.len(), "Submitting text");
                self.http.post(&url).json(&TextBody {
                    text: &text,
                    in_depth_mode,
                })
            }
            SubmissionInput::Audio(payload) => {
                debug!(byte_len = payload.bytes.len(), "Submitting audio");
                let part = multipart::Part::bytes(payload.bytes)
                    .file_name("recording.wav")
                    .mime_str(payload.mime)
                    .map_err(|e| CoreError::Encoding {
                        reason: format!("Invalid payload MIME tag: {}", e),
                        location: ErrorLocation::from(Location::caller()),
                    })?;
                let form = multipart::Form::new()
                    .part("audio", part)
                    .text("inDepthMode", in_depth_mode.to_string());
                self.http.post(&url).multipart(form)
            }
        };

        let response = builder.send().await.map_err(|e| CoreError::Transport {
            reason: e.to_string(),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| CoreError::Transport {
            reason: format!("Failed to read response body: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if !status.is_success() {
            // The service sends {"success": false, "error": ...} alongside
            // 4xx/5xx statuses; prefer its message when the body parses.
            let message = serde_json::from_str::<RawGenerateResponse>(&body)
                .ok()
                .and_then(|raw| raw.error)
                .unwrap_or_else(|| format!("Generation service returned HTTP {}", status));
            return Err(CoreError::ServerRejected {
                message,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let raw: RawGenerateResponse =
            serde_json::from_str(&body).map_err(|e| CoreError::ServerRejected {
                message: format!("Unreadable response from generation service: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        Generation::from_raw(raw)
    }
}

//! Voicemation Core Library
//!
//! Capture-and-submit pipeline for the Voicemation animation service:
//! record a spoken physics/math concept with CPAL, package it as a 16 kHz
//! WAV payload, and submit it (or plain text) to the remote generation
//! endpoint, normalizing the service's drifting response shapes into one
//! result value.
//!
//! # Example
//!
//! ```no_run
//! use voicemation_core::{
//!     AudioCapturer, CoreResult, RecordingSession, SubmissionClient,
//!     SubmissionInput, SubmissionRequest,
//! };
//!
//! #[tokio::main]
//! async fn main() -> CoreResult<()> {
//!     let capturer = AudioCapturer::new(None)?;
//!     let mut session = RecordingSession::new(capturer);
//!
//!     session.start()?;
//!     std::thread::sleep(std::time::Duration::from_secs(3));
//!     session.stop()?;
//!
//!     let (payload, ticket) = session.begin_upload()?;
//!     let client = SubmissionClient::new("http://localhost:5001")?;
//!     let outcome = client
//!         .submit(SubmissionRequest {
//!             input: SubmissionInput::Audio(payload),
//!             in_depth_mode: false,
//!         })
//!         .await;
//!     session.finish_upload(ticket, &outcome);
//!
//!     println!("Video: {}", outcome?.video_url);
//!     Ok(())
//! }
//! ```

mod audio;
mod client;
mod error;
mod session;

pub use {
    audio::{AudioCapturer, AudioPayload, CaptureBackend, CaptureBuffer},
    client::{Generation, SubmissionClient, SubmissionInput, SubmissionRequest},
    error::{CoreError, Result as CoreResult},
    session::{RecordingSession, SessionState, UploadTicket},
};

#[cfg(test)]
mod tests;

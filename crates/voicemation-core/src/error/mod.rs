use crate::session::SessionState;

use error_location::ErrorLocation;
use thiserror::Error;

/// Capture and submission errors with source location tracking.
///
/// Every failure in this crate is returned as a value; nothing panics
/// across the component boundary. None of these are fatal -- the caller
/// decides whether to surface, log, or re-invoke the failed operation.
#[derive(Error, Debug)]
pub enum CoreError {
    /// No audio input device is available on this machine.
    #[error("No microphone found {location}")]
    NoMicrophoneFound {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The user or OS refused microphone access.
    #[error("Microphone access denied: {reason} {location}")]
    PermissionDenied {
        /// Backend-reported denial reason.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The recording device failed to open or failed mid-capture.
    #[error("Audio device error: {reason} {location}")]
    DeviceError {
        /// Description of the device error.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Recording stopped without producing any samples.
    #[error("No audio captured {location}")]
    NoAudioCaptured {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// An operation was invoked in a state that does not permit it.
    ///
    /// The session is left unchanged; the caller may retry once the
    /// state machine has moved on.
    #[error("Cannot {operation} while session is {state:?} {location}")]
    InvalidState {
        /// The rejected operation.
        operation: &'static str,
        /// The state the session was in at the time.
        state: SessionState,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Audio downsampling failed.
    #[error("Resampling error: {reason} {location}")]
    Resampling {
        /// Description of the resampling error.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// WAV encoding of the captured samples failed.
    #[error("Audio encoding error: {reason} {location}")]
    Encoding {
        /// Description of the encoding error.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The request never produced an HTTP response (connection refused,
    /// DNS failure, broken transport).
    #[error("Network error: {reason} {location}")]
    Transport {
        /// Underlying transport error message.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The generation service answered but reported failure, either as a
    /// non-success HTTP status or as `success: false` in the body.
    #[error("{message} {location}")]
    ServerRejected {
        /// Server-supplied error text, or a fallback message.
        message: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The generation service claimed success but returned no usable
    /// video reference. Kept distinct from [`CoreError::Transport`] so
    /// callers do not treat a broken contract as a transient network
    /// problem.
    #[error("Generation service claimed success but returned no video {location}")]
    MalformedSuccess {
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

/// Result type alias using [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;

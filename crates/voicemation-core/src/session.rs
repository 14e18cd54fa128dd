//! Microphone capture lifecycle state machine.
//!
//! A [`RecordingSession`] walks one recording through
//! `Idle → RequestingPermission → Recording → Stopped → Uploading →
//! Succeeded/Failed`, owns the captured payload between stop and upload
//! completion, and guards against a superseded upload result overwriting
//! newer state.

use crate::{
    CoreError, CoreResult, Generation,
    audio::{
        AudioPayload, CaptureBackend, CaptureBuffer, Downsampler, UPLOAD_SAMPLE_RATE,
        downmix_to_mono, encode_wav,
    },
};

use std::panic::Location;

use error_location::ErrorLocation;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Where a recording session currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No recording in progress and nothing captured.
    Idle,
    /// Waiting on the OS/user microphone permission decision.
    RequestingPermission,
    /// Capturing audio; `elapsed_seconds` ticks once per second.
    Recording,
    /// Capture finalized; payload ready for upload.
    Stopped,
    /// Payload handed to a submission in flight.
    Uploading,
    /// The submission produced an animation. Terminal until `reset()`.
    Succeeded,
    /// Capture or submission failed. Terminal until `reset()` or a fresh
    /// `start()`.
    Failed,
}

impl SessionState {
    /// Whether the session has finished its lifecycle and needs `reset()`
    /// (or `start()` from `Failed`) to be used again.
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Succeeded | SessionState::Failed)
    }
}

/// Stamp tying an in-flight upload to the recording that produced it.
///
/// Returned by [`RecordingSession::begin_upload`] and required by
/// [`RecordingSession::finish_upload`]. A ticket from a superseded
/// recording no longer matches the session's generation counter, so its
/// late result is ignored instead of clobbering newer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadTicket {
    generation: u64,
}

/// Capture lifecycle state machine over a [`CaptureBackend`].
///
/// Not thread-safe by itself; callers share it behind a lock and drive
/// `tick()` from their own 1-second timer while recording. All failures
/// are returned as values and leave the session in a well-defined state.
pub struct RecordingSession<B: CaptureBackend> {
    backend: B,
    state: SessionState,
    elapsed_seconds: u64,
    captured: Option<AudioPayload>,
    generation: u64,
    session_id: Uuid,
    last_error: Option<String>,
}

impl<B: CaptureBackend> RecordingSession<B> {
    /// Create an idle session over the given capture backend.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: SessionState::Idle,
            elapsed_seconds: 0,
            captured: None,
            generation: 0,
            session_id: Uuid::new_v4(),
            last_error: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Seconds of recording so far, reset on each new recording.
    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    /// Unique ID of the current recording, for log correlation.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// The finalized payload, present only between `Stopped` and upload
    /// completion.
    pub fn payload(&self) -> Option<&AudioPayload> {
        self.captured.as_ref()
    }

    /// Human-readable cause of the last failure, if the session is
    /// `Failed`.
    pub fn failure_message(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Start a new recording.
    ///
    /// Valid only from `Idle` or `Failed`; any other state is rejected
    /// with [`CoreError::InvalidState`] and the session is unchanged, so
    /// pressing "record" twice cannot restart a live capture.
    ///
    /// Opening the backend is the permission boundary and may suspend the
    /// calling thread until the user decides. Denial or device failure
    /// moves the session to `Failed`; it is never retried here.
    #[instrument(skip(self))]
    pub fn start(&mut self) -> CoreResult<()> {
        match self.state {
            SessionState::Idle | SessionState::Failed => {}
            state => {
                return Err(CoreError::InvalidState {
                    operation: "start recording",
                    state,
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        }

        self.generation += 1;
        self.session_id = Uuid::new_v4();
        self.captured = None;
        self.elapsed_seconds = 0;
        self.last_error = None;
        self.state = SessionState::RequestingPermission;

        info!(
            session_id = %self.session_id,
            backend = self.backend.name(),
            "Requesting capture device"
        );

        match self.backend.open() {
            Ok(()) => {
                self.state = SessionState::Recording;
                info!(session_id = %self.session_id, "Recording started");
                Ok(())
            }
            Err(e) => {
                self.fail(&e);
                warn!(session_id = %self.session_id, error = %e, "Capture device unavailable");
                Err(e)
            }
        }
    }

    /// Advance the elapsed-seconds counter by one.
    ///
    /// No-op outside `Recording`. Driven by the caller's periodic timer;
    /// keeping the clock external makes the lifecycle deterministic to
    /// test.
    pub fn tick(&mut self) {
        if self.state == SessionState::Recording {
            self.elapsed_seconds += 1;
        }
    }

    /// Stop the current recording and finalize the capture payload.
    ///
    /// Valid only from `Recording`. The capture device is released
    /// unconditionally -- the microphone indicator turns off even when
    /// draining or encoding fails afterwards.
    #[instrument(skip(self))]
    pub fn stop(&mut self) -> CoreResult<()> {
        if self.state != SessionState::Recording {
            return Err(CoreError::InvalidState {
                operation: "stop recording",
                state: self.state,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let drained = self.backend.drain();
        // Unconditional: the device goes back to the OS no matter what
        // happens to the payload from here on.
        self.backend.release();

        let buffer = match drained {
            Ok(buffer) => buffer,
            Err(e) => {
                self.fail(&e);
                return Err(e);
            }
        };

        let payload = match finalize_payload(buffer) {
            Ok(payload) => payload,
            Err(e) => {
                self.fail(&e);
                return Err(e);
            }
        };

        info!(
            session_id = %self.session_id,
            duration_s = self.elapsed_seconds,
            byte_len = payload.bytes.len(),
            "Recording stopped"
        );

        self.captured = Some(payload);
        self.state = SessionState::Stopped;

        Ok(())
    }

    /// Hand out the payload for submission and enter `Uploading`.
    ///
    /// Valid only from `Stopped`. The returned [`UploadTicket`] must be
    /// passed back to [`finish_upload`] along with the outcome.
    ///
    /// [`finish_upload`]: RecordingSession::finish_upload
    #[instrument(skip(self))]
    pub fn begin_upload(&mut self) -> CoreResult<(AudioPayload, UploadTicket)> {
        if self.state != SessionState::Stopped {
            return Err(CoreError::InvalidState {
                operation: "begin upload",
                state: self.state,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        // Invariant: Stopped implies a non-empty payload.
        let payload = match self.captured.clone() {
            Some(payload) => payload,
            None => {
                let e = CoreError::NoAudioCaptured {
                    location: ErrorLocation::from(Location::caller()),
                };
                self.fail(&e);
                return Err(e);
            }
        };

        self.state = SessionState::Uploading;
        debug!(session_id = %self.session_id, "Upload started");

        Ok((payload, UploadTicket {
            generation: self.generation,
        }))
    }

    /// Apply a submission outcome to the session.
    ///
    /// Returns `true` when the outcome was applied. A stale ticket -- one
    /// from a recording that has since been superseded, or arriving after
    /// the session already left `Uploading` -- is ignored and `false` is
    /// returned, so a late response can never overwrite newer state.
    ///
    /// The payload is discarded on both outcomes; the caller owns the
    /// [`Generation`] itself.
    #[instrument(skip(self, outcome))]
    pub fn finish_upload(
        &mut self,
        ticket: UploadTicket,
        outcome: &CoreResult<Generation>,
    ) -> bool {
        if ticket.generation != self.generation || self.state != SessionState::Uploading {
            debug!(
                session_id = %self.session_id,
                ticket_generation = ticket.generation,
                current_generation = self.generation,
                state = ?self.state,
                "Ignoring stale upload result"
            );
            return false;
        }

        self.captured = None;

        match outcome {
            Ok(generation) => {
                self.state = SessionState::Succeeded;
                self.last_error = None;
                info!(
                    session_id = %self.session_id,
                    video_url = %generation.video_url,
                    "Upload succeeded"
                );
            }
            Err(e) => {
                self.state = SessionState::Failed;
                self.last_error = Some(e.to_string());
                warn!(session_id = %self.session_id, error = %e, "Upload failed");
            }
        }

        true
    }

    /// Return a finished session to `Idle`, clearing the payload and the
    /// elapsed counter.
    ///
    /// Valid only from the terminal states `Succeeded` and `Failed`.
    #[instrument(skip(self))]
    pub fn reset(&mut self) -> CoreResult<()> {
        if !self.state.is_terminal() {
            return Err(CoreError::InvalidState {
                operation: "reset",
                state: self.state,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        self.state = SessionState::Idle;
        self.captured = None;
        self.elapsed_seconds = 0;
        self.last_error = None;

        debug!(session_id = %self.session_id, "Session reset");

        Ok(())
    }

    fn fail(&mut self, cause: &CoreError) {
        self.state = SessionState::Failed;
        self.captured = None;
        self.last_error = Some(cause.to_string());
    }
}

/// Turn drained device samples into the upload payload: downmix to mono,
/// downsample to the upload rate, encode WAV.
#[track_caller]
fn finalize_payload(buffer: CaptureBuffer) -> CoreResult<AudioPayload> {
    if buffer.samples.is_empty() {
        return Err(CoreError::NoAudioCaptured {
            location: ErrorLocation::from(Location::caller()),
        });
    }

    let mono = downmix_to_mono(&buffer.samples, buffer.channels);

    let samples = if buffer.sample_rate != UPLOAD_SAMPLE_RATE {
        Downsampler::new(buffer.sample_rate)?.downsample(&mono)?
    } else {
        mono
    };

    if samples.is_empty() {
        return Err(CoreError::NoAudioCaptured {
            location: ErrorLocation::from(Location::caller()),
        });
    }

    encode_wav(&samples, UPLOAD_SAMPLE_RATE)
}

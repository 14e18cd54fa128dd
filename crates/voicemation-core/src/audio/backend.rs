use crate::CoreResult;

/// Raw audio drained from a capture device.
#[derive(Debug, Clone)]
pub struct CaptureBuffer {
    /// Interleaved f32 samples as delivered by the device.
    pub samples: Vec<f32>,
    /// Device sample rate in Hz.
    pub sample_rate: u32,
    /// Number of interleaved channels.
    pub channels: u16,
}

/// Capture device abstraction behind [`RecordingSession`].
///
/// The production implementation is [`AudioCapturer`] (cpal). The seam
/// exists so the session state machine can be driven in tests without a
/// physical microphone.
///
/// Contract: `open` acquires the device (this is where an OS permission
/// prompt may suspend the caller indefinitely); `drain` stops collection
/// and hands back everything captured since `open`; `release` gives the
/// device back to the OS and must be safe to call in any state, as the
/// session invokes it unconditionally when a recording ends.
///
/// [`RecordingSession`]: crate::RecordingSession
/// [`AudioCapturer`]: crate::AudioCapturer
pub trait CaptureBackend: Send {
    /// Acquire the input device and start collecting samples.
    fn open(&mut self) -> CoreResult<()>;

    /// Stop collecting and return all samples captured since [`open`].
    ///
    /// Does not release the device; the session calls [`release`]
    /// afterwards whether or not draining succeeded.
    ///
    /// [`open`]: CaptureBackend::open
    /// [`release`]: CaptureBackend::release
    fn drain(&mut self) -> CoreResult<CaptureBuffer>;

    /// Release the underlying device. Idempotent.
    fn release(&mut self);

    /// Backend name for logging.
    fn name(&self) -> &str;
}

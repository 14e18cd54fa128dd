use crate::{
    CoreError, CoreResult,
    audio::{CaptureBackend, CaptureBuffer},
};

use std::{
    collections::VecDeque,
    panic::Location,
    sync::{
        atomic::{AtomicBool, Ordering},
        {Arc, Mutex},
    },
};

use cpal::{
    Device, Stream, StreamConfig,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};
use error_location::ErrorLocation;
use tracing::{debug, error, info, instrument, warn};

/// Maximum interleaved samples to buffer (5 minutes at 48kHz mono,
/// half that for stereo devices).
/// Prevents unbounded memory growth if the user forgets to stop.
///
/// **Memory footprint at max capacity:**
/// - 48,000 Hz * 60s * 5 min * 4 bytes/f32 = ~58MB
/// - A spoken animation prompt is a few seconds; this is a hard ceiling
pub(crate) const MAX_BUFFER_SAMPLES: usize = 48_000 * 60 * 5;

/// Classify a capture-layer failure string.
///
/// cpal reports OS permission refusals as backend-specific errors with no
/// dedicated variant, so the distinction between "user said no" and "the
/// device broke" has to be made from the message text. Both are terminal
/// for the current attempt either way; the split only changes what the
/// caller tells the user.
#[track_caller]
pub(crate) fn classify_device_failure(reason: String) -> CoreError {
    let lowered = reason.to_lowercase();
    let denied = ["permission", "denied", "not permitted", "unauthorized"]
        .iter()
        .any(|needle| lowered.contains(needle));

    if denied {
        CoreError::PermissionDenied {
            reason,
            location: ErrorLocation::from(Location::caller()),
        }
    } else {
        CoreError::DeviceError {
            reason,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

/// Microphone capturer backed by cpal.
///
/// Collects interleaved f32 samples into a bounded ring buffer from the
/// moment [`open`] succeeds until [`drain`] is called.
///
/// [`open`]: CaptureBackend::open
/// [`drain`]: CaptureBackend::drain
pub struct AudioCapturer {
    device: Device,
    device_name: String,
    config: StreamConfig,
    stream: Option<Stream>,
    samples: Arc<Mutex<VecDeque<f32>>>,
    /// Signals the audio callback to stop writing. Set to `true` before
    /// dropping the stream so no in-flight callback writes after the
    /// lock is acquired in `drain()`.
    shutdown: Arc<AtomicBool>,
}

impl AudioCapturer {
    /// Create a capturer for the named input device, or the default
    /// device when `preferred_device` is `None` or not found.
    #[track_caller]
    #[instrument(skip(preferred_device))]
    pub fn new(preferred_device: Option<&str>) -> CoreResult<Self> {
        let host = cpal::default_host();

        let device = Self::select_device(&host, preferred_device)?;

        let device_name = device
            .name()
            .unwrap_or_else(|_| String::from("<unnamed device>"));

        let config = device.default_input_config().map_err(|e| {
            classify_device_failure(format!("Failed to get input config: {}", e))
        })?;

        info!(
            device = %device_name,
            sample_rate = config.sample_rate(),
            channels = config.channels(),
            "AudioCapturer initialized"
        );

        Ok(Self {
            device,
            device_name,
            config: config.into(),
            stream: None,
            samples: Arc::new(Mutex::new(VecDeque::with_capacity(MAX_BUFFER_SAMPLES))),
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    #[track_caller]
    fn select_device(host: &cpal::Host, preferred: Option<&str>) -> CoreResult<Device> {
        if let Some(wanted) = preferred {
            let mut devices = host.input_devices().map_err(|e| {
                classify_device_failure(format!("Failed to enumerate input devices: {}", e))
            })?;

            if let Some(device) =
                devices.find(|d| d.name().map(|n| n == wanted).unwrap_or(false))
            {
                return Ok(device);
            }

            warn!(
                device = wanted,
                "Configured input device not found, falling back to default"
            );
        }

        host.default_input_device()
            .ok_or(CoreError::NoMicrophoneFound {
                location: ErrorLocation::from(Location::caller()),
            })
    }
}

impl CaptureBackend for AudioCapturer {
    #[instrument(skip(self))]
    fn open(&mut self) -> CoreResult<()> {
        let samples = Arc::clone(&self.samples);
        let shutdown = Arc::clone(&self.shutdown);

        // Reset shutdown flag for the new recording
        self.shutdown.store(false, Ordering::Release);

        // Clear samples from any previous recording
        samples
            .lock()
            .unwrap_or_else(|e| {
                error!("Sample buffer lock poisoned, recovering: {}", e);
                e.into_inner()
            })
            .clear();

        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    // Check shutdown flag before acquiring the lock: once
                    // drain() sets it, no new samples are written even if
                    // one more callback fires before the stream is dropped.
                    if shutdown.load(Ordering::Acquire) {
                        return;
                    }
                    // Recover from lock poison rather than dropping audio.
                    let mut buf = samples.lock().unwrap_or_else(|e| {
                        error!("Sample buffer lock poisoned, recovering: {}", e);
                        e.into_inner()
                    });
                    buf.extend(data.iter().copied());
                    // Ring buffer: O(1) amortized drop of oldest samples
                    while buf.len() > MAX_BUFFER_SAMPLES {
                        buf.pop_front();
                    }
                },
                |err| {
                    error!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| classify_device_failure(format!("Failed to open input stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| classify_device_failure(format!("Failed to start input stream: {}", e)))?;

        self.stream = Some(stream);
        info!(device = %self.device_name, "Audio capture started");

        Ok(())
    }

    #[instrument(skip(self))]
    fn drain(&mut self) -> CoreResult<CaptureBuffer> {
        // Signal the callback to stop writing BEFORE dropping the stream:
        // even if a backend's Stream::drop() is asynchronous, the callback
        // observes the flag and returns early, so nothing is written after
        // the lock below is acquired.
        self.shutdown.store(true, Ordering::Release);

        if let Some(stream) = self.stream.take() {
            drop(stream);
            // Brief yield so any in-flight callback observes the shutdown
            // flag and completes before we read the buffer.
            std::thread::sleep(std::time::Duration::from_millis(5));
            info!("Audio capture stopped");
        }

        let samples: Vec<f32> = self
            .samples
            .lock()
            .unwrap_or_else(|e| {
                error!("Sample buffer lock poisoned, recovering: {}", e);
                e.into_inner()
            })
            .iter()
            .copied()
            .collect();

        debug!(sample_count = samples.len(), "Captured audio samples");

        Ok(CaptureBuffer {
            samples,
            sample_rate: self.config.sample_rate,
            channels: self.config.channels,
        })
    }

    fn release(&mut self) {
        // Dropping the stream hands the device back to the OS, which is
        // what turns the microphone indicator off. drain() normally does
        // this; releasing again here is a no-op.
        self.shutdown.store(true, Ordering::Release);
        if let Some(stream) = self.stream.take() {
            drop(stream);
            info!(device = %self.device_name, "Audio device released");
        }
    }

    fn name(&self) -> &str {
        &self.device_name
    }
}

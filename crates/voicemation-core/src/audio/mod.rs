mod backend;
pub(crate) mod capture;
mod encoder;
mod resampler;

pub(crate) use {resampler::Downsampler, resampler::UPLOAD_SAMPLE_RATE};

pub use {
    backend::{CaptureBackend, CaptureBuffer},
    capture::AudioCapturer,
    encoder::AudioPayload,
};

pub(crate) use encoder::{downmix_to_mono, encode_wav};

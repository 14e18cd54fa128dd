use crate::{CoreError, CoreResult};

use std::{io::Cursor, panic::Location};

use error_location::ErrorLocation;
use tracing::{debug, instrument};

/// MIME tag attached to encoded capture payloads.
pub(crate) const UPLOAD_MIME: &str = "audio/wav";

/// A finished, uploadable audio capture.
///
/// Exists only between a stopped recording and the end of its submission;
/// the session discards it once an upload completes either way.
#[derive(Debug, Clone)]
pub struct AudioPayload {
    /// Encoded container bytes (16-bit PCM WAV).
    pub bytes: Vec<u8>,
    /// MIME/container tag for the multipart upload.
    pub mime: &'static str,
}

impl AudioPayload {
    /// Whether the payload carries any audio data.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Collapse interleaved multi-channel samples to mono by averaging.
///
/// Device default configs are frequently stereo; the generation service
/// wants a single channel.
pub(crate) fn downmix_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }

    let channels = channels as usize;
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Encode mono f32 samples as an in-memory 16-bit PCM WAV file.
#[track_caller]
#[instrument(skip(samples))]
pub(crate) fn encode_wav(samples: &[f32], sample_rate: u32) -> CoreResult<AudioPayload> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut bytes = Vec::with_capacity(44 + samples.len() * 2);
    {
        let cursor = Cursor::new(&mut bytes);
        let mut writer = hound::WavWriter::new(cursor, spec).map_err(|e| CoreError::Encoding {
            reason: format!("Failed to create WAV writer: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        for &sample in samples {
            let quantized = (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16;
            writer
                .write_sample(quantized)
                .map_err(|e| CoreError::Encoding {
                    reason: format!("Failed to write sample: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                })?;
        }

        writer.finalize().map_err(|e| CoreError::Encoding {
            reason: format!("Failed to finalize WAV: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;
    }

    debug!(
        sample_count = samples.len(),
        byte_len = bytes.len(),
        "Encoded capture payload"
    );

    Ok(AudioPayload {
        bytes,
        mime: UPLOAD_MIME,
    })
}

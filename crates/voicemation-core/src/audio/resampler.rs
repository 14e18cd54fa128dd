use crate::{CoreError, CoreResult};

use std::panic::Location;

use audioadapter_buffers::direct::InterleavedSlice;
use error_location::ErrorLocation;
use rubato::{Fft, FixedSync, Resampler as RubatoResampler};
use tracing::{debug, instrument};

/// Sample rate of the uploaded payload.
///
/// 16 kHz mono is what the generation service's speech recognizer wants,
/// and it keeps upload size down: a 30 s prompt is ~1MB instead of the
/// ~11MB a stereo 48 kHz capture would be.
pub(crate) const UPLOAD_SAMPLE_RATE: u32 = 16_000;

/// Chunked FFT downsampler from the device rate to [`UPLOAD_SAMPLE_RATE`].
pub(crate) struct Downsampler {
    resampler: Fft<f32>,
    input_rate: u32,
    chunk_size: usize,
}

impl Downsampler {
    #[track_caller]
    #[instrument]
    pub fn new(input_rate: u32) -> CoreResult<Self> {
        let chunk_size = 1024;
        let sub_chunks = 2;

        let resampler = Fft::<f32>::new(
            input_rate as usize,
            UPLOAD_SAMPLE_RATE as usize,
            chunk_size,
            sub_chunks,
            1, // mono; the session downmixes before resampling
            FixedSync::Input,
        )
        .map_err(|e| CoreError::Resampling {
            reason: format!("Failed to create resampler: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        debug!(
            input_rate = input_rate,
            output_rate = UPLOAD_SAMPLE_RATE,
            chunk_size = chunk_size,
            "Downsampler initialized"
        );

        Ok(Self {
            resampler,
            input_rate,
            chunk_size,
        })
    }

    /// Downsample mono samples to the upload rate.
    ///
    /// The final partial chunk is zero-padded into the resampler and the
    /// output truncated to the rate-converted length, so trailing silence
    /// never exceeds one chunk.
    #[track_caller]
    #[instrument(skip(self, samples))]
    pub fn downsample(&mut self, samples: &[f32]) -> CoreResult<Vec<f32>> {
        if samples.is_empty() {
            return Ok(Vec::new());
        }

        let estimated_len =
            (samples.len() as f64 * UPLOAD_SAMPLE_RATE as f64 / self.input_rate as f64) as usize;
        let mut output = Vec::with_capacity(estimated_len);

        for chunk in samples.chunks(self.chunk_size) {
            let input_chunk = if chunk.len() < self.chunk_size {
                let mut padded = chunk.to_vec();
                padded.resize(self.chunk_size, 0.0);
                padded
            } else {
                chunk.to_vec()
            };

            let input_adapter =
                InterleavedSlice::new(&input_chunk, 1, self.chunk_size).map_err(|e| {
                    CoreError::Resampling {
                        reason: format!("Failed to create input adapter: {}", e),
                        location: ErrorLocation::from(Location::caller()),
                    }
                })?;

            let output_frames = self.resampler.output_frames_max();
            let mut output_chunk = vec![0.0f32; output_frames];

            let mut output_adapter = InterleavedSlice::new_mut(&mut output_chunk, 1, output_frames)
                .map_err(|e| CoreError::Resampling {
                    reason: format!("Failed to create output adapter: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                })?;

            let (_input_frames, output_frames_written) = self
                .resampler
                .process_into_buffer(&input_adapter, &mut output_adapter, None)
                .map_err(|e| CoreError::Resampling {
                    reason: format!("Resampling failed: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                })?;

            output.extend_from_slice(&output_chunk[..output_frames_written]);
        }

        output.truncate(estimated_len);

        debug!(
            input_len = samples.len(),
            output_len = output.len(),
            input_rate = self.input_rate,
            "Downsampled audio for upload"
        );

        Ok(output)
    }
}

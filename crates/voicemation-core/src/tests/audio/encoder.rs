use crate::audio::{downmix_to_mono, encode_wav};

/// WHAT: Stereo frames are averaged into mono
/// WHY: The generation service expects single-channel audio
#[test]
fn given_stereo_samples_when_downmixing_then_frames_averaged() {
    // Given: Two interleaved stereo frames
    let samples = [0.2f32, 0.4, -1.0, 1.0];

    // When: Downmixing
    let mono = downmix_to_mono(&samples, 2);

    // Then: Each frame collapses to its average
    assert_eq!(mono.len(), 2);
    assert!((mono[0] - 0.3).abs() < f32::EPSILON);
    assert!(mono[1].abs() < f32::EPSILON);
}

/// WHAT: Mono input passes through downmixing unchanged
/// WHY: Single-channel devices must not pay a conversion cost or drift
#[test]
fn given_mono_samples_when_downmixing_then_unchanged() {
    // Given: Mono samples
    let samples = [0.1f32, -0.2, 0.3];

    // When: Downmixing with one channel
    let mono = downmix_to_mono(&samples, 1);

    // Then: Identical output
    assert_eq!(mono, samples.to_vec());
}

/// WHAT: Encoded payload is a parseable 16-bit mono WAV at the given rate
/// WHY: The service's recognizer rejects malformed containers
#[test]
#[allow(clippy::unwrap_used)]
fn given_samples_when_encoding_then_valid_wav_container() {
    // Given: A short ramp of samples
    let samples: Vec<f32> = (0..160).map(|i| (i as f32 / 160.0) - 0.5).collect();

    // When: Encoding at 16 kHz
    let payload = encode_wav(&samples, 16_000).unwrap();

    // Then: hound reads back the same spec and sample count
    assert_eq!(payload.mime, "audio/wav");
    assert!(!payload.is_empty());

    let reader = hound::WavReader::new(std::io::Cursor::new(payload.bytes)).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.sample_rate, 16_000);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(reader.len(), 160);
}

/// WHAT: Out-of-range samples are clamped, not wrapped
/// WHY: Clipping distortion is recoverable; integer wraparound is garbage
#[test]
#[allow(clippy::unwrap_used)]
fn given_overdriven_samples_when_encoding_then_clamped_to_full_scale() {
    // Given: Samples beyond [-1.0, 1.0]
    let samples = [2.0f32, -2.0];

    // When: Encoding
    let payload = encode_wav(&samples, 16_000).unwrap();

    // Then: Decoded values sit at full scale
    let mut reader = hound::WavReader::new(std::io::Cursor::new(payload.bytes)).unwrap();
    let decoded: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(decoded, vec![i16::MAX, -i16::MAX]);
}

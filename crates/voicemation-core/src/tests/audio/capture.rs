use crate::CoreError;
use crate::audio::AudioCapturer;
use crate::audio::capture::{MAX_BUFFER_SAMPLES, classify_device_failure};

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// WHAT: Buffer respects MAX_BUFFER_SAMPLES limit
/// WHY: Prevents unbounded memory growth if a recording is never stopped
#[test]
fn given_buffer_at_max_capacity_when_adding_samples_then_oldest_discarded() {
    // Given: A VecDeque at max capacity filled with 0.0
    let mut buf = VecDeque::with_capacity(MAX_BUFFER_SAMPLES);
    buf.extend(std::iter::repeat(0.0f32).take(MAX_BUFFER_SAMPLES));
    assert_eq!(buf.len(), MAX_BUFFER_SAMPLES);

    // When: Adding 1024 new samples (value 1.0) beyond the limit
    let new_samples = vec![1.0f32; 1024];
    buf.extend(new_samples.iter().copied());
    while buf.len() > MAX_BUFFER_SAMPLES {
        buf.pop_front();
    }

    // Then: Buffer stays at MAX_BUFFER_SAMPLES and newest samples preserved
    assert_eq!(buf.len(), MAX_BUFFER_SAMPLES);
    assert!((buf[MAX_BUFFER_SAMPLES - 1] - 1.0).abs() < f32::EPSILON);
    assert!((buf[MAX_BUFFER_SAMPLES - 1024] - 1.0).abs() < f32::EPSILON);
}

/// WHAT: Lock poison recovery preserves buffer data
/// WHY: Ensures audio data is never silently lost on mutex poison
#[test]
#[allow(clippy::unwrap_used, clippy::panic)]
fn given_poisoned_mutex_when_recovering_then_data_preserved() {
    // Given: A mutex poisoned by a panic while holding the lock
    let buf = Arc::new(Mutex::new(VecDeque::from(vec![0.5f32; 100])));
    let buf_clone = Arc::clone(&buf);

    let _ = std::thread::spawn(move || {
        let _guard = buf_clone.lock().unwrap();
        panic!("intentional panic to poison mutex");
    })
    .join();

    // When: Recovering from the poisoned lock
    let recovered = buf.lock().unwrap_or_else(|e| e.into_inner());

    // Then: Original data is fully preserved
    assert_eq!(recovered.len(), 100);
    assert!(recovered.iter().all(|&s| (s - 0.5).abs() < f32::EPSILON));
}

/// WHAT: Permission-flavored device failures classify as PermissionDenied
/// WHY: "User said no" and "device broke" need different user messaging
#[test]
fn given_permission_failure_text_when_classifying_then_permission_denied() {
    // Given/When: Backend messages that indicate an OS refusal
    let denied = [
        "Operation not permitted",
        "Access denied by the user",
        "TCC permission missing for microphone",
    ];

    // Then: All classify as PermissionDenied
    for reason in denied {
        assert!(matches!(
            classify_device_failure(String::from(reason)),
            CoreError::PermissionDenied { .. }
        ));
    }
}

/// WHAT: Other device failures classify as DeviceError
/// WHY: Unknown failures default to the device bucket, never to denial
#[test]
#[allow(clippy::panic)]
fn given_generic_failure_text_when_classifying_then_device_error() {
    // Given/When: A backend message with no permission wording
    let result = classify_device_failure(String::from("stream format not supported"));

    // Then: DeviceError with the reason preserved
    match result {
        CoreError::DeviceError { reason, .. } => {
            assert_eq!(reason, "stream format not supported");
        }
        other => panic!("expected DeviceError, got {:?}", other),
    }
}

/// WHAT: A capturer opens against real hardware
/// WHY: Smoke test for the cpal plumbing on machines with a microphone
#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn given_hardware_when_creating_capturer_then_succeeds() {
    // Given/When: Creating a capturer for the default device
    let result = AudioCapturer::new(None);

    // Then: A device was found and configured
    assert!(result.is_ok());
}

/// Tray icon states corresponding to the capture-and-submit workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayIconState {
    /// Ready to start recording.
    Idle,
    /// Currently recording audio.
    Recording,
    /// Waiting on the generation service.
    Generating,
}

/// Commands sent from the hotkey handler to the main application.
#[derive(Debug, Clone, Copy)]
pub enum AppCommand {
    /// Toggle the recording session: start when idle, stop and submit
    /// when recording. The session's own state decides which.
    ToggleRecording,
    /// Request application shutdown.
    Shutdown,
}

use crate::{AppCommand, AppResult, ResultHandler, TrayCommand, TrayIconState, config::Config};

use std::{sync::Arc, time::Duration};

use tao::event_loop::EventLoopProxy;
use tokio::sync::{Mutex, mpsc, watch};
use tracing::{debug, error, info, instrument, warn};
use tray_icon::menu::MenuEvent;
use voicemation_core::{
    AudioCapturer, RecordingSession, SessionState, SubmissionClient, SubmissionInput,
    SubmissionRequest,
};

/// Main application state.
///
/// Runs on the async runtime thread. Communicates tray icon updates back
/// to the main thread via `tray_proxy` because `TrayIcon` is `!Send` and
/// must remain on the UI thread.
pub struct App {
    pub(crate) session: Arc<Mutex<RecordingSession<AudioCapturer>>>,
    pub(crate) client: Arc<SubmissionClient>,
    pub(crate) result_handler: Arc<Mutex<ResultHandler>>,
    pub(crate) config: Arc<Mutex<Config>>,
    pub(crate) tray_proxy: EventLoopProxy<TrayCommand>,
    pub(crate) command_tx: mpsc::Sender<AppCommand>,
    pub(crate) command_rx: mpsc::Receiver<AppCommand>,
    pub(crate) shutdown_tx: watch::Sender<bool>,
    pub(crate) in_depth_item_id: tray_icon::menu::MenuId,
    pub(crate) open_last_item_id: tray_icon::menu::MenuId,
    pub(crate) exit_menu_id: tray_icon::menu::MenuId,
    pub(crate) last_video_url: Arc<Mutex<Option<String>>>,
}

impl App {
    /// Run the main application event loop.
    #[instrument(skip(self))]
    pub(crate) async fn run(mut self) -> AppResult<()> {
        info!("Voicemation starting");

        // Tray event forwarding via single persistent blocking task.
        //
        // MenuEvent::receiver() returns a crossbeam_channel::Receiver which
        // HAS blocking recv() -- zero polling, instant response, one thread.
        //
        // Shutdown: when tray_event_rx is dropped (main loop breaks),
        // tray_event_tx.blocking_send() fails, breaking the blocking loop.
        let (tray_event_tx, mut tray_event_rx) = mpsc::channel(32);
        let tray_handle = tokio::task::spawn_blocking(move || {
            let receiver = MenuEvent::receiver();
            while let Ok(event) = receiver.recv() {
                if tray_event_tx.blocking_send(event).is_err() {
                    break;
                }
            }
        });

        loop {
            tokio::select! {
                Some(event) = tray_event_rx.recv() => {
                    if let Err(e) = self.handle_tray_event(event).await {
                        error!(error = ?e, "Failed to handle tray event");
                    }
                }

                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        AppCommand::ToggleRecording => {
                            self.toggle_recording().await;
                        }
                        AppCommand::Shutdown => {
                            info!("Shutdown requested");
                            break;
                        }
                    }
                }

                else => {
                    info!("All channels closed, shutting down");
                    break;
                }
            }
        }

        drop(tray_event_rx);

        match tokio::time::timeout(Duration::from_secs(1), tray_handle).await {
            Ok(Ok(())) => info!("Tray event forwarder stopped cleanly"),
            Ok(Err(e)) => error!(error = ?e, "Tray event forwarder task panicked"),
            Err(_) => info!(
                "Tray event forwarder did not stop within timeout, \
                     will be cleaned up on exit"
            ),
        }

        let _ = self.shutdown_tx.send(true);
        info!("Voicemation shut down successfully");

        Ok(())
    }

    /// Route a hotkey toggle according to the session's current state.
    #[instrument(skip(self))]
    async fn toggle_recording(&self) {
        let state = { self.session.lock().await.state() };

        match state {
            SessionState::Recording => self.stop_and_submit().await,
            SessionState::Idle | SessionState::Failed | SessionState::Succeeded => {
                if let Err(e) = self.start_recording().await {
                    error!(error = ?e, "Failed to start recording");
                    let _ = self
                        .tray_proxy
                        .send_event(TrayCommand::SetState(TrayIconState::Idle));
                }
            }
            // A toggle while permission is pending, or while a previous
            // capture is still being packaged or uploaded, has nothing
            // sensible to do; the next state change re-arms the hotkey.
            SessionState::RequestingPermission
            | SessionState::Stopped
            | SessionState::Uploading => {
                warn!(state = ?state, "Ignoring toggle while busy");
            }
        }
    }

    /// Start a new recording and spawn its 1-second ticker.
    #[instrument(skip(self))]
    async fn start_recording(&self) -> AppResult<()> {
        {
            let mut session = self.session.lock().await;

            // Succeeded is terminal; clear it so start() is valid.
            if session.state() == SessionState::Succeeded {
                session.reset()?;
            }

            session.start()?;
        }

        let _ = self
            .tray_proxy
            .send_event(TrayCommand::SetState(TrayIconState::Recording));

        self.spawn_ticker().await;

        Ok(())
    }

    /// Drive `tick()` once per second while this recording is live.
    ///
    /// The ticker is pinned to the recording it was spawned for via the
    /// session ID, so a stale ticker from a quickly superseded recording
    /// exits instead of double-counting the new one.
    async fn spawn_ticker(&self) {
        let ticker_session_id = { self.session.lock().await.session_id() };
        let session = Arc::clone(&self.session);
        let tray_proxy = self.tray_proxy.clone();

        tokio::task::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            // The first tick completes immediately; skip it so the counter
            // advances on whole-second boundaries.
            interval.tick().await;

            loop {
                interval.tick().await;

                let mut session = session.lock().await;
                if session.state() != SessionState::Recording
                    || session.session_id() != ticker_session_id
                {
                    break;
                }

                session.tick();
                let _ = tray_proxy
                    .send_event(TrayCommand::SetRecordingElapsed(session.elapsed_seconds()));
            }

            debug!(session_id = %ticker_session_id, "Recording ticker stopped");
        });
    }

    /// Stop the current recording and submit its payload in the background.
    #[instrument(skip(self))]
    async fn stop_and_submit(&self) {
        let _ = self
            .tray_proxy
            .send_event(TrayCommand::SetState(TrayIconState::Generating));

        let (payload, ticket) = {
            let mut session = self.session.lock().await;

            if let Err(e) = session.stop() {
                error!(error = ?e, "Failed to stop recording");
                let _ = self
                    .tray_proxy
                    .send_event(TrayCommand::SetState(TrayIconState::Idle));
                return;
            }

            match session.begin_upload() {
                Ok(pair) => pair,
                Err(e) => {
                    error!(error = ?e, "Failed to hand off capture payload");
                    let _ = self
                        .tray_proxy
                        .send_event(TrayCommand::SetState(TrayIconState::Idle));
                    return;
                }
            }
        };

        let in_depth_mode = { self.config.lock().await.behavior.in_depth_mode };

        let session = Arc::clone(&self.session);
        let client = Arc::clone(&self.client);
        let result_handler = Arc::clone(&self.result_handler);
        let config = Arc::clone(&self.config);
        let last_video_url = Arc::clone(&self.last_video_url);
        let tray_proxy = self.tray_proxy.clone();

        tokio::task::spawn(async move {
            let start = std::time::Instant::now();

            let outcome = client
                .submit(SubmissionRequest {
                    input: SubmissionInput::Audio(payload),
                    in_depth_mode,
                })
                .await;

            let applied = session.lock().await.finish_upload(ticket, &outcome);
            if !applied {
                // A newer recording owns the session (and the tray) now.
                info!("Discarding superseded generation result");
                return;
            }

            match &outcome {
                Ok(generation) => {
                    info!(
                        duration_ms = start.elapsed().as_millis(),
                        video_url = %generation.video_url,
                        "Animation ready"
                    );

                    let (auto_open, copy_url) = {
                        let cfg = config.lock().await;
                        (cfg.behavior.auto_open, cfg.behavior.copy_url)
                    };

                    let mut handler = result_handler.lock().await;
                    match handler.deliver(generation, auto_open, copy_url) {
                        Ok(absolute_url) => {
                            *last_video_url.lock().await = Some(absolute_url);
                        }
                        Err(e) => error!(error = ?e, "Failed to deliver animation"),
                    }
                }
                Err(e) => {
                    // Surfaced only; retrying is the user's call via the
                    // hotkey.
                    error!(error = %e, "Generation failed");
                }
            }

            let _ = tray_proxy.send_event(TrayCommand::SetState(TrayIconState::Idle));
        });
    }

    /// Handle tray menu events.
    #[instrument(skip(self))]
    async fn handle_tray_event(&mut self, event: MenuEvent) -> AppResult<()> {
        let event_id = &event.id;

        if *event_id == self.in_depth_item_id {
            // The check item toggles its own mark; only the config needs
            // updating here.
            let mut cfg = self.config.lock().await;
            cfg.behavior.in_depth_mode = !cfg.behavior.in_depth_mode;
            let enabled = cfg.behavior.in_depth_mode;
            if let Err(e) = cfg.save() {
                warn!(error = ?e, "Failed to persist in-depth mode");
            }
            info!(enabled, "In-depth mode toggled");
        } else if *event_id == self.open_last_item_id {
            match self.last_video_url.lock().await.clone() {
                Some(url) => {
                    let _ = open::that(&url);
                    info!(url = %url, "Reopened last animation");
                }
                None => debug!("No animation generated yet"),
            }
        } else if *event_id == self.exit_menu_id {
            info!("Exit requested from tray menu");
            let _ = self.tray_proxy.send_event(TrayCommand::Shutdown);
            if let Err(e) = self.command_tx.send(AppCommand::Shutdown).await {
                error!(error = ?e, "Failed to send shutdown command");
            }
        }

        Ok(())
    }
}

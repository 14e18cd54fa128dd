//! Voicemation: push-to-talk desktop client for a remote animation
//! generation service. Record a spoken physics/math concept, submit it,
//! and get the rendered animation in your browser.

mod app;
mod app_command;
mod config;
mod error;
mod hotkey_handler;
mod result_handler;
#[cfg(test)]
mod tests;
mod tray_command;
mod tray_icon_state;
mod tray_manager;

pub(crate) use {
    app::App,
    app_command::AppCommand,
    error::{AppError, Result as AppResult},
    hotkey_handler::HotkeyHandler,
    result_handler::ResultHandler,
    tray_command::TrayCommand,
    tray_icon_state::TrayIconState,
    tray_manager::TrayManager,
};

use crate::config::Config;

use std::sync::Arc;

use global_hotkey::GlobalHotKeyManager;
use tao::{
    event::Event,
    event_loop::{ControlFlow, EventLoopBuilder},
};
use tokio::sync::{Mutex, mpsc, watch};
use tracing::error;
use voicemation_core::{AudioCapturer, RecordingSession, SubmissionClient};

/// Application entry point.
fn main() {
    // File logging: a tray app has no console. The appender guard lives in
    // this frame, which persists because the event loop below never returns.
    let log_writer = match Config::log_dir() {
        Ok(dir) => tracing_appender::rolling::daily(dir, "voicemation.log"),
        Err(e) => {
            eprintln!("Failed to create log directory: {:?}", e);
            std::process::exit(1);
        }
    };
    let (non_blocking, _log_guard) = tracing_appender::non_blocking(log_writer);

    tracing_subscriber::fmt()
        .with_env_filter("voicemation=debug")
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load config: {:?}", e);
            std::process::exit(1);
        }
    };

    let event_loop = EventLoopBuilder::<TrayCommand>::with_user_event().build();
    let tray_proxy = event_loop.create_proxy();

    // TrayManager lives on the main thread - TrayIcon is !Send on all platforms.
    let mut tray_manager = match TrayManager::new(config.behavior.in_depth_mode) {
        Ok(tm) => tm,
        Err(e) => {
            error!("Failed to create TrayManager: {:?}", e);
            std::process::exit(1);
        }
    };

    // Persists across event loop iterations -- dropping it unregisters the hotkey.
    let mut hotkey_manager: Option<GlobalHotKeyManager> = None;
    let mut startup_config = Some(config);

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        match event {
            Event::UserEvent(cmd) => {
                match cmd {
                    TrayCommand::SetState(state) => {
                        if let Err(e) = tray_manager.update_state(state) {
                            error!(error = ?e, "Failed to update tray icon");
                        }
                    }
                    TrayCommand::SetRecordingElapsed(seconds) => {
                        if let Err(e) = tray_manager.update_elapsed(seconds) {
                            error!(error = ?e, "Failed to update tray tooltip");
                        }
                    }
                    TrayCommand::Shutdown => {
                        *control_flow = ControlFlow::ExitWithCode(0);
                    }
                }
                return;
            }
            Event::NewEvents(tao::event::StartCause::Init) => {
                let config = match startup_config.take() {
                    Some(c) => c,
                    None => return,
                };

                let capturer = match AudioCapturer::new(config.audio.selected_device.as_deref()) {
                    Ok(c) => c,
                    Err(e) => {
                        error!("Failed to open audio capturer: {:?}", e);
                        std::process::exit(1);
                    }
                };
                let session = Arc::new(Mutex::new(RecordingSession::new(capturer)));

                let base_url = config.api_base_url();
                let client = match SubmissionClient::new(base_url.clone()) {
                    Ok(c) => Arc::new(c),
                    Err(e) => {
                        error!("Failed to create SubmissionClient: {:?}", e);
                        std::process::exit(1);
                    }
                };
                let result_handler = match ResultHandler::new(base_url) {
                    Ok(h) => Arc::new(Mutex::new(h)),
                    Err(e) => {
                        error!("Failed to create ResultHandler: {:?}", e);
                        std::process::exit(1);
                    }
                };

                #[cfg(target_os = "macos")]
                unsafe {
                    use core_foundation::runloop::{CFRunLoopGetMain, CFRunLoopWakeUp};
                    CFRunLoopWakeUp(CFRunLoopGetMain());
                }

                let config = Arc::new(Mutex::new(config));
                let (command_tx, command_rx) = mpsc::channel(32);
                let (shutdown_tx, shutdown_rx) = watch::channel(false);

                // Register hotkey on the main thread -- tao's event loop pumps
                // the Windows messages needed for WM_HOTKEY delivery.
                // hotkey_manager is stored in the closure's captured state so it
                // lives for the entire app lifetime.
                let (manager, hotkey_id) = match HotkeyHandler::register_hotkey() {
                    Ok(pair) => pair,
                    Err(e) => {
                        error!("Failed to register hotkey: {:?}", e);
                        std::process::exit(1);
                    }
                };
                hotkey_manager = Some(manager);

                let tray_proxy = tray_proxy.clone();
                let in_depth_item_id = tray_manager.in_depth_item_id().clone();
                let open_last_item_id = tray_manager.open_last_item_id().clone();
                let exit_menu_id = tray_manager.exit_item_id().clone();

                // Spawn tokio runtime on separate thread.
                // TrayManager and hotkey_manager stay on the main thread.
                std::thread::spawn(move || {
                    let rt = match tokio::runtime::Runtime::new() {
                        Ok(rt) => rt,
                        Err(e) => {
                            error!("Failed to create tokio runtime: {:?}", e);
                            std::process::exit(1);
                        }
                    };

                    rt.block_on(async {
                        let hotkey_handler = HotkeyHandler::new(hotkey_id, command_tx.clone());

                        let app = App {
                            session,
                            client,
                            result_handler,
                            config,
                            tray_proxy,
                            command_tx,
                            command_rx,
                            shutdown_tx,
                            in_depth_item_id,
                            open_last_item_id,
                            exit_menu_id,
                            last_video_url: Arc::new(Mutex::new(None)),
                        };

                        tokio::join!(
                            async {
                                if let Err(e) = hotkey_handler.run(shutdown_rx).await {
                                    error!(error = ?e, "Hotkey handler error");
                                }
                            },
                            async {
                                if let Err(e) = app.run().await {
                                    error!(error = ?e, "App error");
                                }
                            }
                        );
                    });
                });
            }
            _ => {}
        }

        // Keep hotkey_manager alive in the closure for the app's lifetime.
        let _ = &hotkey_manager;
    });
}

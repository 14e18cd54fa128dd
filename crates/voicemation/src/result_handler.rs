//! Delivery of finished generations to the platform.
//!
//! The generation service frequently returns server-relative video paths
//! (`/video/xyz.mp4`); those are absolutized against the configured base
//! URL here, then copied to the clipboard and handed to the default
//! browser.

use crate::{AppError, AppResult};

use std::panic::Location;

use arboard::Clipboard;
use error_location::ErrorLocation;
use tracing::{debug, info, instrument, warn};
use voicemation_core::Generation;

/// Prefix a server-relative video path with the service base URL.
///
/// Absolute URLs pass through untouched; the core hands URLs over exactly
/// as the server sent them, so this is the one place relative paths get
/// resolved.
pub(crate) fn absolutize(base_url: &str, video_url: &str) -> String {
    if video_url.starts_with("http://") || video_url.starts_with("https://") {
        return String::from(video_url);
    }

    let base = base_url.trim_end_matches('/');
    if video_url.starts_with('/') {
        format!("{}{}", base, video_url)
    } else {
        format!("{}/{}", base, video_url)
    }
}

/// Hands finished animations to the clipboard and the browser.
pub struct ResultHandler {
    pub(crate) clipboard: Clipboard,
    base_url: String,
}

impl ResultHandler {
    /// Create a new result handler resolving relative URLs against
    /// `base_url`.
    #[track_caller]
    #[instrument(skip(base_url))]
    pub fn new(base_url: impl Into<String>) -> AppResult<Self> {
        let clipboard = Clipboard::new().map_err(|e| AppError::ClipboardError {
            reason: format!("Failed to initialize clipboard: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!("ResultHandler initialized");

        Ok(Self {
            clipboard,
            base_url: base_url.into(),
        })
    }

    /// Deliver a finished generation and return the absolute video URL.
    ///
    /// The clipboard copy happens first; a browser that fails to open
    /// still leaves the user with a pasteable URL.
    #[instrument(skip(self, generation))]
    pub fn deliver(
        &mut self,
        generation: &Generation,
        auto_open: bool,
        copy_url: bool,
    ) -> AppResult<String> {
        let url = absolutize(&self.base_url, &generation.video_url);

        if copy_url {
            self.clipboard
                .set_text(&url)
                .map_err(|e| AppError::ClipboardError {
                    reason: format!("Failed to set clipboard: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                })?;

            debug!(url = %url, "Animation URL copied to clipboard");
        }

        if auto_open {
            if let Err(e) = open::that(&url) {
                // The URL is already on the clipboard; opening is best-effort.
                warn!(error = %e, url = %url, "Failed to open animation in browser");
            }
        }

        info!(
            url = %url,
            recognized = generation.recognized_text.as_deref().unwrap_or(""),
            auto_opened = auto_open,
            "Animation delivered"
        );

        Ok(url)
    }
}

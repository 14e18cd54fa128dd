//! System tray icon with state-based updates.
//!
//! Manages a system tray icon with three states (Idle, Recording,
//! Generating) and a context menu for toggling in-depth mode, reopening
//! the last animation, and exiting.

use crate::{AppError, AppResult, TrayIconState};

use std::panic::Location;

use error_location::ErrorLocation;
use tracing::{info, instrument};
use tray_icon::menu::{CheckMenuItem, Menu, MenuId, MenuItem};
use tray_icon::{Icon, TrayIcon, TrayIconBuilder};

/// Render a recording duration as `m:ss` for the tray tooltip.
pub(crate) fn format_elapsed(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// System tray icon manager.
pub struct TrayManager {
    tray_icon: TrayIcon,
    in_depth_item_id: MenuId,
    open_last_item_id: MenuId,
    exit_item_id: MenuId,
}

impl TrayManager {
    /// Create a new tray manager with the in-depth check item reflecting
    /// the persisted configuration.
    #[track_caller]
    #[instrument]
    pub fn new(in_depth_mode: bool) -> AppResult<Self> {
        let menu = Menu::new();

        let in_depth_item = CheckMenuItem::new("In-Depth Mode", true, in_depth_mode, None);
        let open_last_item = MenuItem::new("Open Last Animation", true, None);
        let exit_item = MenuItem::new("Exit", true, None);

        let in_depth_id = in_depth_item.id().clone();
        let open_last_id = open_last_item.id().clone();
        let exit_id = exit_item.id().clone();

        menu.append(&in_depth_item).map_err(|e| AppError::TrayError {
            reason: format!("Failed to add in-depth menu item: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        menu.append(&open_last_item)
            .map_err(|e| AppError::TrayError {
                reason: format!("Failed to add open-last menu item: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        menu.append(&exit_item).map_err(|e| AppError::TrayError {
            reason: format!("Failed to add exit menu item: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let icon = Self::load_icon(TrayIconState::Idle)?;

        let tray_icon = TrayIconBuilder::new()
            .with_tooltip("Voicemation - Ready")
            .with_menu(Box::new(menu))
            .with_icon(icon)
            .build()
            .map_err(|e| AppError::TrayError {
                reason: format!("Failed to create tray icon: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        info!("System tray icon initialized");

        Ok(Self {
            tray_icon,
            in_depth_item_id: in_depth_id,
            open_last_item_id: open_last_id,
            exit_item_id: exit_id,
        })
    }

    /// Update the tray icon state with new icon and tooltip.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn update_state(&mut self, state: TrayIconState) -> AppResult<()> {
        let (icon, tooltip) = match state {
            TrayIconState::Idle => (Self::load_icon(state)?, "Voicemation - Ready"),
            TrayIconState::Recording => (Self::load_icon(state)?, "Voicemation - Recording..."),
            TrayIconState::Generating => {
                (Self::load_icon(state)?, "Voicemation - Generating animation...")
            }
        };

        self.tray_icon
            .set_icon(Some(icon))
            .map_err(|e| AppError::TrayError {
                reason: format!("Failed to update icon: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        self.tray_icon
            .set_tooltip(Some(tooltip))
            .map_err(|e| AppError::TrayError {
                reason: format!("Failed to update tooltip: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        Ok(())
    }

    /// Refresh the tooltip with the current recording duration.
    #[track_caller]
    pub fn update_elapsed(&mut self, seconds: u64) -> AppResult<()> {
        let tooltip = format!("Voicemation - Recording... {}", format_elapsed(seconds));

        self.tray_icon
            .set_tooltip(Some(tooltip))
            .map_err(|e| AppError::TrayError {
                reason: format!("Failed to update tooltip: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })
    }

    /// Load icon from compile-time embedded PNG bytes.
    ///
    /// Icons are embedded via include_bytes! so they work regardless of
    /// install location -- no hardcoded filesystem paths.
    #[track_caller]
    fn load_icon(state: TrayIconState) -> AppResult<Icon> {
        let png_bytes: &[u8] = match state {
            TrayIconState::Idle => include_bytes!("../resources/icons/idle.png"),
            TrayIconState::Recording => include_bytes!("../resources/icons/recording.png"),
            TrayIconState::Generating => include_bytes!("../resources/icons/generating.png"),
        };

        let img = image::load_from_memory(png_bytes).map_err(|e| AppError::TrayError {
            reason: format!("Failed to decode embedded icon: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let rgba = img.into_rgba8();
        let (width, height) = (rgba.width(), rgba.height());

        Icon::from_rgba(rgba.into_raw(), width, height).map_err(|e| AppError::TrayError {
            reason: format!("Failed to create icon from RGBA: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// Get the in-depth mode check item ID.
    pub fn in_depth_item_id(&self) -> &MenuId {
        &self.in_depth_item_id
    }

    /// Get the open-last-animation menu item ID.
    pub fn open_last_item_id(&self) -> &MenuId {
        &self.open_last_item_id
    }

    /// Get the exit menu item ID.
    pub fn exit_item_id(&self) -> &MenuId {
        &self.exit_item_id
    }
}

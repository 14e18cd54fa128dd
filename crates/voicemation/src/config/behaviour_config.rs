use crate::config::{default_auto_open, default_copy_url};

use serde::{Deserialize, Serialize};

/// Application behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviourConfig {
    /// Whether to open a finished animation in the default browser.
    #[serde(default = "default_auto_open")]
    pub auto_open: bool,
    /// Whether to copy the animation URL to the clipboard.
    #[serde(default = "default_copy_url")]
    pub copy_url: bool,
    /// Request more elaborate multi-scene generations. Toggled from the
    /// tray menu and persisted here.
    #[serde(default)]
    pub in_depth_mode: bool,
}

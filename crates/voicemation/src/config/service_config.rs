use crate::config::default_base_url;

use serde::{Deserialize, Serialize};

/// Remote generation service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the generation service.
    ///
    /// The `VOICEMATION_API_URL` environment variable overrides this at
    /// startup without touching the file.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

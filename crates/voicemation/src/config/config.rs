//! Configuration management for voicemation.
//!
//! Handles loading and saving TOML configuration files with cross-platform
//! paths, environment overrides, and atomic write operations.

use crate::{
    AppError, AppResult,
    config::{AudioConfig, BehaviourConfig, ServiceConfig},
};

use std::{fs, io::Write, panic::Location, path::PathBuf};

use directories::ProjectDirs;
use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Environment variable overriding the configured service base URL.
const API_URL_ENV: &str = "VOICEMATION_API_URL";

/// Main configuration struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Remote generation service settings.
    pub service: ServiceConfig,
    /// Audio device configuration.
    pub audio: AudioConfig,
    /// Application behavior settings.
    pub behavior: BehaviourConfig,
}

impl Config {
    /// Load configuration from disk, creating the default if not found.
    #[track_caller]
    #[instrument]
    pub fn load() -> AppResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let contents = fs::read_to_string(&config_path).map_err(|e| AppError::ConfigError {
                reason: format!("Failed to read config: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

            let config: Config = toml::from_str(&contents).map_err(|e| AppError::ConfigError {
                reason: format!("Failed to parse config: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

            info!(config_path = ?config_path, "Configuration loaded");

            Ok(config)
        } else {
            info!("No config found, creating default");
            Self::create_default()
        }
    }

    /// The base URL submissions go to, after applying the
    /// `VOICEMATION_API_URL` environment override.
    pub fn api_base_url(&self) -> String {
        Self::base_url_with_override(&self.service.base_url, std::env::var(API_URL_ENV).ok())
    }

    /// Pick between the configured base URL and a non-blank override.
    pub(crate) fn base_url_with_override(
        configured: &str,
        override_url: Option<String>,
    ) -> String {
        match override_url {
            Some(url) if !url.trim().is_empty() => url,
            _ => String::from(configured),
        }
    }

    /// Save configuration to disk using the atomic write pattern.
    ///
    /// Writes to a temporary file first, then renames to prevent corruption
    /// if the process crashes during the write.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn save(&self) -> AppResult<()> {
        let config_path = Self::config_path()?;

        let contents = toml::to_string_pretty(self).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        // Atomic write: write to temp file then rename
        let temp_path = config_path.with_extension("toml.tmp");

        let mut temp_file = fs::File::create(&temp_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to create temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        temp_file
            .write_all(contents.as_bytes())
            .map_err(|e| AppError::ConfigError {
                reason: format!("Failed to write temp config file: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        temp_file.sync_all().map_err(|e| AppError::ConfigError {
            reason: format!("Failed to sync temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        fs::rename(&temp_path, &config_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to rename temp config to final: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(config_path = ?config_path, "Configuration saved (atomic write)");

        Ok(())
    }

    /// Directory for rolling log files, created on demand.
    #[track_caller]
    pub fn log_dir() -> AppResult<PathBuf> {
        let proj_dirs = Self::project_dirs()?;
        let log_dir = proj_dirs.data_dir().join("logs");

        if !log_dir.exists() {
            fs::create_dir_all(&log_dir)?;
        }

        Ok(log_dir)
    }

    #[track_caller]
    fn project_dirs() -> AppResult<ProjectDirs> {
        ProjectDirs::from("com", "voicemation", "Voicemation").ok_or_else(|| {
            AppError::ConfigError {
                reason: String::from("Failed to get project directories"),
                location: ErrorLocation::from(Location::caller()),
            }
        })
    }

    #[track_caller]
    fn config_path() -> AppResult<PathBuf> {
        let proj_dirs = Self::project_dirs()?;

        let config_dir = proj_dirs.config_dir();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
            debug!(config_dir = ?config_dir, "Created config directory");
        }

        Ok(config_dir.join("config.toml"))
    }

    #[track_caller]
    fn create_default() -> AppResult<Self> {
        let config = Config {
            service: ServiceConfig {
                base_url: crate::config::default_base_url(),
            },
            audio: AudioConfig {
                selected_device: None,
            },
            behavior: BehaviourConfig {
                auto_open: crate::config::DEFAULT_AUTO_OPEN,
                copy_url: crate::config::DEFAULT_COPY_URL,
                in_depth_mode: false,
            },
        };

        config.save()?;

        info!("Default config created");

        Ok(config)
    }
}

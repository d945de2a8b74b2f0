//! Client configuration.
//!
//! Loaded from a TOML file; every section falls back to defaults so an
//! empty file (or no file at all) yields a working local setup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid server URL: {0}")]
    InvalidServerUrl(String),
    #[error("mark path must start with '/': {0}")]
    InvalidMarkPath(String),
    #[error("invalid frame rate (must be 1-60 fps)")]
    InvalidFrameRate,
    #[error("invalid scan box dimensions")]
    InvalidScanBox,
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Attendance server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Scheme, host and port of the attendance server.
    pub base_url: String,
    /// Path of the attendance-marking endpoint.
    pub mark_path: String,
    /// Whole-request timeout in milliseconds; 0 waits indefinitely.
    pub timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            mark_path: "/attendance/mark".to_string(),
            timeout_ms: 0,
        }
    }
}

impl ServerConfig {
    /// Full URL of the marking endpoint.
    pub fn mark_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.mark_path)
    }

    /// Request timeout, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidServerUrl(self.base_url.clone()));
        }
        if !self.mark_path.starts_with('/') {
            return Err(ConfigError::InvalidMarkPath(self.mark_path.clone()));
        }
        Ok(())
    }
}

/// Which camera the decoder should prefer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraFacing {
    /// Rear camera, pointed away from the operator.
    #[default]
    Environment,
    /// Front camera.
    User,
}

/// Settings handed to the decoder on start.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub facing: CameraFacing,
    /// Decode attempts per second.
    pub fps: u32,
    /// Width of the scan region in pixels.
    pub qrbox_width: u32,
    /// Height of the scan region in pixels.
    pub qrbox_height: u32,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            facing: CameraFacing::Environment,
            fps: 10,
            qrbox_width: 250,
            qrbox_height: 250,
        }
    }
}

impl ScannerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fps == 0 || self.fps > 60 {
            return Err(ConfigError::InvalidFrameRate);
        }
        if self.qrbox_width == 0 || self.qrbox_height == 0 {
            return Err(ConfigError::InvalidScanBox);
        }
        Ok(())
    }
}

/// Session-scoped client state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// File holding cookies between launches.
    pub cookie_file: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_file: PathBuf::from(".qr-attendance-cookies"),
        }
    }
}

/// Metrics exporter settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Exporter port (0 to disable).
    pub port: u16,
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.scanner.validate()
    }
}

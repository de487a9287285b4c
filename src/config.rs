//! Configuration file handling for fooderator.
//!
//! Loads configuration from `~/.config/fooderator/config.toml` or a custom path.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::camera::{Facing, Resolution, StreamConstraints};

/// Environment variable that overrides `server.base_url`.
pub const SERVER_ENV: &str = "FOODERATOR_SERVER";

/// Configuration file structure for fooderator.
/// Loaded from ~/.config/fooderator/config.toml (or custom path via --config).
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ScanConfig {
    /// Delay between decode ticks
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Pause between "found" confirmation and product lookup
    #[serde(default = "default_found_delay_ms")]
    pub found_delay_ms: u64,
    /// JPEG quality (1-100) for polled frames
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    /// Capture device handed to ffmpeg (e.g. /dev/video0, or "0" on macOS)
    #[serde(default)]
    pub device: Option<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            found_delay_ms: default_found_delay_ms(),
            jpeg_quality: default_jpeg_quality(),
            width: default_width(),
            height: default_height(),
            device: None,
        }
    }
}

impl ScanConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn found_delay(&self) -> Duration {
        Duration::from_millis(self.found_delay_ms)
    }

    /// Stream constraints for the rear camera at the configured size.
    pub fn constraints(&self) -> StreamConstraints {
        StreamConstraints {
            facing: Facing::Environment,
            ideal: Resolution {
                width: self.width,
                height: self.height,
            },
            ..StreamConstraints::default()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_interval_ms() -> u64 {
    300
}

fn default_found_delay_ms() -> u64 {
    1000
}

fn default_jpeg_quality() -> u8 {
    80
}

fn default_width() -> u32 {
    1280
}

fn default_height() -> u32 {
    720
}

fn default_language() -> String {
    "en".to_string()
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
                path: path.clone(),
                source: e,
            })?;
            let config = Self::parse(&content).map_err(|e| ConfigError::ParseError {
                path: path.clone(),
                source: e,
            })?;
            config.validate().map_err(|(field, reason)| ConfigError::Invalid {
                path: path.clone(),
                field,
                reason,
            })?;
            Ok(config)
        } else {
            log::debug!("No config at {}, using defaults", path.display());
            Ok(Config::default())
        }
    }

    fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Reject values that parse but cannot drive the scanner.
    fn validate(&self) -> Result<(), (&'static str, &'static str)> {
        if self.scan.interval_ms == 0 {
            return Err(("scan.interval_ms", "must be greater than 0"));
        }
        if self.scan.width == 0 || self.scan.height == 0 {
            return Err(("scan.width/height", "must be greater than 0"));
        }
        Ok(())
    }

    /// Apply the `FOODERATOR_SERVER` environment override, if set.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(SERVER_ENV) {
            if !url.trim().is_empty() {
                self.server.base_url = url.trim().to_string();
            }
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
    Invalid {
        path: PathBuf,
        field: &'static str,
        reason: &'static str,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError { path, source } => {
                write!(
                    f,
                    "Failed to read config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::ParseError { path, source } => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::Invalid {
                path,
                field,
                reason,
            } => {
                write!(
                    f,
                    "Invalid config file '{}': {} {}",
                    path.display(),
                    field,
                    reason
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
            ConfigError::Invalid { .. } => None,
        }
    }
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("fooderator").join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/fooderator/config.toml")
        })
}

//! Application Configuration
//!
//! Persistent settings for the scanpay client.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::{DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT};
use crate::camera::{CameraDevice, FacingMode};
use crate::scanner::{ScanConfig, DEFAULT_ACQUIRE_TIMEOUT, DEFAULT_SCAN_INTERVAL};

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub scan: ScanSettings,
    pub camera: CameraSettings,
    pub api: ApiSettings,
    pub logging: LoggingSettings,
}

/// QR scanning behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    /// Preferred camera direction
    pub facing_mode: FacingMode,

    /// Milliseconds between frame captures
    pub scan_interval_ms: u64,

    /// Distinct codes to collect before decoding pauses
    pub max_results: usize,

    /// How long to wait for the camera to start
    pub acquire_timeout_ms: u64,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            facing_mode: FacingMode::Environment,
            scan_interval_ms: DEFAULT_SCAN_INTERVAL.as_millis() as u64,
            max_results: 1,
            acquire_timeout_ms: DEFAULT_ACQUIRE_TIMEOUT.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CameraSettings {
    pub backend: CameraBackend,

    /// Devices available to the image sequence backend
    pub devices: Vec<CameraDevice>,
}

/// Camera backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CameraBackend {
    /// Frames read from image files or directories
    #[default]
    ImageSequence,
    /// No camera; every acquisition fails as not supported
    Disabled,
}

impl CameraBackend {
    pub fn display_name(&self) -> &'static str {
        match self {
            CameraBackend::ImageSequence => "Image sequence",
            CameraBackend::Disabled => "Disabled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Ledger service root
    pub base_url: String,

    pub request_timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
        }
    }
}

impl ApiSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub format: LogFormat,

    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// env_logger lines
    #[default]
    Text,
    /// tracing-subscriber fmt output with targets and spans
    Structured,
}

impl Settings {
    /// Get settings file path
    pub fn file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("scanpay").join("settings.json"))
    }

    /// Load settings from disk
    pub fn load() -> Result<Self> {
        let path = Self::file_path().ok_or_else(|| anyhow::anyhow!("No config directory"))?;
        Self::load_from(&path)
    }

    /// Load settings from `path`; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let settings: Settings = serde_json::from_str(&content)
            .with_context(|| format!("Invalid settings in {}", path.display()))?;
        Ok(settings)
    }

    /// Save settings to disk
    pub fn save(&self) -> Result<()> {
        let path = Self::file_path().ok_or_else(|| anyhow::anyhow!("No config directory"))?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validated scanner configuration
    pub fn scan_config(&self) -> Result<ScanConfig> {
        let config = ScanConfig::new(
            self.scan.facing_mode,
            Duration::from_millis(self.scan.scan_interval_ms),
            self.scan.max_results,
        )?
        .with_acquire_timeout(Duration::from_millis(self.scan.acquire_timeout_ms))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_scanner_defaults() {
        let config = Settings::default().scan_config().unwrap();
        assert_eq!(config, ScanConfig::default());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("settings.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut settings = Settings::default();
        settings.scan.facing_mode = FacingMode::User;
        settings.scan.max_results = 3;
        settings.camera.backend = CameraBackend::Disabled;
        settings.logging.format = LogFormat::Structured;
        settings.save_to(&path).unwrap();

        assert_eq!(Settings::load_from(&path).unwrap(), settings);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{
                "scan": { "scan_interval_ms": 250 },
                "camera": {
                    "devices": [
                        { "id": "rear", "label": "Rear", "facing_mode": "environment", "path": "/tmp/frames" }
                    ]
                }
            }"#,
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.scan.scan_interval_ms, 250);
        assert_eq!(settings.scan.max_results, 1);
        assert_eq!(settings.camera.backend, CameraBackend::ImageSequence);
        assert_eq!(settings.camera.devices.len(), 1);
        assert_eq!(settings.api, ApiSettings::default());
    }

    #[test]
    fn test_invalid_scan_settings_rejected() {
        let mut settings = Settings::default();
        settings.scan.scan_interval_ms = 0;
        assert!(settings.scan_config().is_err());

        let mut settings = Settings::default();
        settings.scan.max_results = 0;
        assert!(settings.scan_config().is_err());

        let mut settings = Settings::default();
        settings.scan.acquire_timeout_ms = 0;
        assert!(settings.scan_config().is_err());
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(Settings::load_from(&path).is_err());
    }
}

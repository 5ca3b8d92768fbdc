//! Scanner Types
//!
//! Configuration, results and the observable state of a scan controller.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

use crate::camera::{CameraError, FacingMode};

/// Default bounded wait for camera acquisition
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default sampling period
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_millis(100);

/// One decoded payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    pub data: String,
    pub timestamp: DateTime<Utc>,
}

impl ScanResult {
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Invalid scan configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("scan interval must be greater than zero")]
    ZeroScanInterval,
    #[error("max results must be at least 1")]
    ZeroMaxResults,
    #[error("acquire timeout must be greater than zero")]
    ZeroAcquireTimeout,
}

/// Scan controller configuration, fixed for the controller's lifetime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    facing_mode: FacingMode,
    scan_interval: Duration,
    max_results: usize,
    acquire_timeout: Duration,
}

impl ScanConfig {
    pub fn new(
        facing_mode: FacingMode,
        scan_interval: Duration,
        max_results: usize,
    ) -> Result<Self, ConfigError> {
        if scan_interval.is_zero() {
            return Err(ConfigError::ZeroScanInterval);
        }
        if max_results == 0 {
            return Err(ConfigError::ZeroMaxResults);
        }
        Ok(Self {
            facing_mode,
            scan_interval,
            max_results,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
        })
    }

    /// Override the acquisition wait
    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Result<Self, ConfigError> {
        if timeout.is_zero() {
            return Err(ConfigError::ZeroAcquireTimeout);
        }
        self.acquire_timeout = timeout;
        Ok(self)
    }

    pub fn facing_mode(&self) -> FacingMode {
        self.facing_mode
    }

    pub fn scan_interval(&self) -> Duration {
        self.scan_interval
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    pub fn acquire_timeout(&self) -> Duration {
        self.acquire_timeout
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            facing_mode: FacingMode::Environment,
            scan_interval: DEFAULT_SCAN_INTERVAL,
            max_results: 1,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
        }
    }
}

/// Controller lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ScanState {
    #[default]
    Idle,
    Acquiring,
    ActiveScanning,
    Error,
}

impl ScanState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanState::Idle => "idle",
            ScanState::Acquiring => "acquiring",
            ScanState::ActiveScanning => "active-scanning",
            ScanState::Error => "error",
        }
    }
}

impl std::fmt::Display for ScanState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything an observer needs, published after each change
#[derive(Debug, Clone, Default)]
pub struct ScanSnapshot {
    pub state: ScanState,
    pub results: Vec<ScanResult>,
    pub error: Option<CameraError>,
    /// Stream open and decoding (not suppressed by a full result list)
    pub is_scanning: bool,
}

impl ScanSnapshot {
    pub fn is_active(&self) -> bool {
        self.state == ScanState::ActiveScanning
    }

    pub fn is_loading(&self) -> bool {
        self.state == ScanState::Acquiring
    }

    pub fn can_start_scanning(&self) -> bool {
        self.state == ScanState::Idle
    }
}

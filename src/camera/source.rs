//! Frame Source
//!
//! Contract between camera backends and the scan controller.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::error::CameraError;
use crate::media::PixelBuffer;

/// Which physical camera to prefer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Front camera
    User,
    /// Rear camera
    #[default]
    Environment,
}

impl FacingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FacingMode::User => "user",
            FacingMode::Environment => "environment",
        }
    }
}

impl std::fmt::Display for FacingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FacingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "user" | "front" => Ok(FacingMode::User),
            "environment" | "rear" | "back" => Ok(FacingMode::Environment),
            other => Err(format!("unknown facing mode '{}'", other)),
        }
    }
}

/// An open camera stream.
///
/// Implementations must release the device on drop as well as on
/// [`CameraStream::release`].
pub trait CameraStream: Send {
    /// Human-readable device label
    fn label(&self) -> &str;

    /// Intrinsic frame size; (0, 0) until the device has produced data
    fn dimensions(&self) -> (u32, u32);

    /// Copy the current frame into `buffer`, resizing it as needed.
    /// Returns false if no frame is available.
    fn read_frame(&mut self, buffer: &mut PixelBuffer) -> bool;

    /// Stop all tracks. Calling this more than once is a no-op.
    fn release(&mut self);

    /// False once released
    fn is_live(&self) -> bool;
}

/// A camera backend that can open streams
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Open a stream, preferring a device with the given facing mode.
    /// Each call opens the device exactly once.
    async fn acquire(&self, facing_mode: FacingMode) -> Result<Box<dyn CameraStream>, CameraError>;
}

/// Acquire with a bounded wait. Exceeding `timeout` yields [`CameraError::Timeout`];
/// a stream that arrives late is dropped, which releases it.
pub async fn acquire_with_timeout(
    source: &dyn FrameSource,
    facing_mode: FacingMode,
    timeout: Duration,
) -> Result<Box<dyn CameraStream>, CameraError> {
    debug!("Requesting {} camera (timeout {:?})", facing_mode, timeout);

    match tokio::time::timeout(timeout, source.acquire(facing_mode)).await {
        Ok(result) => result,
        Err(_) => {
            warn!("Camera acquisition exceeded {:?}", timeout);
            Err(CameraError::timeout(format!(
                "camera did not start within {} ms",
                timeout.as_millis()
            )))
        }
    }
}

/// Backend for systems without any camera API
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledSource;

#[async_trait]
impl FrameSource for DisabledSource {
    async fn acquire(&self, _facing_mode: FacingMode) -> Result<Box<dyn CameraStream>, CameraError> {
        Err(CameraError::not_supported(
            "no camera backend is configured on this system",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraErrorKind;

    struct NeverReady;

    #[async_trait]
    impl FrameSource for NeverReady {
        async fn acquire(&self, _facing_mode: FacingMode) -> Result<Box<dyn CameraStream>, CameraError> {
            std::future::pending().await
        }
    }

    #[test]
    fn test_facing_mode_parsing() {
        assert_eq!("user".parse::<FacingMode>(), Ok(FacingMode::User));
        assert_eq!("Environment".parse::<FacingMode>(), Ok(FacingMode::Environment));
        assert_eq!("back".parse::<FacingMode>(), Ok(FacingMode::Environment));
        assert!("sideways".parse::<FacingMode>().is_err());
        assert_eq!(FacingMode::default(), FacingMode::Environment);
    }

    #[tokio::test]
    async fn test_disabled_source_is_not_supported() {
        let err = DisabledSource
            .acquire(FacingMode::User)
            .await
            .err()
            .expect("disabled source must fail");
        assert_eq!(err.kind(), CameraErrorKind::NotSupported);
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_times_out() {
        let started = tokio::time::Instant::now();
        let err = acquire_with_timeout(&NeverReady, FacingMode::Environment, Duration::from_secs(10))
            .await
            .err()
            .expect("acquisition must time out");

        assert_eq!(err.kind(), CameraErrorKind::Timeout);
        assert_eq!(started.elapsed(), Duration::from_secs(10));
    }
}

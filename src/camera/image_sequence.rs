//! Image Sequence Camera
//!
//! Replays still images from disk as a camera stream. Each configured device
//! points at a directory of PNG/JPEG frames (or a single image) which are
//! cycled forever while the stream is open.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::error::CameraError;
use super::source::{CameraStream, FacingMode, FrameSource};
use crate::media::PixelBuffer;

/// File extensions the `image` crate is built to decode here
const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// A configured camera device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraDevice {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub facing_mode: FacingMode,
    /// Directory of frames, or a single image file
    pub path: PathBuf,
}

/// Frame source backed by image files
pub struct ImageSequenceSource {
    devices: Vec<CameraDevice>,
}

impl ImageSequenceSource {
    pub fn new(devices: Vec<CameraDevice>) -> Self {
        Self { devices }
    }

    pub fn devices(&self) -> &[CameraDevice] {
        &self.devices
    }

    /// Facing mode is a preference: take a matching device if there is one,
    /// otherwise the first device.
    pub fn select_device(&self, facing_mode: FacingMode) -> Option<&CameraDevice> {
        self.devices
            .iter()
            .find(|d| d.facing_mode == facing_mode)
            .or_else(|| self.devices.first())
    }
}

#[async_trait]
impl FrameSource for ImageSequenceSource {
    async fn acquire(&self, facing_mode: FacingMode) -> Result<Box<dyn CameraStream>, CameraError> {
        let device = self
            .select_device(facing_mode)
            .cloned()
            .ok_or_else(|| CameraError::not_found("no camera device is configured"))?;

        if device.facing_mode != facing_mode {
            debug!(
                "No {} camera, falling back to '{}' ({})",
                facing_mode, device.label, device.facing_mode
            );
        }

        info!("Opening camera '{}' at {}", device.label, device.path.display());

        let path = device.path.clone();
        let frames = tokio::task::spawn_blocking(move || load_frames(&path))
            .await
            .map_err(|e| CameraError::unknown(format!("camera task failed: {}", e)))??;

        info!("Camera '{}' ready with {} frame(s)", device.label, frames.len());
        Ok(Box::new(ImageSequenceStream::new(device.label, frames)))
    }
}

fn is_frame_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Load every frame under `path`, converted to luma
fn load_frames(path: &Path) -> Result<Vec<PixelBuffer>, CameraError> {
    let context = path.display().to_string();
    let metadata = std::fs::metadata(path).map_err(|e| CameraError::from_io(&e, &context))?;

    let mut paths: Vec<PathBuf> = if metadata.is_file() {
        vec![path.to_path_buf()]
    } else {
        std::fs::read_dir(path)
            .map_err(|e| CameraError::from_io(&e, &context))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| is_frame_file(p))
            .collect()
    };
    paths.sort();

    let mut frames = Vec::with_capacity(paths.len());
    for frame_path in paths {
        match image::open(&frame_path) {
            Ok(img) => {
                let rgba = img.to_rgba8();
                let (width, height) = rgba.dimensions();
                let mut frame = PixelBuffer::new();
                if frame.copy_from_rgba(rgba.as_raw(), width, height) {
                    frames.push(frame);
                }
            }
            Err(e) => {
                warn!("Skipping unreadable frame {}: {}", frame_path.display(), e);
            }
        }
    }

    if frames.is_empty() {
        return Err(CameraError::not_found(format!(
            "no readable frames in {}",
            context
        )));
    }

    Ok(frames)
}

/// Open stream over preloaded frames
pub struct ImageSequenceStream {
    label: String,
    frames: Vec<PixelBuffer>,
    cursor: usize,
    live: bool,
}

impl ImageSequenceStream {
    pub fn new(label: String, frames: Vec<PixelBuffer>) -> Self {
        Self {
            label,
            frames,
            cursor: 0,
            live: true,
        }
    }
}

impl CameraStream for ImageSequenceStream {
    fn label(&self) -> &str {
        &self.label
    }

    fn dimensions(&self) -> (u32, u32) {
        if !self.live {
            return (0, 0);
        }
        self.frames
            .get(self.cursor)
            .map(|f| (f.width, f.height))
            .unwrap_or((0, 0))
    }

    fn read_frame(&mut self, buffer: &mut PixelBuffer) -> bool {
        if !self.live || self.frames.is_empty() {
            return false;
        }

        let frame = &self.frames[self.cursor];
        let copied = buffer.copy_from_luma(&frame.data, frame.width, frame.height, frame.stride);
        self.cursor = (self.cursor + 1) % self.frames.len();
        copied
    }

    fn release(&mut self) {
        if self.live {
            debug!("Releasing camera '{}'", self.label);
            self.live = false;
            self.frames.clear();
            self.cursor = 0;
        }
    }

    fn is_live(&self) -> bool {
        self.live
    }
}

impl Drop for ImageSequenceStream {
    fn drop(&mut self) {
        self.release();
    }
}

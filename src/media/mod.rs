//! Media Buffers
//!
//! Luma frame buffers shared between camera backends and the QR decoder.

use std::sync::atomic::{AtomicU64, Ordering};

/// Global frame ID counter for unique frame identification
static FRAME_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Generate a new unique frame ID
pub fn next_frame_id() -> u64 {
    FRAME_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// BT.601 luma from RGB, integer math (weights scaled by 256)
#[inline]
pub fn luma_from_rgb(r: u8, g: u8, b: u8) -> u8 {
    ((77 * r as u32 + 150 * g as u32 + 29 * b as u32) >> 8) as u8
}

/// 8-bit grayscale frame.
///
/// The sampler owns one of these per scan session and overwrites it in place
/// on every tick, so the allocation is reused for the lifetime of the stream.
#[derive(Debug, Clone, Default)]
pub struct PixelBuffer {
    /// Unique frame ID, refreshed on every copy
    pub frame_id: u64,
    pub width: u32,
    pub height: u32,
    /// Bytes per row (may be > width due to padding)
    pub stride: u32,
    /// Luma plane, `stride * height` bytes
    pub data: Vec<u8>,
}

impl PixelBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a frame of the given size with every pixel set to `value`
    pub fn filled(width: u32, height: u32, value: u8) -> Self {
        Self {
            frame_id: next_frame_id(),
            width,
            height,
            stride: width,
            data: vec![value; (width as usize) * (height as usize)],
        }
    }

    /// True when the buffer holds no pixels (a sink with no data yet)
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Resize to a tightly packed `width x height` frame, reusing the allocation
    pub fn resize(&mut self, width: u32, height: u32) {
        let len = (width as usize) * (height as usize);
        self.width = width;
        self.height = height;
        self.stride = width;
        self.data.resize(len, 0);
    }

    /// Luma value at (x, y); out-of-range reads are white
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        self.data
            .get(y * self.stride as usize + x)
            .copied()
            .unwrap_or(255)
    }

    /// Copy a luma plane with explicit stride, dropping the row padding.
    /// Returns false if `src` is too small for the given geometry.
    pub fn copy_from_luma(&mut self, src: &[u8], width: u32, height: u32, stride: u32) -> bool {
        let expected = (stride as usize) * (height as usize);
        if stride < width || src.len() < expected {
            return false;
        }

        self.resize(width, height);
        if stride == width {
            self.data.copy_from_slice(&src[..expected]);
        } else {
            let (w, s) = (width as usize, stride as usize);
            for (row, dst) in self.data.chunks_exact_mut(w).enumerate() {
                let start = row * s;
                dst.copy_from_slice(&src[start..start + w]);
            }
        }
        self.frame_id = next_frame_id();
        true
    }

    /// Copy a tightly packed RGBA frame, converting to luma.
    /// Returns false if `rgba` is too small.
    pub fn copy_from_rgba(&mut self, rgba: &[u8], width: u32, height: u32) -> bool {
        let pixels = (width as usize) * (height as usize);
        if rgba.len() < pixels * 4 {
            return false;
        }

        self.resize(width, height);
        for (dst, px) in self.data.iter_mut().zip(rgba.chunks_exact(4)) {
            *dst = luma_from_rgb(px[0], px[1], px[2]);
        }
        self.frame_id = next_frame_id();
        true
    }
}

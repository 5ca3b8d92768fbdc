//! QR Decoder
//!
//! Extracts payload strings from luma frames. Finding nothing is the normal
//! outcome for most frames and is reported as an empty list.

use tracing::{debug, trace};

use crate::media::PixelBuffer;

/// Decode zero or more payloads from a frame. Implementations keep no state
/// between calls.
pub trait Decoder: Send + Sync {
    fn decode(&self, frame: &PixelBuffer) -> Vec<String>;
}

impl<F> Decoder for F
where
    F: Fn(&PixelBuffer) -> Vec<String> + Send + Sync,
{
    fn decode(&self, frame: &PixelBuffer) -> Vec<String> {
        self(frame)
    }
}

/// rqrr-backed QR decoder
#[derive(Debug, Default, Clone, Copy)]
pub struct QrDecoder;

impl QrDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for QrDecoder {
    fn decode(&self, frame: &PixelBuffer) -> Vec<String> {
        if frame.is_empty() {
            return Vec::new();
        }

        let expected_size = (frame.stride as usize) * (frame.height as usize);
        if frame.data.len() < expected_size {
            debug!("Frame too small: {} < {}", frame.data.len(), expected_size);
            return Vec::new();
        }

        // Reads go through stride, so padded rows never reach the detector
        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            frame.width as usize,
            frame.height as usize,
            |x, y| frame.pixel(x, y),
        );

        let grids = prepared.detect_grids();
        trace!(
            "Found {} potential QR grids in frame {} ({}x{}, stride={})",
            grids.len(),
            frame.frame_id,
            frame.width,
            frame.height,
            frame.stride
        );

        let mut payloads = Vec::with_capacity(grids.len());
        for grid in grids {
            match grid.decode() {
                Ok((_, content)) => payloads.push(content),
                Err(e) => debug!("Grid decode failed: {:?}", e),
            }
        }
        payloads
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::render_qr;

    #[test]
    fn test_decodes_rendered_code() {
        let frame = render_qr("aaaaa-aa-alice-123", 4);
        assert_eq!(QrDecoder::new().decode(&frame), vec!["aaaaa-aa-alice-123".to_string()]);
    }

    #[test]
    fn test_blank_frame_is_empty() {
        let frame = PixelBuffer::filled(120, 80, 255);
        assert!(QrDecoder::new().decode(&frame).is_empty());
    }

    #[test]
    fn test_empty_frame_is_empty() {
        assert!(QrDecoder::new().decode(&PixelBuffer::new()).is_empty());
    }

    #[test]
    fn test_truncated_frame_is_empty() {
        let mut frame = render_qr("bob-456", 3);
        frame.data.truncate(frame.data.len() / 2);
        assert!(QrDecoder::new().decode(&frame).is_empty());
    }

    #[test]
    fn test_padded_stride() {
        let tight = render_qr("carol-789", 4);
        let padding = 13;
        let stride = tight.width + padding;
        let mut padded = Vec::with_capacity((stride * tight.height) as usize);
        for row in tight.data.chunks_exact(tight.width as usize) {
            padded.extend_from_slice(row);
            padded.extend(std::iter::repeat(0u8).take(padding as usize));
        }

        let frame = PixelBuffer {
            frame_id: 1,
            width: tight.width,
            height: tight.height,
            stride,
            data: padded,
        };
        assert_eq!(QrDecoder::new().decode(&frame), vec!["carol-789".to_string()]);
    }

    #[test]
    fn test_closure_decoder() {
        let decoder = |frame: &PixelBuffer| vec![format!("{}x{}", frame.width, frame.height)];
        assert_eq!(decoder.decode(&PixelBuffer::filled(3, 2, 0)), vec!["3x2".to_string()]);
    }
}

//! Frame Sampler
//!
//! Fixed-rate frame capture from an open stream into a single reusable
//! buffer.

use std::time::Duration;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::trace;

use crate::camera::CameraStream;
use crate::media::PixelBuffer;

pub struct FrameSampler {
    interval: Interval,
    period: Duration,
    buffer: PixelBuffer,
    /// Timer ticks fired so far
    ticks: u64,
    /// Frames actually captured
    captures: u64,
}

impl FrameSampler {
    /// First tick fires one full `period` from now. Must be called inside a
    /// tokio runtime; `period` must be non-zero.
    pub fn new(period: Duration) -> Self {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        // A slow decode pushes the schedule back instead of bursting
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Self {
            interval,
            period,
            buffer: PixelBuffer::new(),
            ticks: 0,
            captures: 0,
        }
    }

    /// Wait for the next tick
    pub async fn tick(&mut self) -> u64 {
        self.interval.tick().await;
        self.ticks += 1;
        self.ticks
    }

    /// Copy the stream's current frame into the buffer. Returns `None` when
    /// the stream has no data yet (zero dimensions) or no frame to give.
    pub fn capture(&mut self, stream: &mut dyn CameraStream) -> Option<&PixelBuffer> {
        let (width, height) = stream.dimensions();
        if width == 0 || height == 0 {
            trace!("Tick {}: stream has no data yet, skipping", self.ticks);
            return None;
        }

        if !stream.read_frame(&mut self.buffer) || self.buffer.is_empty() {
            trace!("Tick {}: no frame available", self.ticks);
            return None;
        }

        self.captures += 1;
        Some(&self.buffer)
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn captures(&self) -> u64 {
        self.captures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{FacingMode, FrameSource};
    use crate::test_support::MockSource;

    #[tokio::test(start_paused = true)]
    async fn test_ticks_at_each_period() {
        let mut sampler = FrameSampler::new(Duration::from_millis(100));
        let deadline = tokio::time::sleep(Duration::from_millis(350));
        tokio::pin!(deadline);

        let mut fired = 0;
        loop {
            tokio::select! {
                biased;
                _ = &mut deadline => break,
                _ = sampler.tick() => fired += 1,
            }
        }

        assert_eq!(fired, 3);
        assert_eq!(sampler.ticks(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_waits_a_full_period() {
        let start = Instant::now();
        let mut sampler = FrameSampler::new(Duration::from_millis(250));
        sampler.tick().await;
        assert_eq!(start.elapsed(), Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_capture_skips_streams_without_data() {
        let source = MockSource::new().with_dimensions(0, 0);
        let mut stream = source.acquire(FacingMode::Environment).await.unwrap();
        let mut sampler = FrameSampler::new(Duration::from_millis(10));

        assert!(sampler.capture(stream.as_mut()).is_none());
        assert_eq!(sampler.captures(), 0);
    }

    #[tokio::test]
    async fn test_capture_reuses_buffer() {
        let source = MockSource::new().with_frame(PixelBuffer::filled(16, 9, 7));
        let mut stream = source.acquire(FacingMode::Environment).await.unwrap();
        let mut sampler = FrameSampler::new(Duration::from_millis(10));

        let first_ptr = {
            let frame = sampler.capture(stream.as_mut()).unwrap();
            assert_eq!((frame.width, frame.height), (16, 9));
            assert_eq!(frame.pixel(3, 3), 7);
            frame.data.as_ptr()
        };
        let second_ptr = sampler.capture(stream.as_mut()).unwrap().data.as_ptr();

        assert_eq!(first_ptr, second_ptr);
        assert_eq!(sampler.captures(), 2);
    }

    #[tokio::test]
    async fn test_capture_after_release_is_skipped() {
        let source = MockSource::new();
        let mut stream = source.acquire(FacingMode::Environment).await.unwrap();
        let mut sampler = FrameSampler::new(Duration::from_millis(10));

        stream.release();
        assert!(sampler.capture(stream.as_mut()).is_none());
    }
}

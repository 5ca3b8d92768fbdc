//! QR Scanner
//!
//! Camera-to-payload pipeline: a [`ScanController`] opens a stream from a
//! frame source, a [`FrameSampler`] captures frames on a fixed period, a
//! [`Decoder`] extracts payloads and a [`ResultAggregator`] keeps the
//! distinct ones up to a cap.

pub mod aggregator;
pub mod controller;
pub mod decoder;
pub mod sampler;
pub mod types;

pub use aggregator::ResultAggregator;
pub use controller::ScanController;
pub use decoder::{Decoder, QrDecoder};
pub use sampler::FrameSampler;
pub use types::{
    ConfigError, ScanConfig, ScanResult, ScanSnapshot, ScanState, DEFAULT_ACQUIRE_TIMEOUT,
    DEFAULT_SCAN_INTERVAL,
};

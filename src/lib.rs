//! scanpay
//!
//! QR payment client: camera scanning, the ledger API and the payment flow
//! built on top of them.

pub mod api;
pub mod app;
pub mod camera;
pub mod media;
pub mod scanner;

#[cfg(test)]
mod test_support;

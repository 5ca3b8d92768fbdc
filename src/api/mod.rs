//! Ledger API
//!
//! Typed access to the remote ledger: profiles, transactions and
//! notifications.

pub mod client;
pub mod error;
pub mod service;
pub mod types;

pub use client::{LedgerClient, DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT};
pub use error::ApiError;
pub use service::LedgerService;
pub use types::{AccountId, Notification, Transaction, UserProfile};

//! Ledger Service
//!
//! The operations the payment flow needs from the remote ledger.

use async_trait::async_trait;

use super::error::ApiError;
use super::types::{AccountId, Notification, Transaction, UserProfile};

#[async_trait]
pub trait LedgerService: Send + Sync {
    /// Move `amount` minor units from the caller to `recipient`
    async fn create_transaction(
        &self,
        recipient: &AccountId,
        amount: u64,
        note: &str,
    ) -> Result<Transaction, ApiError>;

    /// `None` when the account has no profile
    async fn get_user_profile(&self, id: &AccountId) -> Result<Option<UserProfile>, ApiError>;

    async fn get_caller_profile(&self) -> Result<Option<UserProfile>, ApiError>;

    async fn save_caller_profile(&self, profile: &UserProfile) -> Result<(), ApiError>;

    /// Tell `owner` their code was scanned by `scanner_name`
    async fn send_qr_scan_notification(
        &self,
        owner: &AccountId,
        scanner_name: &str,
    ) -> Result<(), ApiError>;

    async fn get_user_notifications(&self) -> Result<Vec<Notification>, ApiError>;

    async fn get_notification(&self, id: u64) -> Result<Notification, ApiError>;

    async fn mark_notification_read(&self, id: u64) -> Result<(), ApiError>;

    /// Transactions where the caller is payer or recipient
    async fn get_user_transactions(&self) -> Result<Vec<Transaction>, ApiError>;
}

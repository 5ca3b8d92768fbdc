//! Ledger API Types
//!
//! Wire types for the ledger service. Ids and amounts are integers,
//! timestamps are nanoseconds since the Unix epoch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Textual account identifier; also the payload of a payment QR code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for AccountId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub display_name: String,
    pub phone_number: String,
    /// Account id this profile's QR code encodes
    pub qr_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: u64,
    pub payer: AccountId,
    pub recipient: AccountId,
    /// Minor units (cents)
    pub amount: u64,
    pub note: String,
    pub timestamp: i64,
}

impl Transaction {
    pub fn time(&self) -> DateTime<Utc> {
        time_from_nanos(self.timestamp)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: u64,
    pub recipient: AccountId,
    pub is_read: bool,
    pub message: String,
    pub timestamp: i64,
}

impl Notification {
    pub fn time(&self) -> DateTime<Utc> {
        time_from_nanos(self.timestamp)
    }
}

/// Body of `POST /api/transactions`
#[derive(Debug, Clone, Serialize)]
pub(crate) struct CreateTransactionRequest<'a> {
    pub recipient: &'a AccountId,
    pub amount: u64,
    pub note: &'a str,
}

/// Body of `POST /api/users/{owner}/scan-notifications`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ScanNotificationRequest<'a> {
    pub scanner_display_name: &'a str,
}

/// Ledger timestamps are nanoseconds since the epoch
pub fn time_from_nanos(nanos: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_nanos(nanos)
}

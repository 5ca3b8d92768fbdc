//! Application Types
//!
//! Amounts, receipts, profile drafts and history entries shared by the
//! payment flow and the command line.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

use crate::api::{AccountId, Notification, Transaction, UserProfile};

/// Parse a user-entered decimal amount into minor units (cents).
/// Digits beyond the second decimal place are dropped. Returns `None` for
/// anything that isn't a plain positive decimal or floors to zero.
pub fn parse_amount(input: &str) -> Option<u64> {
    static AMOUNT: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = AMOUNT
        .get_or_init(|| Regex::new(r"^([0-9]*)(?:\.([0-9]*))?$").ok())
        .as_ref()?;

    let caps = pattern.captures(input.trim())?;
    let whole = caps.get(1).map_or("", |m| m.as_str());
    let fraction = caps.get(2).map_or("", |m| m.as_str());
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }

    let major: u64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let mut minor = 0u64;
    for (i, digit) in fraction.bytes().take(2).enumerate() {
        let value = u64::from(digit - b'0');
        minor += if i == 0 { value * 10 } else { value };
    }

    let cents = major.checked_mul(100)?.checked_add(minor)?;
    (cents > 0).then_some(cents)
}

/// Render minor units as `major.minor`
pub fn format_amount(cents: u64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

/// Note sent with a payment; blank becomes "Payment"
pub fn normalize_note(note: &str) -> String {
    let trimmed = note.trim();
    if trimmed.is_empty() {
        "Payment".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Completed payment as shown to the payer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt {
    pub transaction_id: u64,
    pub recipient: AccountId,
    pub recipient_name: String,
    pub amount: u64,
    pub note: String,
    pub timestamp: DateTime<Utc>,
}

impl Receipt {
    pub fn new(transaction: &Transaction, recipient: &UserProfile) -> Self {
        Self {
            transaction_id: transaction.id,
            recipient: transaction.recipient.clone(),
            recipient_name: recipient.display_name.clone(),
            amount: transaction.amount,
            note: transaction.note.clone(),
            timestamp: transaction.time(),
        }
    }

    pub fn formatted_amount(&self) -> String {
        format_amount(self.amount)
    }
}

/// Profile fields as entered, before validation
#[derive(Debug, Clone, Default)]
pub struct ProfileDraft {
    pub display_name: String,
    pub phone_number: String,
}

impl ProfileDraft {
    /// Trimmed profile for `account`, or `None` if a field is blank
    pub fn into_profile(self, account: &AccountId) -> Option<UserProfile> {
        let display_name = self.display_name.trim();
        let phone_number = self.phone_number.trim();
        if display_name.is_empty() || phone_number.is_empty() {
            return None;
        }

        Some(UserProfile {
            display_name: display_name.to_string(),
            phone_number: phone_number.to_string(),
            qr_code: account.to_string(),
        })
    }
}

pub fn unread_count(notifications: &[Notification]) -> usize {
    notifications.iter().filter(|n| !n.is_read).count()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Caller paid
    Debit,
    /// Caller was paid
    Credit,
}

/// A transaction from the caller's point of view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub id: u64,
    pub direction: Direction,
    /// The other account
    pub counterparty: AccountId,
    pub amount: u64,
    pub note: String,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(transaction: &Transaction, caller: &AccountId) -> Self {
        let (direction, counterparty) = if &transaction.payer == caller {
            (Direction::Debit, transaction.recipient.clone())
        } else {
            (Direction::Credit, transaction.payer.clone())
        };

        Self {
            id: transaction.id,
            direction,
            counterparty,
            amount: transaction.amount,
            note: transaction.note.clone(),
            timestamp: transaction.time(),
        }
    }

    /// Signed amount, e.g. `-12.50` or `+3.00`
    pub fn signed_amount(&self) -> String {
        let sign = match self.direction {
            Direction::Debit => '-',
            Direction::Credit => '+',
        };
        format!("{}{}", sign, format_amount(self.amount))
    }
}

/// Newest first
pub fn history(transactions: &[Transaction], caller: &AccountId) -> Vec<HistoryEntry> {
    let mut entries: Vec<HistoryEntry> = transactions
        .iter()
        .map(|tx| HistoryEntry::new(tx, caller))
        .collect();
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    entries
}

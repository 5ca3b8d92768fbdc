//! Scan & Pay
//!
//! Turns the first scanned code into a payment: look up the recipient, let
//! them know they were scanned, then submit the amount to the ledger.

use log::{info, warn};
use std::sync::Arc;
use thiserror::Error;

use super::types::{format_amount, normalize_note, parse_amount, Receipt};
use crate::api::{AccountId, ApiError, LedgerService, UserProfile};
use crate::scanner::{ScanController, ScanResult};

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("no recipient has been scanned")]
    NotScanned,
    #[error("{0} is not a registered user")]
    UnknownRecipient(AccountId),
    #[error("Please enter a valid amount greater than 0")]
    InvalidAmount,
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Recipient resolved from a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub account: AccountId,
    pub profile: UserProfile,
}

pub struct PaymentSession {
    ledger: Arc<dyn LedgerService>,
    scanner: Arc<ScanController>,
    recipient: Option<Recipient>,
}

impl PaymentSession {
    pub fn new(ledger: Arc<dyn LedgerService>, scanner: Arc<ScanController>) -> Self {
        Self {
            ledger,
            scanner,
            recipient: None,
        }
    }

    pub fn recipient(&self) -> Option<&Recipient> {
        self.recipient.as_ref()
    }

    pub fn scanner(&self) -> &Arc<ScanController> {
        &self.scanner
    }

    /// Take a scanned code as the payment recipient. Scanning stops first.
    /// Once a recipient is set, further scans are ignored until `reset`.
    pub async fn accept_scan(&mut self, result: &ScanResult) -> Result<&Recipient, PaymentError> {
        if self.recipient.is_some() {
            return self.recipient.as_ref().ok_or(PaymentError::NotScanned);
        }

        let account = AccountId::new(result.data.trim());
        self.scanner.stop_scanning().await;
        info!("Scanned recipient {}", account);

        let profile = self
            .ledger
            .get_user_profile(&account)
            .await?
            .ok_or_else(|| PaymentError::UnknownRecipient(account.clone()))?;

        self.notify_owner(&account).await;

        Ok(&*self.recipient.insert(Recipient { account, profile }))
    }

    /// Let the code's owner know who scanned it. Failures are only logged.
    async fn notify_owner(&self, owner: &AccountId) {
        let caller = match self.ledger.get_caller_profile().await {
            Ok(Some(profile)) => profile,
            Ok(None) => return,
            Err(e) => {
                warn!("Could not load own profile for scan notification: {}", e);
                return;
            }
        };

        if let Err(e) = self
            .ledger
            .send_qr_scan_notification(owner, &caller.display_name)
            .await
        {
            warn!("Failed to send scan notification to {}: {}", owner, e);
        }
    }

    /// Pay the scanned recipient
    pub async fn submit(&self, amount: &str, note: &str) -> Result<Receipt, PaymentError> {
        let recipient = self.recipient.as_ref().ok_or(PaymentError::NotScanned)?;
        let cents = parse_amount(amount).ok_or(PaymentError::InvalidAmount)?;
        let note = normalize_note(note);

        let transaction = self
            .ledger
            .create_transaction(&recipient.account, cents, &note)
            .await?;
        info!(
            "Paid {} to {} (transaction {})",
            format_amount(cents),
            recipient.profile.display_name,
            transaction.id
        );

        Ok(Receipt::new(&transaction, &recipient.profile))
    }

    /// Forget the recipient and results so scanning can start over
    pub fn reset(&mut self) {
        self.recipient = None;
        self.scanner.clear_results();
    }
}

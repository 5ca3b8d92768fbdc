//! Application
//!
//! Wires settings, the camera backend, the scanner and the ledger client
//! together, and exposes the flows the command line runs.

pub mod cache;
pub mod config;
pub mod payment;
pub mod types;

pub use cache::SessionToken;
pub use config::{CameraBackend, CameraSettings, LogFormat, Settings};
pub use payment::{PaymentError, PaymentSession, Recipient};
pub use types::{
    format_amount, history, parse_amount, unread_count, Direction, HistoryEntry, ProfileDraft,
    Receipt,
};

use anyhow::{anyhow, bail, Context, Result};
use log::info;
use std::sync::Arc;

use crate::api::{AccountId, LedgerClient, LedgerService, Notification, UserProfile};
use crate::camera::{DisabledSource, FrameSource, ImageSequenceSource};
use crate::scanner::{Decoder, QrDecoder, ScanController, ScanResult, ScanState};

/// Frame source for the configured backend
pub fn build_frame_source(settings: &CameraSettings) -> Arc<dyn FrameSource> {
    let backend = settings.backend.display_name();
    match settings.backend {
        CameraBackend::ImageSequence => {
            info!(
                "Camera backend: {} ({} device(s))",
                backend,
                settings.devices.len()
            );
            Arc::new(ImageSequenceSource::new(settings.devices.clone()))
        }
        CameraBackend::Disabled => {
            info!("Camera backend: {}", backend);
            Arc::new(DisabledSource)
        }
    }
}

/// Main application structure
pub struct App {
    /// User settings
    pub settings: Settings,

    ledger: Arc<dyn LedgerService>,
    scanner: Arc<ScanController>,
}

impl App {
    /// Build from settings, using the cached token (if any) for the ledger
    pub fn new(settings: Settings, token: Option<&SessionToken>) -> Result<Self> {
        let mut client =
            LedgerClient::with_base_url(&settings.api.base_url, settings.api.request_timeout())
                .context("Failed to create ledger client")?;
        if let Some(token) = token {
            client = client.with_token(token.token.clone());
        }

        let source = build_frame_source(&settings.camera);
        Self::with_parts(settings, Arc::new(client), source, Arc::new(QrDecoder::new()))
    }

    pub fn with_parts(
        settings: Settings,
        ledger: Arc<dyn LedgerService>,
        source: Arc<dyn FrameSource>,
        decoder: Arc<dyn Decoder>,
    ) -> Result<Self> {
        let scanner = ScanController::new(settings.scan_config()?, source, decoder);

        Ok(Self {
            settings,
            ledger,
            scanner: Arc::new(scanner),
        })
    }

    pub fn scanner(&self) -> &Arc<ScanController> {
        &self.scanner
    }

    pub fn ledger(&self) -> &Arc<dyn LedgerService> {
        &self.ledger
    }

    /// Open the camera, retrying if the last attempt failed
    async fn begin_scanning(&self) -> Result<()> {
        self.scanner.clear_results();
        if self.scanner.state() == ScanState::Error {
            self.scanner.retry().await?;
        } else {
            self.scanner.start_scanning().await?;
        }
        Ok(())
    }

    /// Scan until the configured number of codes has been found, then
    /// release the camera
    pub async fn scan(&self) -> Result<Vec<ScanResult>> {
        self.begin_scanning().await?;

        let wanted = self.scanner.config().max_results();
        let results = self.scanner.wait_for_results(wanted).await;
        self.scanner.stop_scanning().await;
        Ok(results)
    }

    pub fn payment_session(&self) -> PaymentSession {
        PaymentSession::new(Arc::clone(&self.ledger), Arc::clone(&self.scanner))
    }

    /// Scan one code and pay `amount` to it
    pub async fn scan_and_pay(&self, amount: &str, note: &str) -> Result<Receipt> {
        let mut session = self.payment_session();
        self.begin_scanning().await?;

        let Some(result) = self.scanner.wait_for_result().await else {
            if let Some(err) = self.scanner.error() {
                return Err(err.into());
            }
            bail!("Scanning stopped before a code was found");
        };

        let recipient = session.accept_scan(&result).await?;
        info!(
            "Paying {} ({})",
            recipient.profile.display_name, recipient.account
        );
        Ok(session.submit(amount, note).await?)
    }

    pub async fn profile(&self) -> Result<Option<UserProfile>> {
        Ok(self.ledger.get_caller_profile().await?)
    }

    pub async fn save_profile(&self, draft: ProfileDraft, account: &AccountId) -> Result<UserProfile> {
        let profile = draft
            .into_profile(account)
            .ok_or_else(|| anyhow!("Display name and phone number are required"))?;
        self.ledger.save_caller_profile(&profile).await?;
        Ok(profile)
    }

    pub async fn notifications(&self) -> Result<Vec<Notification>> {
        let mut notifications = self.ledger.get_user_notifications().await?;
        notifications.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(notifications)
    }

    /// Mark a notification read and return its updated state
    pub async fn mark_notification_read(&self, id: u64) -> Result<Notification> {
        self.ledger.mark_notification_read(id).await?;
        Ok(self.ledger.get_notification(id).await?)
    }

    /// Transaction history relative to the caller's own account
    pub async fn history(&self) -> Result<Vec<HistoryEntry>> {
        let profile = self
            .profile()
            .await?
            .ok_or_else(|| anyhow!("Set up your profile first"))?;
        let me = AccountId::new(profile.qr_code);

        let transactions = self.ledger.get_user_transactions().await?;
        Ok(history(&transactions, &me))
    }

    pub async fn shutdown(&self) {
        self.scanner.shutdown().await;
    }
}

//! Ledger API Client
//!
//! JSON-over-HTTPS client for the ledger service.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error, info};

use super::error::ApiError;
use super::service::LedgerService;
use super::types::{
    AccountId, CreateTransactionRequest, Notification, ScanNotificationRequest, Transaction,
    UserProfile,
};

pub const DEFAULT_BASE_URL: &str = "https://ledger.scanpay.app";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct LedgerClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl LedgerClient {
    pub fn new() -> Result<Self, ApiError> {
        Self::with_base_url(DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("scanpay/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Authenticate requests with a bearer token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, ApiError> {
        let token = self.token.as_deref().ok_or(ApiError::NotAuthenticated)?;
        Ok(request.bearer_auth(token))
    }

    async fn check(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        error!("Ledger request failed: {} - {}", status, body);
        Err(ApiError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!("GET {}", url);
        let response = self.authorized(self.client.get(&url))?.send().await?;
        Self::decode(Self::check(response).await?).await
    }

    /// Like `get_json`, with 404 mapped to `None`
    async fn get_optional<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ApiError> {
        match self.get_json::<Option<T>>(path).await {
            Err(e) if e.is_not_found() => Ok(None),
            other => other,
        }
    }

    async fn send_empty(&self, request: RequestBuilder) -> Result<(), ApiError> {
        let response = self.authorized(request)?.send().await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl LedgerService for LedgerClient {
    async fn create_transaction(
        &self,
        recipient: &AccountId,
        amount: u64,
        note: &str,
    ) -> Result<Transaction, ApiError> {
        let url = self.url("/api/transactions");
        info!("Creating transaction of {} to {}", amount, recipient);

        let body = CreateTransactionRequest {
            recipient,
            amount,
            note,
        };
        let request = self
            .client
            .post(&url)
            .header("Idempotency-Key", uuid::Uuid::new_v4().to_string())
            .json(&body);

        let response = self.authorized(request)?.send().await?;
        let tx: Transaction = Self::decode(Self::check(response).await?).await?;
        info!("Transaction {} created", tx.id);
        Ok(tx)
    }

    async fn get_user_profile(&self, id: &AccountId) -> Result<Option<UserProfile>, ApiError> {
        let path = format!("/api/users/{}/profile", urlencoding::encode(id.as_str()));
        self.get_optional(&path).await
    }

    async fn get_caller_profile(&self) -> Result<Option<UserProfile>, ApiError> {
        self.get_optional("/api/profile").await
    }

    async fn save_caller_profile(&self, profile: &UserProfile) -> Result<(), ApiError> {
        info!("Saving profile for {}", profile.display_name);
        self.send_empty(self.client.put(self.url("/api/profile")).json(profile))
            .await
    }

    async fn send_qr_scan_notification(
        &self,
        owner: &AccountId,
        scanner_name: &str,
    ) -> Result<(), ApiError> {
        let path = format!(
            "/api/users/{}/scan-notifications",
            urlencoding::encode(owner.as_str())
        );
        debug!("Notifying {} of scan by {}", owner, scanner_name);
        let body = ScanNotificationRequest {
            scanner_display_name: scanner_name,
        };
        self.send_empty(self.client.post(self.url(&path)).json(&body))
            .await
    }

    async fn get_user_notifications(&self) -> Result<Vec<Notification>, ApiError> {
        let notifications: Vec<Notification> = self.get_json("/api/notifications").await?;
        debug!("Fetched {} notifications", notifications.len());
        Ok(notifications)
    }

    async fn get_notification(&self, id: u64) -> Result<Notification, ApiError> {
        self.get_json(&format!("/api/notifications/{}", id)).await
    }

    async fn mark_notification_read(&self, id: u64) -> Result<(), ApiError> {
        let url = self.url(&format!("/api/notifications/{}/read", id));
        self.send_empty(self.client.post(url)).await
    }

    async fn get_user_transactions(&self) -> Result<Vec<Transaction>, ApiError> {
        let transactions: Vec<Transaction> = self.get_json("/api/transactions").await?;
        debug!("Fetched {} transactions", transactions.len());
        Ok(transactions)
    }
}

//! Test doubles shared by the unit tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::api::{AccountId, ApiError, LedgerService, Notification, Transaction, UserProfile};
use crate::camera::{CameraError, CameraStream, FacingMode, FrameSource};
use crate::media::PixelBuffer;
use crate::scanner::Decoder;

/// Rasterise a real QR code (4-module quiet zone) into a luma frame
pub fn render_qr(payload: &str, scale: u32) -> PixelBuffer {
    let code = qrcode::QrCode::new(payload.as_bytes()).expect("payload fits in a QR code");
    let modules = code.width() as u32;
    let quiet = 4;
    let size = (modules + 2 * quiet) * scale;
    let mut data = vec![255u8; (size * size) as usize];

    for (i, color) in code.to_colors().iter().enumerate() {
        if *color != qrcode::Color::Dark {
            continue;
        }
        let mx = i as u32 % modules;
        let my = i as u32 / modules;
        for dy in 0..scale {
            for dx in 0..scale {
                let x = (mx + quiet) * scale + dx;
                let y = (my + quiet) * scale + dy;
                data[(y * size + x) as usize] = 0;
            }
        }
    }

    let mut frame = PixelBuffer::new();
    assert!(frame.copy_from_luma(&data, size, size, size));
    frame
}

/// Counters shared between a [`MockSource`] and the streams it opens
#[derive(Debug, Default)]
pub struct StreamCounters {
    pub opened: AtomicUsize,
    pub released: AtomicUsize,
}

impl StreamCounters {
    pub fn live(&self) -> usize {
        self.opened.load(Ordering::SeqCst) - self.released.load(Ordering::SeqCst)
    }
}

pub struct MockStream {
    frame: PixelBuffer,
    dimensions: (u32, u32),
    live: bool,
    counters: Arc<StreamCounters>,
}

impl CameraStream for MockStream {
    fn label(&self) -> &str {
        "mock camera"
    }

    fn dimensions(&self) -> (u32, u32) {
        if self.live {
            self.dimensions
        } else {
            (0, 0)
        }
    }

    fn read_frame(&mut self, buffer: &mut PixelBuffer) -> bool {
        self.live
            && buffer.copy_from_luma(
                &self.frame.data,
                self.frame.width,
                self.frame.height,
                self.frame.stride,
            )
    }

    fn release(&mut self) {
        if self.live {
            self.live = false;
            self.counters.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn is_live(&self) -> bool {
        self.live
    }
}

impl Drop for MockStream {
    fn drop(&mut self) {
        self.release();
    }
}

/// Scriptable frame source
pub struct MockSource {
    failures: Mutex<VecDeque<CameraError>>,
    delay: Option<Duration>,
    hang: bool,
    frame: PixelBuffer,
    dimensions: (u32, u32),
    pub acquisitions: AtomicUsize,
    pub counters: Arc<StreamCounters>,
}

impl MockSource {
    pub fn new() -> Self {
        Self {
            failures: Mutex::new(VecDeque::new()),
            delay: None,
            hang: false,
            frame: PixelBuffer::filled(8, 8, 255),
            dimensions: (8, 8),
            acquisitions: AtomicUsize::new(0),
            counters: Arc::new(StreamCounters::default()),
        }
    }

    pub fn with_frame(mut self, frame: PixelBuffer) -> Self {
        self.dimensions = (frame.width, frame.height);
        self.frame = frame;
        self
    }

    /// Streams report this size regardless of the frame
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.dimensions = (width, height);
        self
    }

    /// Fail the next acquisition with `err`
    pub fn failing_with(self, err: CameraError) -> Self {
        self.failures.lock().push_back(err);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Never complete an acquisition
    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FrameSource for MockSource {
    async fn acquire(&self, _facing_mode: FacingMode) -> Result<Box<dyn CameraStream>, CameraError> {
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        if self.hang {
            std::future::pending::<()>().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = self.failures.lock().pop_front() {
            return Err(err);
        }

        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockStream {
            frame: self.frame.clone(),
            dimensions: self.dimensions,
            live: true,
            counters: Arc::clone(&self.counters),
        }))
    }
}

/// Decoder that counts calls and returns a fixed payload list
pub struct CountingDecoder {
    calls: AtomicUsize,
    payloads: Vec<String>,
}

impl CountingDecoder {
    pub fn new(payloads: &[&str]) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            payloads: payloads.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Decoder for CountingDecoder {
    fn decode(&self, _frame: &PixelBuffer) -> Vec<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.payloads.clone()
    }
}

/// In-memory ledger. The caller's account is `"me"`.
#[derive(Default)]
pub struct MockLedger {
    profiles: HashMap<String, UserProfile>,
    caller: Mutex<Option<UserProfile>>,
    fail_notifications: bool,
    pub notifications: Mutex<Vec<(String, String)>>,
    pub inbox: Mutex<Vec<Notification>>,
    pub transactions: Mutex<Vec<(String, u64, String)>>,
    pub history: Vec<Transaction>,
}

impl MockLedger {
    pub fn with_profile(mut self, id: &str, name: &str) -> Self {
        self.profiles.insert(
            id.to_string(),
            UserProfile {
                display_name: name.to_string(),
                phone_number: "555-0100".to_string(),
                qr_code: id.to_string(),
            },
        );
        self
    }

    pub fn with_caller(self, name: &str) -> Self {
        *self.caller.lock() = Some(UserProfile {
            display_name: name.to_string(),
            phone_number: "555-0199".to_string(),
            qr_code: "me".to_string(),
        });
        self
    }

    pub fn with_notification(self, id: u64, message: &str, is_read: bool) -> Self {
        self.inbox.lock().push(Notification {
            id,
            recipient: "me".into(),
            is_read,
            message: message.to_string(),
            timestamp: id as i64 * 1_000_000_000,
        });
        self
    }

    pub fn with_history(mut self, transactions: Vec<Transaction>) -> Self {
        self.history = transactions;
        self
    }

    /// Every scan notification fails with a 503
    pub fn failing_notifications(mut self) -> Self {
        self.fail_notifications = true;
        self
    }

    pub fn caller(&self) -> Option<UserProfile> {
        self.caller.lock().clone()
    }
}

fn not_found() -> ApiError {
    ApiError::Status {
        status: 404,
        body: String::new(),
    }
}

#[async_trait]
impl LedgerService for MockLedger {
    async fn create_transaction(
        &self,
        recipient: &AccountId,
        amount: u64,
        note: &str,
    ) -> Result<Transaction, ApiError> {
        let mut transactions = self.transactions.lock();
        transactions.push((recipient.to_string(), amount, note.to_string()));
        Ok(Transaction {
            id: transactions.len() as u64,
            payer: "me".into(),
            recipient: recipient.clone(),
            amount,
            note: note.to_string(),
            timestamp: 1_700_000_000_000_000_000,
        })
    }

    async fn get_user_profile(&self, id: &AccountId) -> Result<Option<UserProfile>, ApiError> {
        Ok(self.profiles.get(id.as_str()).cloned())
    }

    async fn get_caller_profile(&self) -> Result<Option<UserProfile>, ApiError> {
        Ok(self.caller())
    }

    async fn save_caller_profile(&self, profile: &UserProfile) -> Result<(), ApiError> {
        *self.caller.lock() = Some(profile.clone());
        Ok(())
    }

    async fn send_qr_scan_notification(
        &self,
        owner: &AccountId,
        scanner_name: &str,
    ) -> Result<(), ApiError> {
        if self.fail_notifications {
            return Err(ApiError::Status {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        self.notifications
            .lock()
            .push((owner.to_string(), scanner_name.to_string()));
        Ok(())
    }

    async fn get_user_notifications(&self) -> Result<Vec<Notification>, ApiError> {
        Ok(self.inbox.lock().clone())
    }

    async fn get_notification(&self, id: u64) -> Result<Notification, ApiError> {
        self.inbox
            .lock()
            .iter()
            .find(|n| n.id == id)
            .cloned()
            .ok_or_else(not_found)
    }

    async fn mark_notification_read(&self, id: u64) -> Result<(), ApiError> {
        let mut inbox = self.inbox.lock();
        let notification = inbox.iter_mut().find(|n| n.id == id).ok_or_else(not_found)?;
        notification.is_read = true;
        Ok(())
    }

    async fn get_user_transactions(&self) -> Result<Vec<Transaction>, ApiError> {
        Ok(self.history.clone())
    }
}

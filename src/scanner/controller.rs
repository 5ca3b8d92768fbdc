//! Scan Controller
//!
//! Start/stop/retry lifecycle around the acquisition pipeline:
//!
//! ```text
//!   Idle --start--> Acquiring --ok--> ActiveScanning --stop--> Idle
//!                       |
//!                       +--fail/timeout--> Error --retry--> Acquiring
//! ```
//!
//! Each successful acquisition spawns one sampling task that owns the stream,
//! the sampler and its pixel buffer. The task is the only place frames are
//! captured and decoded, so the buffer is never shared. Controller state and
//! the aggregator sit behind one mutex; the task takes it only to check
//! suppression and to commit results.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::aggregator::ResultAggregator;
use super::decoder::Decoder;
use super::sampler::FrameSampler;
use super::types::{ScanConfig, ScanResult, ScanSnapshot, ScanState};
use crate::camera::{acquire_with_timeout, CameraError, CameraStream, FrameSource};

/// Live stream plus sampling task
struct ScanSession {
    generation: u64,
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
    /// Closes once the task has released the stream
    released: watch::Receiver<()>,
}

impl ScanSession {
    /// Signal the task and wait for it to exit. The task releases the stream
    /// on its way out.
    async fn stop(self) {
        let _ = self.stop_tx.send(true);
        if let Err(e) = self.handle.await {
            if e.is_panic() {
                error!("Sampling task for session {} panicked", self.generation);
            }
        }
    }
}

struct Shared {
    state: ScanState,
    error: Option<CameraError>,
    aggregator: ResultAggregator,
    /// Bumped on every acquisition attempt; stale work compares against it
    generation: u64,
    session: Option<ScanSession>,
    /// Release signal of the last stopped session
    draining: Option<watch::Receiver<()>>,
}

impl Shared {
    fn snapshot(&self) -> ScanSnapshot {
        ScanSnapshot {
            state: self.state,
            results: self.aggregator.results().to_vec(),
            error: self.error.clone(),
            is_scanning: self.state == ScanState::ActiveScanning && !self.aggregator.is_full(),
        }
    }

    /// Whether the session tagged `generation` may still touch state
    fn owns(&self, generation: u64) -> bool {
        self.generation == generation && self.state == ScanState::ActiveScanning
    }
}

struct Inner {
    shared: Mutex<Shared>,
    snapshot_tx: watch::Sender<ScanSnapshot>,
}

impl Inner {
    fn publish(&self, shared: &Shared) {
        self.snapshot_tx.send_replace(shared.snapshot());
    }
}

/// QR scan controller
pub struct ScanController {
    config: ScanConfig,
    source: Arc<dyn FrameSource>,
    decoder: Arc<dyn Decoder>,
    inner: Arc<Inner>,
}

impl ScanController {
    pub fn new(config: ScanConfig, source: Arc<dyn FrameSource>, decoder: Arc<dyn Decoder>) -> Self {
        let shared = Shared {
            state: ScanState::Idle,
            error: None,
            aggregator: ResultAggregator::new(config.max_results()),
            generation: 0,
            session: None,
            draining: None,
        };
        let (snapshot_tx, _) = watch::channel(shared.snapshot());

        Self {
            config,
            source,
            decoder,
            inner: Arc::new(Inner {
                shared: Mutex::new(shared),
                snapshot_tx,
            }),
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn state(&self) -> ScanState {
        self.inner.shared.lock().state
    }

    /// Last acquisition failure, kept until `retry`
    pub fn error(&self) -> Option<CameraError> {
        self.inner.shared.lock().error.clone()
    }

    pub fn results(&self) -> Vec<ScanResult> {
        self.inner.shared.lock().aggregator.results().to_vec()
    }

    pub fn snapshot(&self) -> ScanSnapshot {
        self.inner.shared.lock().snapshot()
    }

    /// Receive a snapshot after every state or result change
    pub fn subscribe(&self) -> watch::Receiver<ScanSnapshot> {
        self.inner.snapshot_tx.subscribe()
    }

    pub fn can_start_scanning(&self) -> bool {
        self.state() == ScanState::Idle
    }

    /// Stream open
    pub fn is_active(&self) -> bool {
        self.state() == ScanState::ActiveScanning
    }

    /// Acquisition in flight
    pub fn is_loading(&self) -> bool {
        self.state() == ScanState::Acquiring
    }

    /// Stream open and decoding, i.e. not held back by a full result list
    pub fn is_scanning(&self) -> bool {
        self.snapshot().is_scanning
    }

    /// Open the camera and begin sampling. A no-op unless idle.
    ///
    /// Acquisition failures move the controller to `Error`, are kept for
    /// [`ScanController::error`], and are returned here as well.
    pub async fn start_scanning(&self) -> Result<(), CameraError> {
        let generation = {
            let mut shared = self.inner.shared.lock();
            if shared.state != ScanState::Idle {
                debug!("start_scanning ignored in state {}", shared.state);
                return Ok(());
            }
            shared.generation += 1;
            shared.state = ScanState::Acquiring;
            self.inner.publish(&shared);
            shared.generation
        };

        self.acquire(generation).await
    }

    /// Re-attempt acquisition after a failure. A no-op outside `Error`.
    pub async fn retry(&self) -> Result<(), CameraError> {
        let generation = {
            let mut shared = self.inner.shared.lock();
            if shared.state != ScanState::Error {
                debug!("retry ignored in state {}", shared.state);
                return Ok(());
            }
            shared.error = None;
            shared.generation += 1;
            shared.state = ScanState::Acquiring;
            self.inner.publish(&shared);
            shared.generation
        };

        info!("Retrying camera acquisition");
        self.acquire(generation).await
    }

    async fn acquire(&self, generation: u64) -> Result<(), CameraError> {
        // Never hold two streams: wait for a stopped session to let go first
        let draining = self.inner.shared.lock().draining.clone();
        if let Some(mut released) = draining {
            let _ = released.changed().await;
        }

        let facing_mode = self.config.facing_mode();
        info!("Starting {} camera", facing_mode);

        let outcome =
            acquire_with_timeout(self.source.as_ref(), facing_mode, self.config.acquire_timeout())
                .await;

        let mut shared = self.inner.shared.lock();
        if shared.generation != generation || shared.state != ScanState::Acquiring {
            // Stopped while the device was opening
            if let Ok(mut stream) = outcome {
                stream.release();
            }
            debug!("Discarding superseded acquisition {}", generation);
            return Ok(());
        }

        match outcome {
            Ok(stream) => {
                info!("Camera '{}' active, scanning every {:?}", stream.label(), self.config.scan_interval());
                let (stop_tx, stop_rx) = watch::channel(false);
                let (released_tx, released) = watch::channel(());
                let handle = tokio::spawn(run_session(
                    Arc::clone(&self.inner),
                    Arc::clone(&self.decoder),
                    stream,
                    self.config.scan_interval(),
                    generation,
                    stop_rx,
                    released_tx,
                ));

                shared.session = Some(ScanSession {
                    generation,
                    stop_tx,
                    handle,
                    released,
                });
                shared.state = ScanState::ActiveScanning;
                self.inner.publish(&shared);
                Ok(())
            }
            Err(err) => {
                warn!("Camera acquisition failed ({}): {}", err.kind(), err.message());
                shared.error = Some(err.clone());
                shared.state = ScanState::Error;
                self.inner.publish(&shared);
                Err(err)
            }
        }
    }

    /// Release the camera and stop sampling. Once this returns no further
    /// tick runs; a decode in flight is discarded. Cancels an acquisition
    /// in progress.
    pub async fn stop_scanning(&self) {
        let session = {
            let mut shared = self.inner.shared.lock();
            match shared.state {
                ScanState::Idle | ScanState::Error => return,
                ScanState::Acquiring => {
                    shared.state = ScanState::Idle;
                    self.inner.publish(&shared);
                    info!("Camera start cancelled");
                    return;
                }
                ScanState::ActiveScanning => {
                    // Signal the old session before anyone can observe Idle
                    let session = shared.session.take();
                    if let Some(session) = &session {
                        let _ = session.stop_tx.send(true);
                        shared.draining = Some(session.released.clone());
                    }
                    shared.state = ScanState::Idle;
                    self.inner.publish(&shared);
                    session
                }
            }
        };

        if let Some(session) = session {
            session.stop().await;
        }
        info!("Camera stopped");
    }

    /// Empty the result list; decoding resumes if it was held back
    pub fn clear_results(&self) {
        let mut shared = self.inner.shared.lock();
        shared.aggregator.clear();
        self.inner.publish(&shared);
        debug!("Scan results cleared");
    }

    /// Wait for the first result of the current session. `None` if the
    /// controller leaves `ActiveScanning` without producing one.
    pub async fn wait_for_result(&self) -> Option<ScanResult> {
        let mut rx = self.subscribe();
        let snapshot = rx
            .wait_for(|s| !s.results.is_empty() || s.state != ScanState::ActiveScanning)
            .await
            .ok()?;
        snapshot.results.first().cloned()
    }

    /// Wait until `count` results are held (capped at `max_results`).
    /// Returns whatever was collected if scanning stops first.
    pub async fn wait_for_results(&self, count: usize) -> Vec<ScanResult> {
        let wanted = count.clamp(1, self.config.max_results());
        let mut rx = self.subscribe();
        let results = match rx
            .wait_for(|s| s.results.len() >= wanted || s.state != ScanState::ActiveScanning)
            .await
        {
            Ok(snapshot) => snapshot.results.clone(),
            Err(_) => self.results(),
        };
        results
    }

    /// Stop any session; used on teardown
    pub async fn shutdown(&self) {
        self.stop_scanning().await;
    }
}

impl Drop for ScanController {
    fn drop(&mut self) {
        // Can't await here; the task sees the signal and releases the stream
        if let Some(session) = self.inner.shared.lock().session.take() {
            let _ = session.stop_tx.send(true);
        }
    }
}

async fn run_session(
    inner: Arc<Inner>,
    decoder: Arc<dyn Decoder>,
    mut stream: Box<dyn CameraStream>,
    period: Duration,
    generation: u64,
    mut stop_rx: watch::Receiver<bool>,
    released: watch::Sender<()>,
) {
    let mut sampler = FrameSampler::new(period);
    debug!("Session {} sampling every {:?}", generation, sampler.period());

    loop {
        tokio::select! {
            biased;
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
                continue;
            }
            _ = sampler.tick() => {}
        }

        if *stop_rx.borrow() {
            break;
        }

        {
            let shared = inner.shared.lock();
            if !shared.owns(generation) {
                break;
            }
            if shared.aggregator.is_full() {
                continue;
            }
        }

        let Some(frame) = sampler.capture(stream.as_mut()) else {
            continue;
        };
        let payloads = decoder.decode(frame);
        if payloads.is_empty() {
            continue;
        }

        if *stop_rx.borrow() {
            debug!("Session {} stopping, discarding {} decoded payload(s)", generation, payloads.len());
            break;
        }

        let mut shared = inner.shared.lock();
        if !shared.owns(generation) {
            break;
        }
        let mut accepted = false;
        for payload in payloads {
            if shared.aggregator.offer(payload.as_str()) {
                info!("QR code detected: {}", payload);
                accepted = true;
            }
        }
        if accepted {
            inner.publish(&shared);
        }
    }

    stream.release();
    drop(released);
    debug!(
        "Session {} ended after {} ticks ({} frames captured)",
        generation,
        sampler.ticks(),
        sampler.captures()
    );
}

//! Result Aggregator
//!
//! Collects decoded payloads across frames. A code held in front of the
//! camera shows up on every tick; only the first sighting is kept.

use std::collections::HashSet;

use super::types::ScanResult;

pub struct ResultAggregator {
    results: Vec<ScanResult>,
    seen: HashSet<String>,
    max_results: usize,
}

impl ResultAggregator {
    pub fn new(max_results: usize) -> Self {
        Self {
            results: Vec::with_capacity(max_results.min(16)),
            seen: HashSet::new(),
            max_results,
        }
    }

    /// Record a payload. Rejected if an equal payload is already present or
    /// the list is at capacity. Returns whether it was accepted.
    pub fn offer(&mut self, payload: impl Into<String>) -> bool {
        if self.is_full() {
            return false;
        }

        let payload = payload.into();
        if self.seen.contains(&payload) {
            return false;
        }

        self.seen.insert(payload.clone());
        self.results.push(ScanResult::new(payload));
        true
    }

    /// Accumulated results in insertion order
    pub fn results(&self) -> &[ScanResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.results.len() >= self.max_results
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    pub fn clear(&mut self) {
        self.results.clear();
        self.seen.clear();
    }
}

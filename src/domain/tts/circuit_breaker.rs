//! Consecutive-failure counters per provider
//!
//! A provider is skipped once it has failed `threshold` jobs in a row; any
//! success resets its counter. Counters live for the lifetime of the worker
//! process and are shared by all jobs. There is no cooldown: an open circuit
//! stays open until the process restarts.

use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};

pub const CIRCUIT_BREAKER_THRESHOLD: u32 = 3;

pub struct CircuitBreaker {
    failures: DashMap<String, AtomicU32>,
    threshold: u32,
}

impl CircuitBreaker {
    pub fn new(threshold: u32) -> Self {
        Self {
            failures: DashMap::new(),
            threshold,
        }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Whether the provider has tripped the breaker
    pub fn is_open(&self, provider: &str) -> bool {
        self.failure_count(provider) >= self.threshold
    }

    pub fn failure_count(&self, provider: &str) -> u32 {
        self.failures
            .get(provider)
            .map(|count| count.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Count one more consecutive failure, returning the new total
    pub fn record_failure(&self, provider: &str) -> u32 {
        let count = self
            .failures
            .entry(provider.to_string())
            .or_insert_with(|| AtomicU32::new(0));
        count.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record_success(&self, provider: &str) {
        if let Some(count) = self.failures.get(provider) {
            count.store(0, Ordering::Relaxed);
        }
    }

    /// Snapshot of all counters, for health reporting
    pub fn snapshot(&self) -> BTreeMap<String, u32> {
        self.failures
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().load(Ordering::Relaxed)))
            .collect()
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CIRCUIT_BREAKER_THRESHOLD)
    }
}

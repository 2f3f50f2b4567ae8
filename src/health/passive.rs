//! Passive health checking (failure detection).
//!
//! # Responsibilities
//! - Observe request outcomes
//! - Track the error rate over a sliding window
//! - Eject the backend for a cooldown when the rate crosses the limit
//!
//! # Design Decisions
//! - Only connection errors and 502/503/504 count as failures
//! - 4xx are NOT failures (client error, not backend)
//! - `is_alive` reads a single atomic deadline; the window lock is only
//!   taken when recording

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::config::PassiveHealthConfig;
use crate::health::checker::{HealthChecker, Outcome};

/// Error-rate based liveness for one backend.
#[derive(Debug)]
pub struct PassiveHealth {
    window: Mutex<VecDeque<Outcome>>,
    capacity: usize,
    min_requests: usize,
    max_error_rate: f64,
    cooldown: Duration,
    /// Reference point for `ejected_until_ms`.
    epoch: Instant,
    /// Milliseconds since `epoch` until which the backend is ejected.
    ejected_until_ms: AtomicU64,
}

impl PassiveHealth {
    pub fn new(config: &PassiveHealthConfig) -> Self {
        let capacity = config.window.max(1);
        Self {
            window: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            min_requests: config.min_requests.clamp(1, capacity),
            max_error_rate: config.max_error_rate,
            cooldown: Duration::from_secs(config.cooldown_secs),
            epoch: Instant::now(),
            ejected_until_ms: AtomicU64::new(0),
        }
    }

    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    fn is_ejected(&self) -> bool {
        self.now_ms() < self.ejected_until_ms.load(Ordering::Acquire)
    }

    /// Current failure ratio over the recorded window.
    pub fn error_rate(&self) -> f64 {
        let window = match self.window.lock() {
            Ok(window) => window,
            Err(poisoned) => poisoned.into_inner(),
        };
        if window.is_empty() {
            return 0.0;
        }
        let failures = window.iter().filter(|o| **o == Outcome::Failure).count();
        failures as f64 / window.len() as f64
    }
}

impl HealthChecker for PassiveHealth {
    fn is_alive(&self) -> bool {
        !self.is_ejected()
    }

    fn record(&self, outcome: Outcome) {
        // Stragglers that finish while ejected don't count towards the next window.
        if self.is_ejected() {
            return;
        }

        let mut window = match self.window.lock() {
            Ok(window) => window,
            Err(poisoned) => poisoned.into_inner(),
        };
        if window.len() == self.capacity {
            window.pop_front();
        }
        window.push_back(outcome);

        if window.len() < self.min_requests {
            return;
        }
        let failures = window.iter().filter(|o| **o == Outcome::Failure).count();
        let rate = failures as f64 / window.len() as f64;
        if rate >= self.max_error_rate {
            window.clear();
            let cooldown_ms = u64::try_from(self.cooldown.as_millis()).unwrap_or(u64::MAX);
            let until = self.now_ms().saturating_add(cooldown_ms);
            self.ejected_until_ms.store(until, Ordering::Release);
            tracing::warn!(
                error_rate = rate,
                cooldown_secs = self.cooldown.as_secs(),
                "Backend ejected by passive health check"
            );
        }
    }
}

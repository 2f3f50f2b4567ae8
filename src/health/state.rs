//! Backend health state machine.
//!
//! # States
//! - Unknown: no probe has completed yet; backend receives traffic
//! - Healthy: backend receives traffic
//! - Unhealthy: backend excluded from load balancing
//!
//! # State Transitions
//! ```text
//! Unknown/Unhealthy → Healthy: consecutive successes >= healthy_threshold
//! Unknown/Healthy → Unhealthy: consecutive failures >= unhealthy_threshold
//! ```
//!
//! # Design Decisions
//! - Hysteresis prevents flapping
//! - Transitions are reported to the caller so they can be logged
//! - Counters reset when the opposite outcome is observed

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use crate::health::checker::HealthChecker;

/// Health State enum.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Unknown = 0,
    Healthy = 1,
    Unhealthy = 2,
}

impl From<u8> for HealthState {
    fn from(val: u8) -> Self {
        match val {
            1 => HealthState::Healthy,
            2 => HealthState::Unhealthy,
            _ => HealthState::Unknown,
        }
    }
}

/// Cached probe state for one backend, updated by the active monitor.
#[derive(Debug)]
pub struct ActiveHealth {
    state: AtomicU8,
    consecutive_failures: AtomicUsize,
    consecutive_successes: AtomicUsize,
    healthy_threshold: usize,
    unhealthy_threshold: usize,
}

impl ActiveHealth {
    pub fn new(healthy_threshold: u32, unhealthy_threshold: u32) -> Self {
        Self {
            state: AtomicU8::new(HealthState::Unknown as u8),
            consecutive_failures: AtomicUsize::new(0),
            consecutive_successes: AtomicUsize::new(0),
            healthy_threshold: healthy_threshold.max(1) as usize,
            unhealthy_threshold: unhealthy_threshold.max(1) as usize,
        }
    }

    pub fn state(&self) -> HealthState {
        HealthState::from(self.state.load(Ordering::Acquire))
    }

    /// Report a successful probe. Returns the new state on transition.
    pub fn mark_success(&self) -> Option<HealthState> {
        self.consecutive_failures.store(0, Ordering::Relaxed);

        if self.state() == HealthState::Healthy {
            return None;
        }

        let successes = self.consecutive_successes.fetch_add(1, Ordering::Relaxed) + 1;
        if successes >= self.healthy_threshold {
            self.consecutive_successes.store(0, Ordering::Relaxed);
            self.state.store(HealthState::Healthy as u8, Ordering::Release);
            return Some(HealthState::Healthy);
        }
        None
    }

    /// Report a failed probe. Returns the new state on transition.
    pub fn mark_failure(&self) -> Option<HealthState> {
        self.consecutive_successes.store(0, Ordering::Relaxed);

        if self.state() == HealthState::Unhealthy {
            return None;
        }

        let failures = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
        if failures >= self.unhealthy_threshold {
            self.consecutive_failures.store(0, Ordering::Relaxed);
            self.state.store(HealthState::Unhealthy as u8, Ordering::Release);
            return Some(HealthState::Unhealthy);
        }
        None
    }
}

impl HealthChecker for ActiveHealth {
    fn is_alive(&self) -> bool {
        self.state() != HealthState::Unhealthy
    }
}

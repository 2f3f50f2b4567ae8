//! The liveness capability shared by every health model.

use std::fmt;

use axum::http::StatusCode;

/// Result of one forward attempt, as seen by a health checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    /// Classify an upstream status.
    ///
    /// Only gateway-class 5xx responses count against the backend; 4xx are
    /// client errors and other 5xx are application errors.
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
                Outcome::Failure
            }
            _ => Outcome::Success,
        }
    }
}

/// Answers whether a backend should receive traffic.
///
/// `is_alive` must be a cheap read of cached state: it is called on the
/// selection path and must never perform I/O.
pub trait HealthChecker: Send + Sync + fmt::Debug {
    fn is_alive(&self) -> bool;

    /// Observe the outcome of a request proxied to this backend.
    fn record(&self, _outcome: Outcome) {}
}

/// Fixed liveness answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticHealth {
    alive: bool,
}

impl StaticHealth {
    pub fn alive() -> Self {
        Self { alive: true }
    }

    pub fn down() -> Self {
        Self { alive: false }
    }
}

impl Default for StaticHealth {
    fn default() -> Self {
        Self::alive()
    }
}

impl HealthChecker for StaticHealth {
    fn is_alive(&self) -> bool {
        self.alive
    }
}

//! Round-robin load balancing strategy.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::load_balancer::backend::Backend;

/// Why no backend could be selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SelectError {
    #[error("backend list is empty")]
    NoBackends,
    #[error("all {0} backends are down")]
    AllBackendsDown(usize),
}

impl IntoResponse for SelectError {
    fn into_response(self) -> Response {
        (StatusCode::SERVICE_UNAVAILABLE, "No live backends").into_response()
    }
}

/// Round-robin selector.
///
/// The cursor always holds the index the next scan starts from, in
/// `[0, len)`. A selection scans at most one full pass and then moves the
/// cursor one past the chosen backend with a compare-and-swap, so
/// concurrent selections never start from the same position.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the next selection starts scanning from.
    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }

    /// Pick the index of the next live backend.
    pub fn next_index(&self, backends: &[Arc<Backend>]) -> Result<usize, SelectError> {
        let len = backends.len();
        if len == 0 {
            return Err(SelectError::NoBackends);
        }

        let mut start = self.cursor.load(Ordering::Acquire);
        loop {
            let chosen = (0..len)
                .map(|offset| (start + offset) % len)
                .find(|&index| backends[index].is_alive())
                .ok_or(SelectError::AllBackendsDown(len))?;

            let next = (chosen + 1) % len;
            match self
                .cursor
                .compare_exchange_weak(start, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return Ok(chosen),
                Err(current) => start = current,
            }
        }
    }

    /// Pick the next live backend.
    pub fn next_server(&self, backends: &[Arc<Backend>]) -> Result<Arc<Backend>, SelectError> {
        self.next_index(backends).map(|index| backends[index].clone())
    }
}

//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     BackendList + HealthCheckConfig
//!         → pool.rs (build backends, attach health checkers)
//!         → dispatcher.rs (owns ordered backends + rotation)
//!
//! Per request:
//!     dispatcher.rs
//!         → round_robin.rs (next live backend, one pass at most)
//!         → backend.rs (forward upstream, record outcome)
//!         → response or 502/503
//! ```
//!
//! # Design Decisions
//! - Backend list is fixed for the process lifetime
//! - Rotation cursor is a lock-free atomic; selection is linearizable
//! - Unhealthy backends excluded from selection
//! - No retry or failover once a backend is chosen

pub mod backend;
pub mod dispatcher;
pub mod pool;
pub mod round_robin;

pub use backend::{Backend, BackendError};
pub use dispatcher::Dispatcher;
pub use pool::BackendPool;
pub use round_robin::{RoundRobin, SelectError};

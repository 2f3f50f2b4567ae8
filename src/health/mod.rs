//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Selection path:
//!     round robin → Backend::is_alive → HealthChecker::is_alive (cached read)
//!
//! Static checks (checker.rs):
//!     Fixed answer, always alive by default
//!
//! Active health checks (active.rs):
//!     Periodic timer
//!     → Probe each backend
//!     → Update state.rs
//!
//! Passive health checks (passive.rs):
//!     Forward outcome observed
//!     → Sliding window error rate
//!     → Eject for a cooldown if the limit is exceeded
//! ```
//!
//! # Design Decisions
//! - Liveness is a pure read; no health model does I/O inside `is_alive`
//! - State transitions require consecutive successes/failures
//! - Health state is per-backend, not per-pool

pub mod active;
pub mod checker;
pub mod passive;
pub mod state;

pub use active::HealthMonitor;
pub use checker::{HealthChecker, Outcome, StaticHealth};
pub use passive::PassiveHealth;
pub use state::{ActiveHealth, HealthState};

//! Observability subsystem.
//!
//! Logging only: every dispatch, health transition and fatal error is
//! emitted as a `tracing` event and rendered by `logging.rs`.

pub mod logging;

//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, catch-all route)
//!     → [dispatcher picks the next live backend]
//!     → proxy.rs (rewrite destination, strip hop-by-hop headers)
//!     → client.rs (shared HTTP/HTTPS upstream client)
//!     → proxy.rs (response passthrough)
//!     → Send to client
//! ```

pub mod client;
pub mod proxy;
pub mod server;

pub use client::{build_client, HttpClient};
pub use proxy::ForwardError;
pub use server::HttpServer;

//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single upstream server
//! - Report liveness from its health checker (cached, no I/O)
//! - Forward a request to the upstream and stream the response back
//! - Feed forward outcomes to the health checker

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use url::Url;

use crate::config::validation::parse_backend_address;
use crate::health::{HealthChecker, Outcome, StaticHealth};
use crate::http::client::HttpClient;
use crate::http::proxy::{rewrite_request, rewrite_response, ForwardError};

/// A backend address that could not be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed backend address {address:?}: {reason}")]
pub struct BackendError {
    pub address: String,
    pub reason: String,
}

/// Parse a configured backend address into its base URL.
pub fn parse_address(address: &str) -> Result<Url, BackendError> {
    parse_backend_address(address).map_err(|reason| BackendError {
        address: address.to_string(),
        reason,
    })
}

/// A single upstream server.
pub struct Backend {
    /// The address as configured, used for logging.
    address: String,
    /// Parsed base URL requests are rewritten against.
    url: Url,
    health: Arc<dyn HealthChecker>,
    /// Replace the client's `Host` with the backend authority.
    rewrite_host: bool,
}

impl Backend {
    /// Create a backend, parsing its address.
    pub fn new(address: &str, health: Arc<dyn HealthChecker>) -> Result<Self, BackendError> {
        let url = parse_address(address)?;
        Ok(Self::with_url(address, url, health))
    }

    /// Create a backend whose liveness never changes.
    pub fn always_alive(address: &str) -> Result<Self, BackendError> {
        Self::new(address, Arc::new(StaticHealth::alive()))
    }

    pub fn with_url(address: &str, url: Url, health: Arc<dyn HealthChecker>) -> Self {
        Self {
            address: address.to_string(),
            url,
            health,
            rewrite_host: false,
        }
    }

    pub fn with_host_rewrite(mut self, rewrite_host: bool) -> Self {
        self.rewrite_host = rewrite_host;
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn is_alive(&self) -> bool {
        self.health.is_alive()
    }

    /// Proxy `request` to this backend.
    ///
    /// Upstream failures are returned, not retried.
    pub async fn forward(
        &self,
        client: &HttpClient,
        request: Request<Body>,
        peer: Option<SocketAddr>,
    ) -> Result<Response<Body>, ForwardError> {
        let request = rewrite_request(&self.url, request, peer, self.rewrite_host)?;

        match client.request(request).await {
            Ok(response) => {
                self.health.record(Outcome::from_status(response.status()));
                Ok(rewrite_response(response))
            }
            Err(e) => {
                self.health.record(Outcome::Failure);
                Err(e.into())
            }
        }
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("address", &self.address)
            .field("alive", &self.is_alive())
            .field("rewrite_host", &self.rewrite_host)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PassiveHealthConfig;
    use crate::health::PassiveHealth;
    use crate::http::client::build_client;

    #[test]
    fn keeps_configured_address() {
        let backend = Backend::always_alive("https://www.google.com/search").unwrap();
        assert_eq!(backend.address(), "https://www.google.com/search");
        assert_eq!(backend.url().path(), "/search");
        assert!(backend.is_alive());
    }

    #[test]
    fn rejects_malformed_address() {
        let err = Backend::always_alive("://nope").unwrap_err();
        assert_eq!(err.address, "://nope");
    }

    #[tokio::test]
    async fn connection_failure_is_recorded() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let health = Arc::new(PassiveHealth::new(&PassiveHealthConfig {
            window: 1,
            min_requests: 1,
            max_error_rate: 1.0,
            cooldown_secs: 60,
        }));
        let backend = Backend::new(&format!("http://{addr}"), health).unwrap();

        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let result = backend.forward(&build_client(), request, None).await;

        assert!(matches!(result, Err(ForwardError::Upstream(_))));
        assert!(!backend.is_alive());
    }
}

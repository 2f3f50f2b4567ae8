//! Request dispatch: pick the next backend and forward to it.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::response::{IntoResponse, Response};

use crate::http::client::HttpClient;
use crate::load_balancer::backend::Backend;
use crate::load_balancer::round_robin::{RoundRobin, SelectError};

/// Holds the ordered backend list and the rotation state.
#[derive(Debug)]
pub struct Dispatcher {
    backends: Vec<Arc<Backend>>,
    balancer: RoundRobin,
    client: HttpClient,
}

impl Dispatcher {
    pub fn new(backends: Vec<Arc<Backend>>, client: HttpClient) -> Self {
        Self {
            backends,
            balancer: RoundRobin::new(),
            client,
        }
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Position the next selection starts from.
    pub fn cursor(&self) -> usize {
        self.balancer.cursor()
    }

    pub fn select_next(&self) -> Result<Arc<Backend>, SelectError> {
        self.balancer.next_server(&self.backends)
    }

    /// Forward one request to the next live backend.
    ///
    /// Never fails: selection errors become 503 and upstream errors 502.
    pub async fn dispatch(&self, request: Request<Body>, peer: Option<SocketAddr>) -> Response {
        let backend = match self.select_next() {
            Ok(backend) => backend,
            Err(e) => {
                tracing::warn!(error = %e, method = %request.method(), path = %request.uri().path(), "No backend available");
                return e.into_response();
            }
        };

        tracing::info!(backend = %backend.address(), "forwarding request to address");

        match backend.forward(&self.client, request, peer).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(backend = %backend.address(), error = %e, "proxy error");
                e.into_response()
            }
        }
    }
}

//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe backends
//! - Update cached backend health state based on results

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request};
use tokio::sync::broadcast;
use tokio::time;
use url::Url;

use crate::config::HealthCheckConfig;
use crate::health::state::{ActiveHealth, HealthState};
use crate::http::client::HttpClient;
use crate::http::proxy::join_path;

/// One backend under active monitoring.
#[derive(Debug)]
struct ProbeTarget {
    address: String,
    probe_url: Url,
    health: Arc<ActiveHealth>,
}

pub struct HealthMonitor {
    targets: Vec<ProbeTarget>,
    config: HealthCheckConfig,
    client: HttpClient,
}

impl HealthMonitor {
    pub fn new(config: HealthCheckConfig, client: HttpClient) -> Self {
        Self {
            targets: Vec::new(),
            config,
            client,
        }
    }

    /// Start monitoring a backend and return the state handle its
    /// liveness is read from.
    pub fn watch(&mut self, address: &str, base_url: &Url) -> Arc<ActiveHealth> {
        let health = Arc::new(ActiveHealth::new(
            self.config.healthy_threshold,
            self.config.unhealthy_threshold,
        ));

        let mut probe_url = base_url.clone();
        probe_url.set_path(&join_path(base_url.path(), &self.config.path));

        self.targets.push(ProbeTarget {
            address: address.to_string(),
            probe_url,
            health: health.clone(),
        });
        health
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval = self.config.interval_secs,
            path = %self.config.path,
            backends = self.targets.len(),
            "Health monitor starting"
        );

        let mut ticker = time::interval(Duration::from_secs(self.config.interval_secs));

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.check_all().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Probe every watched backend once.
    pub async fn check_all(&self) {
        for target in &self.targets {
            let healthy = self.probe(target).await;

            let transition = if healthy {
                target.health.mark_success()
            } else {
                target.health.mark_failure()
            };

            match transition {
                Some(HealthState::Healthy) => {
                    tracing::info!(backend = %target.address, "Backend marked healthy")
                }
                Some(HealthState::Unhealthy) => {
                    tracing::warn!(backend = %target.address, "Backend marked unhealthy")
                }
                _ => {}
            }
        }
    }

    async fn probe(&self, target: &ProbeTarget) -> bool {
        let request = match Request::builder()
            .method(Method::GET)
            .uri(target.probe_url.as_str())
            .header(header::USER_AGENT, "roundrobin-proxy-health-check")
            .body(Body::empty())
        {
            Ok(req) => req,
            Err(e) => {
                tracing::error!(backend = %target.address, error = %e, "Failed to build health check request");
                return false;
            }
        };

        let timeout = Duration::from_secs(self.config.timeout_secs);
        match time::timeout(timeout, self.client.request(request)).await {
            Ok(Ok(response)) => {
                let success = response.status().is_success();
                if !success {
                    tracing::debug!(backend = %target.address, status = %response.status(), "Health check failed: non-success status");
                }
                success
            }
            Ok(Err(e)) => {
                tracing::debug!(backend = %target.address, error = %e, "Health check failed: connection error");
                false
            }
            Err(_) => {
                tracing::debug!(backend = %target.address, "Health check failed: timeout");
                false
            }
        }
    }
}

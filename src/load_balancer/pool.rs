//! Backend pool construction.
//!
//! # Responsibilities
//! - Turn the configured backend list into `Backend`s, in order
//! - Attach the configured health model to each backend
//! - Hand active-mode backends to a `HealthMonitor`

use std::sync::Arc;

use crate::config::{BackendList, HealthCheckConfig, HealthMode};
use crate::health::{HealthChecker, HealthMonitor, PassiveHealth, StaticHealth};
use crate::http::client::HttpClient;
use crate::load_balancer::backend::{parse_address, Backend, BackendError};

/// Backends built from configuration, plus the monitor probing them.
pub struct BackendPool {
    backends: Vec<Arc<Backend>>,
    monitor: Option<HealthMonitor>,
}

impl BackendPool {
    /// Build the pool. Fails on the first malformed address.
    pub fn from_config(
        configs: &BackendList,
        health: &HealthCheckConfig,
        client: &HttpClient,
    ) -> Result<Self, BackendError> {
        let mut monitor = HealthMonitor::new(health.clone(), client.clone());
        let mut backends = Vec::with_capacity(configs.len());

        for config in configs.iter() {
            let url = parse_address(&config.address)?;
            let checker: Arc<dyn HealthChecker> = match health.mode {
                HealthMode::Static => Arc::new(StaticHealth::alive()),
                HealthMode::Active => monitor.watch(&config.address, &url),
                HealthMode::Passive => Arc::new(PassiveHealth::new(&health.passive)),
            };

            tracing::debug!(
                backend = %config.address,
                mode = ?health.mode,
                rewrite_host = config.rewrite_host,
                "Backend registered"
            );
            let backend = Backend::with_url(&config.address, url, checker).with_host_rewrite(config.rewrite_host);
            backends.push(Arc::new(backend));
        }

        Ok(Self {
            backends,
            monitor: (!monitor.is_empty()).then_some(monitor),
        })
    }

    pub fn backends(&self) -> &[Arc<Backend>] {
        &self.backends
    }

    pub fn has_monitor(&self) -> bool {
        self.monitor.is_some()
    }

    pub fn into_parts(self) -> (Vec<Arc<Backend>>, Option<HealthMonitor>) {
        (self.backends, self.monitor)
    }
}

//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the balancer.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the load balancer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BalancerConfig {
    /// Listener configuration (host and port).
    pub listener: ListenerConfig,

    /// Ordered backend list. Rotation follows this order.
    pub backends: BackendList,

    /// Liveness model for the backends.
    pub health_check: HealthCheckConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// Port to listen on.
    pub port: u16,
}

impl ListenerConfig {
    /// Socket address string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Backend server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Upstream base URL (e.g., "http://127.0.0.1:3000" or "https://example.com/api").
    pub address: String,

    /// Send the backend's own authority as `Host` instead of the client's.
    #[serde(default)]
    pub rewrite_host: bool,
}

impl BackendConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            rewrite_host: false,
        }
    }

    pub fn with_host_rewrite(mut self, rewrite_host: bool) -> Self {
        self.rewrite_host = rewrite_host;
        self
    }
}

/// Ordered list of backends, defaulting to the stock example upstreams.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct BackendList(pub Vec<BackendConfig>);

impl Default for BackendList {
    fn default() -> Self {
        Self(
            [
                "https://www.facebook.com",
                "https://www.google.com/search",
                "https://www.amazon.com",
            ]
            .into_iter()
            .map(BackendConfig::new)
            .collect(),
        )
    }
}

impl BackendList {
    pub fn iter(&self) -> std::slice::Iter<'_, BackendConfig> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<BackendConfig>> for BackendList {
    fn from(backends: Vec<BackendConfig>) -> Self {
        Self(backends)
    }
}

/// How backend liveness is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthMode {
    /// Every backend is always considered alive.
    #[default]
    Static,
    /// Periodic HTTP probes update a cached state.
    Active,
    /// Liveness derived from recent proxy error rate.
    Passive,
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Liveness model.
    pub mode: HealthMode,

    /// Probe interval in seconds (active mode).
    pub interval_secs: u64,

    /// Probe timeout in seconds (active mode).
    pub timeout_secs: u64,

    /// Path appended to the backend base URL when probing.
    pub path: String,

    /// Number of consecutive successes before marking healthy.
    pub healthy_threshold: u32,

    /// Number of consecutive failures before marking unhealthy.
    pub unhealthy_threshold: u32,

    /// Passive ejection settings.
    pub passive: PassiveHealthConfig,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            mode: HealthMode::Static,
            interval_secs: 10,
            timeout_secs: 5,
            path: "/".to_string(),
            healthy_threshold: 2,
            unhealthy_threshold: 3,
            passive: PassiveHealthConfig::default(),
        }
    }
}

/// Passive health configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PassiveHealthConfig {
    /// Number of most recent outcomes kept per backend.
    pub window: usize,

    /// Outcomes required before the error rate is evaluated.
    pub min_requests: usize,

    /// Failure ratio (0.0..=1.0) at which a backend is ejected.
    pub max_error_rate: f64,

    /// How long an ejected backend stays out of rotation.
    pub cooldown_secs: u64,
}

impl Default for PassiveHealthConfig {
    fn default() -> Self {
        Self {
            window: 20,
            min_requests: 5,
            max_error_rate: 0.5,
            cooldown_secs: 30,
        }
    }
}

//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check every backend address is an absolute http(s) URL
//! - Validate value ranges (thresholds > 0, error rate in (0, 1])
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BalancerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use url::Url;

use crate::config::schema::{BalancerConfig, HealthCheckConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("at least one backend is required")]
    NoBackends,
    #[error("backend #{index} has invalid address {address:?}: {reason}")]
    InvalidBackend {
        index: usize,
        address: String,
        reason: String,
    },
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
    #[error("health_check.passive.min_requests ({min_requests}) exceeds window ({window})")]
    MinRequestsExceedsWindow { min_requests: usize, window: usize },
    #[error("health_check.passive.max_error_rate must be in (0, 1], got {0}")]
    ErrorRateOutOfRange(f64),
}

/// Validate a backend address, returning the parsed URL.
pub fn parse_backend_address(address: &str) -> Result<Url, String> {
    let url = Url::parse(address).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(format!("unsupported scheme {other:?}")),
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err("missing host".to_string());
    }
    Ok(url)
}

/// Check the whole configuration, collecting every problem found.
pub fn validate_config(config: &BalancerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.backends.is_empty() {
        errors.push(ValidationError::NoBackends);
    }
    for (index, backend) in config.backends.iter().enumerate() {
        if let Err(reason) = parse_backend_address(&backend.address) {
            errors.push(ValidationError::InvalidBackend {
                index,
                address: backend.address.clone(),
                reason,
            });
        }
    }

    validate_health(&config.health_check, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_health(health: &HealthCheckConfig, errors: &mut Vec<ValidationError>) {
    let counts = [
        ("health_check.interval_secs", health.interval_secs),
        ("health_check.timeout_secs", health.timeout_secs),
        ("health_check.healthy_threshold", u64::from(health.healthy_threshold)),
        ("health_check.unhealthy_threshold", u64::from(health.unhealthy_threshold)),
        ("health_check.passive.window", health.passive.window as u64),
        ("health_check.passive.min_requests", health.passive.min_requests as u64),
    ];
    for (field, value) in counts {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }

    let passive = &health.passive;
    if passive.min_requests > passive.window {
        errors.push(ValidationError::MinRequestsExceedsWindow {
            min_requests: passive.min_requests,
            window: passive.window,
        });
    }
    if !(passive.max_error_rate > 0.0 && passive.max_error_rate <= 1.0) {
        errors.push(ValidationError::ErrorRateOutOfRange(passive.max_error_rate));
    }
}

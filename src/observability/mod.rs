//! # Observability Infrastructure
//!
//! Structured logging and metrics for the credential provider.
//!
//! Metrics are emitted through the `metrics` facade and are no-ops until the
//! host application installs a recorder:
//!
//! - `credential_refresh_total{outcome="fresh|stale|failed"}`: refresh attempts
//! - `credential_refresh_shared_total{outcome}`: waiters that reused a
//!   refresh completed while they queued
//! - `credential_cache_hits_total`: requests answered from the cache

pub mod logging;

pub use logging::{init_logging, log_config_info};

use crate::config::ObservabilityConfig;
use crate::errors::Result;
use ::tracing::info;

/// Initialize logging and report the active configuration
pub fn init_observability(config: &ObservabilityConfig) -> Result<()> {
    init_logging(config)?;

    info!(
        service_name = %config.service_name,
        log_level = %config.log_level,
        json_logging = config.json_logging,
        "Observability initialized successfully"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::errors::CredentialError;

    #[test]
    fn test_init_observability_reports_installed_subscriber() {
        let config = ObservabilityConfig::default();
        // Whichever call installs the subscriber, this one must find it taken
        let _ = init_logging(&config);

        let err = init_observability(&config).unwrap_err();
        assert!(matches!(err, CredentialError::Config { .. }));
        assert!(err.to_string().contains("Failed to initialize logging"));
    }

    #[test]
    fn test_init_observability_validates_config() {
        let config = ObservabilityConfig {
            service_name: String::new(),
            ..Default::default()
        };
        let err = init_observability(&config).unwrap_err();
        assert!(err.to_string().contains("Service name cannot be empty"));
    }
}

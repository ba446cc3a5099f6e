//! # Structured Logging
//!
//! Subscriber setup and span macros for the credential provider.
//!
//! Log output is plain text by default and JSON when
//! [`ObservabilityConfig::json_logging`] is set. `RUST_LOG` takes precedence
//! over the configured level. Secret values never reach log output: every
//! field that carries one goes through [`SecretString`](crate::secrets::SecretString),
//! which formats as `[REDACTED]`.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{ObservabilityConfig, ProviderConfig};
use crate::errors::{CredentialError, Result};

/// Create a tracing span for credential store operations.
///
/// ```rust,ignore
/// let span = credential_span!("refresh", "memory");
/// let span = credential_span!("refresh", "memory", secret_id = "/prod/datadog/API_KEY");
/// ```
#[macro_export]
macro_rules! credential_span {
    ($operation:expr, $store:expr) => {
        tracing::info_span!(
            "credential_operation",
            operation = %$operation,
            store = %$store,
            operation_id = %uuid::Uuid::new_v4()
        )
    };
    ($operation:expr, $store:expr, $($field:tt)*) => {
        tracing::info_span!(
            "credential_operation",
            operation = %$operation,
            store = %$store,
            operation_id = %uuid::Uuid::new_v4(),
            $($field)*
        )
    };
}

fn env_filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
}

/// Install the global tracing subscriber.
///
/// Fails with a configuration error when the config is invalid or a
/// subscriber is already installed.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    config.validate()?;
    let registry = tracing_subscriber::registry().with(env_filter(config));

    let installed = if config.json_logging {
        registry
            .with(fmt::layer().json().with_current_span(true).with_target(true))
            .try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };

    installed.map_err(|e| CredentialError::config(format!("Failed to initialize logging: {}", e)))
}

/// Log the resolved provider configuration at startup
pub fn log_config_info(config: &ProviderConfig) {
    tracing::info!(
        mode = config.mode(),
        api_key_secret = %config.api_key_secret,
        app_key_secret = %config.app_key_secret,
        region = %config.region,
        profile = %config.profile,
        role_arn = ?config.role_arn,
        cache_ttl_secs = config.cache_ttl_seconds,
        fallback_policy = %config.fallback_policy,
        "Datadog credential provider configuration"
    );
}

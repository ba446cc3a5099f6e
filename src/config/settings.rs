//! # Configuration Settings
//!
//! Defines the configuration structures for the credential provider and logging.

use crate::errors::{CredentialError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use validator::Validate;

/// Default secret holding the Datadog API key
pub const DEFAULT_API_KEY_SECRET: &str = "/DEVELOPMENT/datadog/API_KEY";

/// Default secret holding the Datadog application key
pub const DEFAULT_APP_KEY_SECRET: &str = "/DEVELOPMENT/datadog/APP_KEY";

pub const DEFAULT_REGION: &str = "us-west-2";

pub const DEFAULT_PROFILE: &str = "default";

/// Default cache TTL (50 minutes)
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 3000;

/// Lead time before hard expiry during which the cache is refreshed on next access
pub const REFRESH_BUFFER: Duration = Duration::from_secs(600);

/// Which fetch failures may be answered with a stale-but-valid record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Only store outages fall back; missing or malformed secrets always surface
    #[default]
    TransientOnly,
    /// Every fetch failure falls back while a valid record exists
    AnyError,
}

impl FallbackPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TransientOnly => "transient",
            Self::AnyError => "any",
        }
    }

    /// Whether a stale record may stand in for the given failure
    pub fn allows(&self, error: &CredentialError) -> bool {
        match self {
            Self::TransientOnly => error.is_transient(),
            Self::AnyError => true,
        }
    }
}

impl FromStr for FallbackPolicy {
    type Err = CredentialError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "transient" | "transient_only" => Ok(Self::TransientOnly),
            "any" | "any_error" => Ok(Self::AnyError),
            other => Err(CredentialError::config(format!(
                "Unknown fallback policy '{}' (expected 'transient' or 'any')",
                other
            ))),
        }
    }
}

impl fmt::Display for FallbackPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Construction-time configuration of a credential provider
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct ProviderConfig {
    /// Secret identifier for the primary (API) key
    pub api_key_secret: String,

    /// Secret identifier for the secondary (application) key; equal to
    /// `api_key_secret` for a combined JSON secret
    pub app_key_secret: String,

    #[validate(length(min = 1, message = "Region cannot be empty"))]
    pub region: String,

    /// Identity/profile selector for the ambient credential chain
    #[validate(length(min = 1, message = "Profile cannot be empty"))]
    pub profile: String,

    /// Role to assume before reading secrets
    pub role_arn: Option<String>,

    #[validate(range(min = 1, message = "Cache TTL must be at least 1 second"))]
    pub cache_ttl_seconds: u64,

    #[serde(default)]
    pub fallback_policy: FallbackPolicy,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key_secret: DEFAULT_API_KEY_SECRET.to_string(),
            app_key_secret: DEFAULT_APP_KEY_SECRET.to_string(),
            region: DEFAULT_REGION.to_string(),
            profile: DEFAULT_PROFILE.to_string(),
            role_arn: None,
            cache_ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
            fallback_policy: FallbackPolicy::default(),
        }
    }
}

impl ProviderConfig {
    /// Config for a pair of separate secrets with defaults elsewhere
    pub fn separate(api_key_secret: impl Into<String>, app_key_secret: impl Into<String>) -> Self {
        Self {
            api_key_secret: api_key_secret.into(),
            app_key_secret: app_key_secret.into(),
            ..Default::default()
        }
    }

    /// Config for one JSON secret holding both keys
    pub fn combined(secret_id: impl Into<String>) -> Self {
        let secret_id = secret_id.into();
        Self {
            api_key_secret: secret_id.clone(),
            app_key_secret: secret_id,
            ..Default::default()
        }
    }

    pub fn with_ttl_seconds(mut self, seconds: u64) -> Self {
        self.cache_ttl_seconds = seconds;
        self
    }

    pub fn with_role_arn(mut self, role_arn: impl Into<String>) -> Self {
        self.role_arn = Some(role_arn.into());
        self
    }

    pub fn with_fallback_policy(mut self, policy: FallbackPolicy) -> Self {
        self.fallback_policy = policy;
        self
    }

    /// Create configuration from environment variables
    ///
    /// Every value has a default so an empty environment yields a usable
    /// configuration. A variable set to the empty string stays empty.
    pub fn from_env() -> Result<Self> {
        let api_key_secret = std::env::var("AWS_SECRET_API_KEY")
            .unwrap_or_else(|_| DEFAULT_API_KEY_SECRET.to_string());

        let app_key_secret = std::env::var("AWS_SECRET_APP_KEY")
            .unwrap_or_else(|_| DEFAULT_APP_KEY_SECRET.to_string());

        let region = std::env::var("AWS_REGION").unwrap_or_else(|_| DEFAULT_REGION.to_string());

        let profile = std::env::var("AWS_PROFILE").unwrap_or_else(|_| DEFAULT_PROFILE.to_string());

        let role_arn = std::env::var("AWS_ROLE_ARN")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let cache_ttl_seconds = match std::env::var("SECRET_CACHE_TTL") {
            Ok(raw) => raw.trim().parse::<u64>().map_err(|e| {
                CredentialError::config(format!("Invalid SECRET_CACHE_TTL '{}': {}", raw, e))
            })?,
            Err(_) => DEFAULT_CACHE_TTL_SECONDS,
        };

        let fallback_policy = match std::env::var("SECRET_FALLBACK_POLICY") {
            Ok(raw) => raw.parse()?,
            Err(_) => FallbackPolicy::default(),
        };

        let config = Self {
            api_key_secret,
            app_key_secret,
            region,
            profile,
            role_arn,
            cache_ttl_seconds,
            fallback_policy,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(CredentialError::from)
    }

    /// Both identifiers are present; otherwise the store is unusable
    pub fn is_configured(&self) -> bool {
        !self.api_key_secret.trim().is_empty() && !self.app_key_secret.trim().is_empty()
    }

    /// Both keys live in one JSON secret
    pub fn is_combined(&self) -> bool {
        self.api_key_secret == self.app_key_secret
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    pub fn mode(&self) -> &'static str {
        if self.is_combined() {
            "combined"
        } else {
            "separate"
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ObservabilityConfig {
    /// Service name attached to log output
    #[validate(length(min = 1, message = "Service name cannot be empty"))]
    pub service_name: String,

    /// Log level (trace, debug, info, warn, error); `RUST_LOG` takes precedence
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: env!("CARGO_PKG_NAME").to_string(),
            log_level: "info".to_string(),
            json_logging: false,
        }
    }
}

impl ObservabilityConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let log_level = std::env::var("DD_SECRETS_LOG_LEVEL").unwrap_or(defaults.log_level);

        let json_logging = std::env::var("DD_SECRETS_LOG_JSON")
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(defaults.json_logging);

        Self {
            service_name: defaults.service_name,
            log_level,
            json_logging,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(CredentialError::from)
    }
}

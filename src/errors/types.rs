//! # Error Types
//!
//! Error taxonomy for credential fetching, caching and provider lifecycle.

use std::fmt;

/// Result type for credential operations
pub type Result<T> = std::result::Result<T, CredentialError>;

/// Errors raised while resolving credentials from a secret store.
///
/// The variants split into two classes:
/// - transient: [`CredentialError::StoreUnavailable`], eligible for stale-cache fallback
/// - configuration: everything else, which indicates a defect a retry will not fix
#[derive(thiserror::Error, Debug)]
pub enum CredentialError {
    /// Network or authentication failure reaching the secret store
    #[error("Secret store unavailable: {message}")]
    StoreUnavailable {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The identifier does not exist in the store
    #[error("Secret not found: {secret_id}")]
    SecretNotFound { secret_id: String },

    /// The payload could not be turned into a credential value
    #[error("Malformed secret '{secret_id}': {reason}")]
    MalformedSecret { secret_id: String, reason: String },

    /// No usable identifiers or backend; callers should use another credential source
    #[error("Secret store is not configured")]
    NotConfigured,

    /// Invalid configuration value
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Internal failures (refresh task panicked or was cancelled)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Coarse classification used for logging and metrics labels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    StoreUnavailable,
    SecretNotFound,
    MalformedSecret,
    NotConfigured,
    Config,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::StoreUnavailable => write!(f, "store_unavailable"),
            ErrorKind::SecretNotFound => write!(f, "secret_not_found"),
            ErrorKind::MalformedSecret => write!(f, "malformed_secret"),
            ErrorKind::NotConfigured => write!(f, "not_configured"),
            ErrorKind::Config => write!(f, "config"),
            ErrorKind::Internal => write!(f, "internal"),
        }
    }
}

impl CredentialError {
    /// Create a store unavailable error
    pub fn store_unavailable<S: Into<String>>(message: S) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
            source: None,
        }
    }

    /// Create a store unavailable error with source
    pub fn store_unavailable_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a secret not found error
    pub fn secret_not_found<S: Into<String>>(secret_id: S) -> Self {
        Self::SecretNotFound {
            secret_id: secret_id.into(),
        }
    }

    /// Create a malformed secret error
    pub fn malformed<S: Into<String>, R: Into<String>>(secret_id: S, reason: R) -> Self {
        Self::MalformedSecret {
            secret_id: secret_id.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::StoreUnavailable { .. } => ErrorKind::StoreUnavailable,
            Self::SecretNotFound { .. } => ErrorKind::SecretNotFound,
            Self::MalformedSecret { .. } => ErrorKind::MalformedSecret,
            Self::NotConfigured => ErrorKind::NotConfigured,
            Self::Config { .. } => ErrorKind::Config,
            Self::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Whether the failure is an outage rather than a misconfiguration
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::StoreUnavailable { .. })
    }

    /// Copy of this error for another waiter; a boxed source is not carried over
    pub(crate) fn replicate(&self) -> Self {
        match self {
            Self::StoreUnavailable { message, .. } => Self::store_unavailable(message.clone()),
            Self::SecretNotFound { secret_id } => Self::secret_not_found(secret_id.clone()),
            Self::MalformedSecret { secret_id, reason } => {
                Self::malformed(secret_id.clone(), reason.clone())
            }
            Self::NotConfigured => Self::NotConfigured,
            Self::Config { message } => Self::config(message.clone()),
            Self::Internal { message } => Self::internal(message.clone()),
        }
    }

    /// Attach a secret identifier to errors raised before the identifier was known
    pub(crate) fn for_secret(self, secret_id: &str) -> Self {
        match self {
            Self::MalformedSecret {
                secret_id: existing,
                reason,
            } if existing.is_empty() => Self::MalformedSecret {
                secret_id: secret_id.to_string(),
                reason,
            },
            other => other,
        }
    }
}

impl From<validator::ValidationErrors> for CredentialError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .iter()
            .map(|(field, field_errors)| {
                let messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map_or("Invalid value".to_string(), |m| m.to_string())
                    })
                    .collect();
                format!("{}: {}", field, messages.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");

        Self::config(format!("Validation failed: {}", message))
    }
}

//! Secret store trait and payload types
//!
//! Defines the abstract capability the credential provider needs from a
//! remote secret store: read one secret, and optionally exchange the ambient
//! identity for delegated credentials.

use async_trait::async_trait;
use std::fmt;

use super::types::SecretString;
use crate::errors::{CredentialError, Result};

/// Raw secret payload as returned by the store
#[derive(Clone, PartialEq, Eq)]
pub enum SecretPayload {
    Text(String),
    Binary(Vec<u8>),
}

impl SecretPayload {
    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Binary(_))
    }

    /// Decode the payload as text; binary payloads must be UTF-8
    pub fn into_text(self) -> Result<String> {
        match self {
            Self::Text(text) => Ok(text),
            Self::Binary(bytes) => String::from_utf8(bytes).map_err(|e| {
                CredentialError::malformed("", format!("binary payload is not valid UTF-8: {}", e))
            }),
        }
    }
}

impl fmt::Debug for SecretPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "Text([REDACTED; {} bytes])", text.len()),
            Self::Binary(bytes) => write!(f, "Binary([REDACTED; {} bytes])", bytes.len()),
        }
    }
}

impl From<&str> for SecretPayload {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for SecretPayload {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Vec<u8>> for SecretPayload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Binary(bytes)
    }
}

/// Short-lived credentials obtained by assuming a delegated role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegatedCredentials {
    pub access_key_id: String,
    pub secret_access_key: SecretString,
    pub session_token: SecretString,
}

/// Trait for secret stores
///
/// Implementations must be Send + Sync; one instance is owned by a single
/// credential provider and may hold a session that [`SecretStore::release`] drops.
#[async_trait]
pub trait SecretStore: Send + Sync + fmt::Debug {
    /// Fetch the raw payload of one secret
    ///
    /// # Arguments
    /// - `secret_id`: store-specific identifier (path, name or ARN)
    /// - `delegated`: credentials to use instead of the ambient identity
    ///
    /// # Errors
    /// - [`CredentialError::SecretNotFound`] if the identifier does not exist
    /// - [`CredentialError::StoreUnavailable`] for network or auth failures
    async fn get_secret_value(
        &self,
        secret_id: &str,
        delegated: Option<&DelegatedCredentials>,
    ) -> Result<SecretPayload>;

    /// Exchange the ambient identity for credentials of `role_id`
    ///
    /// Stores without role delegation keep the default, which reports a
    /// configuration error.
    async fn assume_role(
        &self,
        role_id: &str,
        _session_name: &str,
    ) -> Result<DelegatedCredentials> {
        Err(CredentialError::config(format!(
            "{} store cannot assume role '{}'",
            self.store_type(),
            role_id
        )))
    }

    /// Drop any held session or connection; the next call recreates it
    async fn release(&self) {}

    /// Short label used in logs
    fn store_type(&self) -> &'static str;
}

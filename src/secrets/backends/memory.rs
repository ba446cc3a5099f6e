//! In-memory secret store.
//!
//! Holds secrets in process memory. Intended for local development and
//! tests: it can inject store failures and latency, and it counts the calls
//! the provider makes so single-flight and caching behaviour can be observed.
//!
//! # Example
//!
//! ```rust
//! use dd_secrets::secrets::backends::InMemorySecretStore;
//!
//! let store = InMemorySecretStore::new()
//!     .with_secret("/dev/datadog/API_KEY", "api-key")
//!     .with_secret("/dev/datadog/APP_KEY", "app-key");
//! assert_eq!(store.fetch_count(), 0);
//! ```

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::errors::{CredentialError, Result};
use crate::secrets::store::{DelegatedCredentials, SecretPayload, SecretStore};
use crate::secrets::types::SecretString;

/// Failure the store reports instead of serving secrets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectedFailure {
    /// Behave like an unreachable store
    Unavailable,
    /// Behave as if no secret exists
    NotFound,
}

/// Secret store backed by a `HashMap`
#[derive(Debug, Default)]
pub struct InMemorySecretStore {
    secrets: RwLock<HashMap<String, SecretPayload>>,
    failure: RwLock<Option<InjectedFailure>>,
    latency: RwLock<Option<Duration>>,
    fetches: AtomicUsize,
    releases: AtomicUsize,
    role_sessions: RwLock<Vec<(String, String)>>,
    delegations_seen: RwLock<Vec<Option<String>>>,
}

impl InMemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(
        self,
        secret_id: impl Into<String>,
        payload: impl Into<SecretPayload>,
    ) -> Self {
        self.insert_secret(secret_id, payload);
        self
    }

    /// Delay every secret read by `latency`
    pub fn with_latency(self, latency: Duration) -> Self {
        *self.latency.write() = Some(latency);
        self
    }

    pub fn insert_secret(&self, secret_id: impl Into<String>, payload: impl Into<SecretPayload>) {
        self.secrets.write().insert(secret_id.into(), payload.into());
    }

    pub fn remove_secret(&self, secret_id: &str) {
        self.secrets.write().remove(secret_id);
    }

    /// Make subsequent calls fail; `None` restores normal service
    pub fn set_failure(&self, failure: Option<InjectedFailure>) {
        *self.failure.write() = failure;
    }

    /// Number of `get_secret_value` calls, including failed ones
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn release_count(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    pub fn assume_role_count(&self) -> usize {
        self.role_sessions.read().len()
    }

    /// `(role_id, session_name)` of every role assumption, in call order
    pub fn role_sessions(&self) -> Vec<(String, String)> {
        self.role_sessions.read().clone()
    }

    /// Access key id of the delegated credentials each read used, in call order
    pub fn delegations_seen(&self) -> Vec<Option<String>> {
        self.delegations_seen.read().clone()
    }

    fn injected_error(&self, secret_id: &str) -> Option<CredentialError> {
        match *self.failure.read() {
            Some(InjectedFailure::Unavailable) => Some(CredentialError::store_unavailable(
                "in-memory store is configured to be unreachable",
            )),
            Some(InjectedFailure::NotFound) => Some(CredentialError::secret_not_found(secret_id)),
            None => None,
        }
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn get_secret_value(
        &self,
        secret_id: &str,
        delegated: Option<&DelegatedCredentials>,
    ) -> Result<SecretPayload> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.delegations_seen.write().push(delegated.map(|d| d.access_key_id.clone()));

        let latency = *self.latency.read();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if let Some(err) = self.injected_error(secret_id) {
            return Err(err);
        }

        self.secrets
            .read()
            .get(secret_id)
            .cloned()
            .ok_or_else(|| CredentialError::secret_not_found(secret_id))
    }

    async fn assume_role(&self, role_id: &str, session_name: &str) -> Result<DelegatedCredentials> {
        if *self.failure.read() == Some(InjectedFailure::Unavailable) {
            return Err(CredentialError::store_unavailable("role exchange unreachable"));
        }

        self.role_sessions.write().push((role_id.to_string(), session_name.to_string()));
        Ok(DelegatedCredentials {
            access_key_id: "mock-access-key".to_string(),
            secret_access_key: SecretString::new("mock-secret-key"),
            session_token: SecretString::new("mock-session-token"),
        })
    }

    async fn release(&self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }

    fn store_type(&self) -> &'static str {
        "memory"
    }
}

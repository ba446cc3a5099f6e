//! Immutable credential pair with fetch and expiry timestamps.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::types::SecretString;

/// A Datadog credential pair as fetched from the secret store.
///
/// Records are never edited: a refresh builds a new record and replaces the
/// old one in the cache. `expires_at` is always strictly after `fetched_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialRecord {
    primary_key: SecretString,
    secondary_key: SecretString,
    fetched_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl CredentialRecord {
    pub(crate) fn new(
        primary_key: SecretString,
        secondary_key: SecretString,
        fetched_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        debug_assert!(expires_at > fetched_at, "credential record must expire after it is fetched");
        Self {
            primary_key,
            secondary_key,
            fetched_at,
            expires_at,
        }
    }

    /// The Datadog API key
    pub fn api_key(&self) -> &SecretString {
        &self.primary_key
    }

    /// The Datadog application key
    pub fn app_key(&self) -> &SecretString {
        &self.secondary_key
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Hard expiry check against the given time
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

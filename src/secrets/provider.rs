//! Credential provider: cache in front of a secret store with proactive
//! refresh and graceful degradation.
//!
//! # Refresh model
//!
//! ```text
//! EMPTY --fetch ok--> FRESH --buffer reached--> (next call) FETCHING
//! FETCHING --ok--> FRESH
//! FETCHING --error, record still valid, policy allows--> STALE_BUT_VALID
//! FETCHING --error otherwise--> error raised to the caller
//! close() --> EMPTY
//! ```
//!
//! Every call takes the provider's refresh lock before looking at the cache,
//! so concurrent callers that all see a stale slot collapse into one fetch:
//! the first performs it, the rest take its result when the lock frees. That
//! holds for failed refreshes too; callers queued behind a failed fetch get
//! the same stale record or error instead of fetching again.
//!
//! # Example
//!
//! ```rust
//! use dd_secrets::config::ProviderConfig;
//! use dd_secrets::secrets::{backends::InMemorySecretStore, CredentialProvider};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> dd_secrets::Result<()> {
//! let store = Arc::new(InMemorySecretStore::new().with_secret(
//!     "/dev/datadog/keys",
//!     r#"{"DD_API_KEY": "api", "DD_APP_KEY": "app"}"#,
//! ));
//! let provider = CredentialProvider::new(&ProviderConfig::combined("/dev/datadog/keys"), store);
//!
//! let credentials = provider.get_credentials().await?;
//! assert_eq!(credentials.api_key().expose_secret(), "api");
//! provider.close().await;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use metrics::counter;
use parking_lot::Mutex as SyncMutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn, Instrument};

use super::cache::{SecretCache, SlotState};
use super::client::SecretStoreClient;
use super::clock::{Clock, SystemClock};
use super::record::CredentialRecord;
use super::store::SecretStore;
use crate::config::{FallbackPolicy, ProviderConfig, REFRESH_BUFFER};
use crate::credential_span;
use crate::errors::{CredentialError, Result};

/// Result of one credential request
#[derive(Debug)]
pub enum FetchOutcome {
    /// Record from the cache or a successful fetch
    Fresh(Arc<CredentialRecord>),
    /// Refresh failed; serving the previous record, still within hard expiry
    Stale {
        record: Arc<CredentialRecord>,
        cause: CredentialError,
    },
    /// Refresh failed and no usable record exists
    Failed(CredentialError),
}

impl FetchOutcome {
    pub fn record(&self) -> Option<&Arc<CredentialRecord>> {
        match self {
            Self::Fresh(record) | Self::Stale { record, .. } => Some(record),
            Self::Failed(_) => None,
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale { .. })
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Fresh(_) => "fresh",
            Self::Stale { .. } => "stale",
            Self::Failed(_) => "failed",
        }
    }

    /// Collapse into the caller-facing result; stale records count as success
    pub fn into_result(self) -> Result<Arc<CredentialRecord>> {
        match self {
            Self::Fresh(record) | Self::Stale { record, .. } => Ok(record),
            Self::Failed(err) => Err(err),
        }
    }
}

/// Caller-facing seam for anything that can hand out Datadog credentials
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn get_credentials(&self) -> Result<Arc<CredentialRecord>>;

    /// Release resources; safe to call more than once
    async fn close(&self);
}

struct ProviderInner {
    cache: SecretCache,
    client: SecretStoreClient,
    fallback_policy: FallbackPolicy,
    /// Completed refreshes; bumped under the refresh lock
    refresh_attempts: AtomicU64,
    /// Error from the latest refresh, `None` after a success
    last_failure: SyncMutex<Option<CredentialError>>,
}

/// Cached, self-refreshing credential provider
///
/// Owns its cache and its store handle exclusively. Cheap to share behind an
/// `Arc`; all methods take `&self`.
pub struct CredentialProvider {
    inner: Arc<ProviderInner>,
    refresh_lock: Arc<Mutex<()>>,
}

impl std::fmt::Debug for CredentialProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialProvider")
            .field("store", &self.inner.client.store().store_type())
            .field("combined", &self.inner.client.is_combined())
            .field("cache_ttl", &self.inner.cache.ttl())
            .field("fallback_policy", &self.inner.fallback_policy)
            .finish()
    }
}

impl CredentialProvider {
    /// Create a provider with wall-clock time and the standard refresh buffer
    pub fn new(config: &ProviderConfig, store: Arc<dyn SecretStore>) -> Self {
        Self::with_clock(config, store, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: &ProviderConfig,
        store: Arc<dyn SecretStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::with_refresh_buffer(config, store, clock, REFRESH_BUFFER)
    }

    pub fn with_refresh_buffer(
        config: &ProviderConfig,
        store: Arc<dyn SecretStore>,
        clock: Arc<dyn Clock>,
        refresh_buffer: Duration,
    ) -> Self {
        let ttl = config.cache_ttl();
        if ttl <= refresh_buffer {
            warn!(
                ttl_secs = ttl.as_secs(),
                refresh_buffer_secs = refresh_buffer.as_secs(),
                "Cache TTL does not exceed the refresh buffer; every request will refresh"
            );
        }

        let client = SecretStoreClient::new(store, config);
        info!(
            store = client.store().store_type(),
            mode = config.mode(),
            api_key_secret = %config.api_key_secret,
            app_key_secret = %config.app_key_secret,
            role_arn = ?config.role_arn,
            ttl_secs = ttl.as_secs(),
            "Initialized credential provider"
        );

        Self {
            inner: Arc::new(ProviderInner {
                cache: SecretCache::new(ttl, refresh_buffer, clock),
                client,
                fallback_policy: config.fallback_policy,
                refresh_attempts: AtomicU64::new(0),
                last_failure: SyncMutex::new(None),
            }),
            refresh_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Current cache contents, for inspection
    pub fn cache(&self) -> &SecretCache {
        &self.inner.cache
    }

    /// Resolve credentials and report how they were obtained.
    ///
    /// The refresh runs in its own task holding the refresh lock, so a caller
    /// that gives up waiting does not abort a fetch already in progress.
    /// A caller that queued while another refresh ran takes that refresh's
    /// result rather than fetching again.
    pub async fn refresh_outcome(&self) -> FetchOutcome {
        let attempts_seen = self.inner.refresh_attempts.load(Ordering::Acquire);
        let guard = Arc::clone(&self.refresh_lock).lock_owned().await;

        if let SlotState::Fresh(record) = self.inner.cache.state() {
            debug!(expires_at = %record.expires_at(), "Credential cache hit");
            counter!("credential_cache_hits_total").increment(1);
            return FetchOutcome::Fresh(record);
        }

        if self.inner.refresh_attempts.load(Ordering::Acquire) != attempts_seen {
            if let Some(outcome) = self.inner.shared_outcome() {
                counter!("credential_refresh_shared_total", "outcome" => outcome.label())
                    .increment(1);
                return outcome;
            }
        }

        let inner = Arc::clone(&self.inner);
        let span = credential_span!("refresh", inner.client.store().store_type());
        let task = tokio::spawn(
            async move {
                let outcome = inner.refresh().await;
                drop(guard);
                outcome
            }
            .instrument(span),
        );

        let outcome = match task.await {
            Ok(outcome) => outcome,
            Err(join_error) => {
                error!(error = %join_error, "Credential refresh task did not complete");
                FetchOutcome::Failed(CredentialError::internal(format!(
                    "credential refresh task failed: {}",
                    join_error
                )))
            }
        };
        counter!("credential_refresh_total", "outcome" => outcome.label()).increment(1);
        outcome
    }

    /// Credentials for the caller: fresh when possible, stale-but-valid when
    /// the store is down, an error otherwise
    pub async fn get_credentials(&self) -> Result<Arc<CredentialRecord>> {
        self.refresh_outcome().await.into_result()
    }

    /// Clear the cache and release the store session. Idempotent.
    ///
    /// Waits for an in-flight refresh so its result cannot land after the clear.
    pub async fn close(&self) {
        let _guard = self.refresh_lock.lock().await;
        self.inner.cache.clear();
        self.inner.client.store().release().await;
        info!(store = self.inner.client.store().store_type(), "Closed credential provider");
    }
}

impl ProviderInner {
    /// Fetch from the store and install, or decide the fallback. Caller holds the refresh lock.
    async fn refresh(&self) -> FetchOutcome {
        info!("Fetching Datadog credentials from secret store");

        let outcome = match self.client.fetch_credential_pair().await {
            Ok((primary, secondary)) => {
                let record = self.cache.set(primary, secondary);
                info!(expires_at = %record.expires_at(), "Refreshed Datadog credentials");
                *self.last_failure.lock() = None;
                FetchOutcome::Fresh(record)
            }
            Err(cause) => {
                *self.last_failure.lock() = Some(cause.replicate());
                self.degrade(cause)
            }
        };
        self.refresh_attempts.fetch_add(1, Ordering::AcqRel);
        outcome
    }

    /// Result of the refresh that completed while the caller waited for the lock.
    ///
    /// `None` when nothing is left to share (the cache was cleared meanwhile).
    fn shared_outcome(&self) -> Option<FetchOutcome> {
        let cached = self.cache.get_cached();
        let failure = self.last_failure.lock().as_ref().map(CredentialError::replicate);

        match (failure, cached) {
            (None, Some(record)) => {
                debug!(
                    expires_at = %record.expires_at(),
                    "Reusing credentials from concurrent refresh"
                );
                Some(FetchOutcome::Fresh(record))
            }
            (None, None) => None,
            (Some(cause), Some(record)) if self.fallback_policy.allows(&cause) => {
                debug!(
                    error_kind = %cause.kind(),
                    "Concurrent refresh failed, using cached credentials"
                );
                Some(FetchOutcome::Stale { record, cause })
            }
            (Some(cause), _) => {
                debug!(error_kind = %cause.kind(), "Concurrent refresh failed");
                Some(FetchOutcome::Failed(cause))
            }
        }
    }

    fn degrade(&self, cause: CredentialError) -> FetchOutcome {
        let cached = self.cache.get_cached();

        match cached {
            Some(record) if self.fallback_policy.allows(&cause) => {
                warn!(
                    error = %cause,
                    error_kind = %cause.kind(),
                    expires_at = %record.expires_at(),
                    "Failed to refresh credentials, using cached credentials"
                );
                FetchOutcome::Stale { record, cause }
            }
            Some(_) => {
                error!(
                    error = %cause,
                    error_kind = %cause.kind(),
                    fallback_policy = %self.fallback_policy,
                    "Failed to refresh credentials; cached credentials withheld for a \
                     configuration error"
                );
                FetchOutcome::Failed(cause)
            }
            None => {
                error!(
                    error = %cause,
                    error_kind = %cause.kind(),
                    "Failed to fetch credentials from secret store"
                );
                FetchOutcome::Failed(cause)
            }
        }
    }
}

#[async_trait]
impl CredentialSource for CredentialProvider {
    async fn get_credentials(&self) -> Result<Arc<CredentialRecord>> {
        CredentialProvider::get_credentials(self).await
    }

    async fn close(&self) {
        CredentialProvider::close(self).await
    }
}

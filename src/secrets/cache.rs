//! Single-slot credential cache with TTL and refresh buffer
//!
//! Pure timestamp policy: the cache knows nothing about stores or networks.
//! A record moves through three windows after it is set:
//!
//! ```text
//! fetched_at ........ expires_at - buffer ........ expires_at ........
//!    |      Fresh            |      Refreshable         |    Expired
//! ```

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::clock::{Clock, SystemClock};
use super::record::CredentialRecord;
use super::types::SecretString;
use crate::config::REFRESH_BUFFER;

/// Where the cached record sits relative to its expiry, from one clock reading
#[derive(Debug, Clone)]
pub enum SlotState {
    /// No record
    Empty,
    /// Valid and outside the refresh buffer
    Fresh(Arc<CredentialRecord>),
    /// Valid but inside the refresh buffer
    Refreshable(Arc<CredentialRecord>),
    /// Past hard expiry
    Expired(Arc<CredentialRecord>),
}

impl SlotState {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Fresh(_) | Self::Refreshable(_))
    }

    pub fn needs_refresh(&self) -> bool {
        !matches!(self, Self::Fresh(_))
    }

    /// The record, if it is still within hard expiry
    pub fn valid_record(&self) -> Option<Arc<CredentialRecord>> {
        match self {
            Self::Fresh(record) | Self::Refreshable(record) => Some(Arc::clone(record)),
            _ => None,
        }
    }
}

/// TTL-aware holder of at most one [`CredentialRecord`].
///
/// Replacement swaps an `Arc` under a write lock, so readers see either the
/// old record or the new one, never a mix.
#[derive(Debug)]
pub struct SecretCache {
    slot: RwLock<Option<Arc<CredentialRecord>>>,
    ttl: TimeDelta,
    refresh_buffer: TimeDelta,
    clock: Arc<dyn Clock>,
}

fn to_delta(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX)
}

impl SecretCache {
    /// Create an empty cache.
    ///
    /// A zero TTL is raised to one second so every record expires strictly
    /// after it was fetched.
    pub fn new(ttl: Duration, refresh_buffer: Duration, clock: Arc<dyn Clock>) -> Self {
        let ttl = ttl.max(Duration::from_secs(1));
        Self {
            slot: RwLock::new(None),
            ttl: to_delta(ttl),
            refresh_buffer: to_delta(refresh_buffer),
            clock,
        }
    }

    /// Cache with the standard 10 minute refresh buffer and wall-clock time
    pub fn with_ttl(ttl: Duration) -> Self {
        Self::new(ttl, REFRESH_BUFFER, Arc::new(SystemClock))
    }

    /// Classify the slot against a single reading of the clock
    pub fn state(&self) -> SlotState {
        let now = self.clock.now();
        let slot = self.slot.read();
        match slot.as_ref() {
            None => SlotState::Empty,
            Some(record) if record.is_expired_at(now) => SlotState::Expired(Arc::clone(record)),
            Some(record) if now >= self.refresh_threshold(record) => {
                SlotState::Refreshable(Arc::clone(record))
            }
            Some(record) => SlotState::Fresh(Arc::clone(record)),
        }
    }

    /// A record exists and is before its hard expiry
    pub fn is_valid(&self) -> bool {
        self.state().is_valid()
    }

    /// No record, or inside the refresh buffer of expiry
    pub fn needs_refresh(&self) -> bool {
        self.state().needs_refresh()
    }

    /// The record if still valid; for degraded-mode reads only
    pub fn get_cached(&self) -> Option<Arc<CredentialRecord>> {
        self.state().valid_record()
    }

    /// Install a new record stamped with the current time, replacing any prior one
    pub fn set(
        &self,
        primary: impl Into<SecretString>,
        secondary: impl Into<SecretString>,
    ) -> Arc<CredentialRecord> {
        let fetched_at = self.clock.now();
        let expires_at = fetched_at
            .checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let record = Arc::new(CredentialRecord::new(
            primary.into(),
            secondary.into(),
            fetched_at,
            expires_at,
        ));

        *self.slot.write() = Some(Arc::clone(&record));
        debug!(
            fetched_at = %fetched_at,
            expires_at = %expires_at,
            ttl_secs = self.ttl.num_seconds(),
            "Cached credential record"
        );
        record
    }

    pub fn clear(&self) {
        if self.slot.write().take().is_some() {
            debug!("Cleared credential cache");
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl.to_std().unwrap_or(Duration::MAX)
    }

    pub fn refresh_buffer(&self) -> Duration {
        self.refresh_buffer.to_std().unwrap_or(Duration::ZERO)
    }

    fn refresh_threshold(&self, record: &CredentialRecord) -> DateTime<Utc> {
        record
            .expires_at()
            .checked_sub_signed(self.refresh_buffer)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

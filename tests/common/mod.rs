//! Common test utilities for all integration tests.
//!
//! Provides store fixtures and provider builders driven by a manual clock.

#![allow(dead_code)]
#![allow(clippy::duplicate_mod)]

use dd_secrets::config::ProviderConfig;
use dd_secrets::secrets::backends::InMemorySecretStore;
use dd_secrets::secrets::{CredentialProvider, ManualClock};
use std::sync::Arc;
use std::time::Duration;

pub const API_SECRET: &str = "/test/datadog/API_KEY";
pub const APP_SECRET: &str = "/test/datadog/APP_KEY";
pub const COMBINED_SECRET: &str = "/test/datadog/combined";

pub const API_KEY: &str = "test-datadog-api-key-12345";
pub const APP_KEY: &str = "test-datadog-app-key-67890";

/// Store with both keys under separate identifiers
pub fn separate_store() -> Arc<InMemorySecretStore> {
    Arc::new(
        InMemorySecretStore::new()
            .with_secret(API_SECRET, API_KEY)
            .with_secret(APP_SECRET, APP_KEY),
    )
}

/// Store with both keys in one JSON secret
pub fn combined_store() -> Arc<InMemorySecretStore> {
    Arc::new(InMemorySecretStore::new().with_secret(
        COMBINED_SECRET,
        format!(r#"{{"DD_API_KEY": "{}", "DD_APP_KEY": "{}"}}"#, API_KEY, APP_KEY),
    ))
}

pub fn separate_config(ttl_secs: u64) -> ProviderConfig {
    ProviderConfig::separate(API_SECRET, APP_SECRET).with_ttl_seconds(ttl_secs)
}

/// Provider over `store` with a manual clock the test controls
pub fn manual_provider(
    config: &ProviderConfig,
    store: &Arc<InMemorySecretStore>,
) -> (Arc<CredentialProvider>, ManualClock) {
    let clock = ManualClock::new();
    let provider = CredentialProvider::with_clock(config, store.clone(), Arc::new(clock.clone()));
    (Arc::new(provider), clock)
}

pub fn secs(seconds: u64) -> Duration {
    Duration::from_secs(seconds)
}

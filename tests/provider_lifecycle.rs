//! Credential provider lifecycle: first fetch, cache hits, proactive refresh,
//! expiry and close.

mod common;

use common::*;
use dd_secrets::config::ProviderConfig;
use dd_secrets::secrets::{Clock, CredentialSource, FetchOutcome};
use std::sync::Arc;

#[tokio::test]
async fn test_cold_start_fetches_and_caches() {
    let store = separate_store();
    let (provider, clock) = manual_provider(&separate_config(3000), &store);

    let creds = provider.get_credentials().await.unwrap();
    assert_eq!(creds.api_key().expose_secret(), API_KEY);
    assert_eq!(creds.app_key().expose_secret(), APP_KEY);
    assert_eq!(creds.fetched_at(), clock.now());
    assert_eq!(creds.expires_at() - creds.fetched_at(), chrono::TimeDelta::seconds(3000));
    assert_eq!(store.fetch_count(), 2);
}

#[tokio::test]
async fn test_cache_hit_returns_same_record_without_store_call() {
    let store = separate_store();
    let (provider, clock) = manual_provider(&separate_config(3000), &store);

    let first = provider.get_credentials().await.unwrap();
    clock.advance(secs(100));
    let second = provider.get_credentials().await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(store.fetch_count(), 2);
}

#[tokio::test]
async fn test_proactive_refresh_before_expiry() {
    let store = separate_store();
    let (provider, clock) = manual_provider(&separate_config(3000), &store);

    let first = provider.get_credentials().await.unwrap();

    // Last second before the refresh window opens
    clock.advance(secs(2399));
    let still_cached = provider.get_credentials().await.unwrap();
    assert!(Arc::ptr_eq(&first, &still_cached));

    clock.advance(secs(1));
    let refreshed = provider.get_credentials().await.unwrap();
    assert!(!Arc::ptr_eq(&first, &refreshed));
    assert!(refreshed.fetched_at() > first.fetched_at());
    assert!(first.expires_at() > refreshed.fetched_at());
    assert_eq!(store.fetch_count(), 4);
}

#[tokio::test]
async fn test_refresh_after_hard_expiry() {
    let store = separate_store();
    let (provider, clock) = manual_provider(&separate_config(3000), &store);

    let first = provider.get_credentials().await.unwrap();
    clock.advance(secs(5000));
    assert!(!provider.cache().is_valid());

    let second = provider.get_credentials().await.unwrap();
    assert!(second.expires_at() > first.expires_at());
    assert!(provider.cache().is_valid());
}

#[tokio::test]
async fn test_rotated_secret_is_picked_up_on_refresh() {
    let store = separate_store();
    let (provider, clock) = manual_provider(&separate_config(3000), &store);

    provider.get_credentials().await.unwrap();
    store.insert_secret(APP_SECRET, r#"{"value": "rotated-app-key"}"#);

    let cached = provider.get_credentials().await.unwrap();
    assert_eq!(cached.app_key().expose_secret(), APP_KEY);

    clock.advance(secs(2500));
    let refreshed = provider.get_credentials().await.unwrap();
    assert_eq!(refreshed.app_key().expose_secret(), "rotated-app-key");
}

#[tokio::test]
async fn test_combined_secret_single_read() {
    let store = combined_store();
    let config = ProviderConfig::combined(COMBINED_SECRET);
    let (provider, _) = manual_provider(&config, &store);

    let creds = provider.get_credentials().await.unwrap();
    assert_eq!(creds.api_key().expose_secret(), API_KEY);
    assert_eq!(creds.app_key().expose_secret(), APP_KEY);
    assert_eq!(store.fetch_count(), 1);
}

#[tokio::test]
async fn test_role_assumed_once_per_refresh() {
    let store = separate_store();
    let config =
        separate_config(3000).with_role_arn("arn:aws:iam::123456789012:role/datadog-reader");
    let (provider, clock) = manual_provider(&config, &store);

    provider.get_credentials().await.unwrap();
    provider.get_credentials().await.unwrap();
    assert_eq!(store.assume_role_count(), 1);

    clock.advance(secs(2500));
    provider.get_credentials().await.unwrap();
    assert_eq!(store.assume_role_count(), 2);
    assert!(store.delegations_seen().iter().all(|d| d.is_some()));
}

#[tokio::test]
async fn test_outcome_reports_fresh() {
    let store = separate_store();
    let (provider, _) = manual_provider(&separate_config(3000), &store);

    let outcome = provider.refresh_outcome().await;
    assert!(matches!(outcome, FetchOutcome::Fresh(_)));
    assert!(!outcome.is_stale());
}

#[tokio::test]
async fn test_close_is_idempotent_and_resets() {
    let store = separate_store();
    let (provider, _) = manual_provider(&separate_config(3000), &store);

    provider.get_credentials().await.unwrap();
    provider.close().await;
    provider.close().await;
    assert!(provider.cache().get_cached().is_none());
    assert_eq!(store.release_count(), 2);

    provider.get_credentials().await.unwrap();
    assert_eq!(store.fetch_count(), 4);
}

#[tokio::test]
async fn test_provider_behind_trait_object() {
    let store = separate_store();
    let (provider, _) = manual_provider(&separate_config(3000), &store);
    let source: Arc<dyn CredentialSource> = provider;

    let creds = source.get_credentials().await.unwrap();
    assert_eq!(creds.api_key().expose_secret(), API_KEY);
    source.close().await;
}

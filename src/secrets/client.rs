//! Secret store client: fetches the credential pair from a [`SecretStore`].
//!
//! Two storage layouts are supported:
//! 1. Separate secrets: the API and application keys live under two identifiers
//! 2. Combined secret: both identifiers are equal and point at one JSON object
//!    with `DD_API_KEY`/`api_key` and `DD_APP_KEY`/`app_key` fields
//!
//! If a role is configured it is assumed once per fetch and the resulting
//! credentials are used for every secret read in that fetch.

use std::sync::Arc;
use tracing::{debug, info};

use super::extract::{extract_combined, extract_value};
use super::store::{DelegatedCredentials, SecretStore};
use crate::config::ProviderConfig;
use crate::errors::Result;

/// Session name presented when assuming the delegated role
pub const ROLE_SESSION_NAME: &str = "dd-secrets-cache";

/// Reads Datadog credentials from a secret store
#[derive(Debug, Clone)]
pub struct SecretStoreClient {
    store: Arc<dyn SecretStore>,
    api_key_secret: String,
    app_key_secret: String,
    role_arn: Option<String>,
}

impl SecretStoreClient {
    pub fn new(store: Arc<dyn SecretStore>, config: &ProviderConfig) -> Self {
        Self {
            store,
            api_key_secret: config.api_key_secret.clone(),
            app_key_secret: config.app_key_secret.clone(),
            role_arn: config.role_arn.clone(),
        }
    }

    pub fn store(&self) -> &Arc<dyn SecretStore> {
        &self.store
    }

    pub fn is_combined(&self) -> bool {
        self.api_key_secret == self.app_key_secret
    }

    /// Fetch one secret as text; binary payloads are decoded as UTF-8
    pub async fn fetch_raw_secret(
        &self,
        secret_id: &str,
        delegated: Option<&DelegatedCredentials>,
    ) -> Result<String> {
        debug!(
            secret_id = %secret_id,
            store = self.store.store_type(),
            delegated = delegated.is_some(),
            "Fetching secret"
        );
        let payload = self.store.get_secret_value(secret_id, delegated).await?;
        payload.into_text().map_err(|e| e.for_secret(secret_id))
    }

    /// Assume the configured role, if any
    ///
    /// Returns `None` when no role is configured; callers then read with the
    /// ambient identity.
    pub async fn assume_delegated_role_if_configured(
        &self,
    ) -> Result<Option<DelegatedCredentials>> {
        let Some(role_arn) = self.role_arn.as_deref() else {
            return Ok(None);
        };

        let credentials = self.store.assume_role(role_arn, ROLE_SESSION_NAME).await?;
        info!(
            role_arn = %role_arn,
            session_name = ROLE_SESSION_NAME,
            access_key_id = %credentials.access_key_id,
            "Assumed delegated role for secret access"
        );
        Ok(Some(credentials))
    }

    /// Fetch and normalize the (primary, secondary) credential pair
    pub async fn fetch_credential_pair(&self) -> Result<(String, String)> {
        let delegated = self.assume_delegated_role_if_configured().await?;
        let delegated = delegated.as_ref();

        if self.is_combined() {
            let raw = self.fetch_raw_secret(&self.api_key_secret, delegated).await?;
            return extract_combined(&self.api_key_secret, &raw);
        }

        // Both reads run concurrently; the provider's refresh lock is held meanwhile
        let (api_raw, app_raw) = tokio::try_join!(
            self.fetch_raw_secret(&self.api_key_secret, delegated),
            self.fetch_raw_secret(&self.app_key_secret, delegated),
        )?;

        let api_key = extract_value(&api_raw).map_err(|e| e.for_secret(&self.api_key_secret))?;
        let app_key = extract_value(&app_raw).map_err(|e| e.for_secret(&self.app_key_secret))?;
        Ok((api_key, app_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CredentialError;
    use crate::secrets::backends::InMemorySecretStore;
    use crate::secrets::store::SecretPayload;
    use std::time::Duration;

    fn client(store: &Arc<InMemorySecretStore>, config: &ProviderConfig) -> SecretStoreClient {
        SecretStoreClient::new(store.clone(), config)
    }

    #[tokio::test]
    async fn test_fetch_separate_secrets() {
        let store = Arc::new(
            InMemorySecretStore::new()
                .with_secret("/test/datadog/API_KEY", "test-datadog-api-key-12345")
                .with_secret("/test/datadog/APP_KEY", "test-datadog-app-key-67890"),
        );
        let config = ProviderConfig::separate("/test/datadog/API_KEY", "/test/datadog/APP_KEY");

        let (api, app) = client(&store, &config).fetch_credential_pair().await.unwrap();
        assert_eq!(api, "test-datadog-api-key-12345");
        assert_eq!(app, "test-datadog-app-key-67890");
        assert_eq!(store.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_fetch_combined_secret() {
        let store = Arc::new(InMemorySecretStore::new().with_secret(
            "/test/datadog/combined",
            r#"{"DD_API_KEY":"combined-api-key","DD_APP_KEY":"combined-app-key"}"#,
        ));
        let config = ProviderConfig::combined("/test/datadog/combined");

        let (api, app) = client(&store, &config).fetch_credential_pair().await.unwrap();
        assert_eq!(api, "combined-api-key");
        assert_eq!(app, "combined-app-key");
        assert_eq!(store.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_combined_plain_text_is_malformed() {
        let store = Arc::new(InMemorySecretStore::new().with_secret("/c", "not-json"));
        let config = ProviderConfig::combined("/c");

        let err = client(&store, &config).fetch_credential_pair().await.unwrap_err();
        assert!(matches!(
            err,
            CredentialError::MalformedSecret { ref secret_id, .. } if secret_id == "/c"
        ));
    }

    #[tokio::test]
    async fn test_json_wrapped_separate_secrets() {
        let store = Arc::new(
            InMemorySecretStore::new()
                .with_secret("/a", r#"{"value": "json-api-key"}"#)
                .with_secret("/b", r#"{"value": "json-app-key"}"#),
        );
        let config = ProviderConfig::separate("/a", "/b");

        let (api, app) = client(&store, &config).fetch_credential_pair().await.unwrap();
        assert_eq!(api, "json-api-key");
        assert_eq!(app, "json-app-key");
    }

    #[tokio::test]
    async fn test_binary_secret_is_decoded() {
        let store = Arc::new(
            InMemorySecretStore::new()
                .with_secret("/a", SecretPayload::Binary(b"binary-api\n".to_vec()))
                .with_secret("/b", "app"),
        );
        let config = ProviderConfig::separate("/a", "/b");

        let (api, _) = client(&store, &config).fetch_credential_pair().await.unwrap();
        assert_eq!(api, "binary-api");
    }

    #[tokio::test]
    async fn test_invalid_utf8_names_the_secret() {
        let store = Arc::new(
            InMemorySecretStore::new()
                .with_secret("/a", "api")
                .with_secret("/b", SecretPayload::Binary(vec![0xc3, 0x28])),
        );
        let config = ProviderConfig::separate("/a", "/b");

        let err = client(&store, &config).fetch_credential_pair().await.unwrap_err();
        assert!(matches!(
            err,
            CredentialError::MalformedSecret { ref secret_id, .. } if secret_id == "/b"
        ));
    }

    #[tokio::test]
    async fn test_missing_secret_is_not_found() {
        let store = Arc::new(InMemorySecretStore::new().with_secret("/a", "api"));
        let config = ProviderConfig::separate("/a", "/missing");

        let err = client(&store, &config).fetch_credential_pair().await.unwrap_err();
        assert!(matches!(
            err,
            CredentialError::SecretNotFound { ref secret_id } if secret_id == "/missing"
        ));
    }

    #[tokio::test]
    async fn test_separate_secrets_are_fetched_concurrently() {
        let store = Arc::new(
            InMemorySecretStore::new()
                .with_secret("/a", "api")
                .with_secret("/b", "app")
                .with_latency(Duration::from_millis(200)),
        );
        let config = ProviderConfig::separate("/a", "/b");

        let started = std::time::Instant::now();
        client(&store, &config).fetch_credential_pair().await.unwrap();
        assert!(started.elapsed() < Duration::from_millis(390));
    }

    #[tokio::test]
    async fn test_no_role_means_ambient_identity() {
        let store = Arc::new(
            InMemorySecretStore::new()
                .with_secret("/a", "api")
                .with_secret("/b", "app"),
        );
        let config = ProviderConfig::separate("/a", "/b");

        let delegated = client(&store, &config)
            .assume_delegated_role_if_configured()
            .await
            .unwrap();
        assert!(delegated.is_none());

        client(&store, &config).fetch_credential_pair().await.unwrap();
        assert_eq!(store.assume_role_count(), 0);
        assert!(store.delegations_seen().iter().all(Option::is_none));
    }

    #[tokio::test]
    async fn test_role_is_assumed_once_per_fetch() {
        let store = Arc::new(
            InMemorySecretStore::new()
                .with_secret("/a", "api")
                .with_secret("/b", "app"),
        );
        let config = ProviderConfig::separate("/a", "/b")
            .with_role_arn("arn:aws:iam::123456789012:role/dd-reader");

        client(&store, &config).fetch_credential_pair().await.unwrap();

        assert_eq!(store.assume_role_count(), 1);
        assert_eq!(
            store.role_sessions(),
            vec![(
                "arn:aws:iam::123456789012:role/dd-reader".to_string(),
                ROLE_SESSION_NAME.to_string()
            )]
        );
        let seen = store.delegations_seen();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|d| d.as_deref() == Some("mock-access-key")));
    }
}

//! Process-wide provider registry
//!
//! Holds at most one [`CredentialProvider`], built lazily on first request and
//! torn down explicitly. The registry's guard covers construction and
//! teardown only; steady-state credential reads go straight to the provider.
//!
//! When no store can serve credentials (blank identifiers, or no store
//! backend compiled in) the registry hands back
//! [`ProviderHandle::NotConfigured`] so callers can fall back to another
//! credential source. Invalid configuration is different: every request
//! fails with [`CredentialError::Config`] so the mistake is not hidden.

use once_cell::sync::Lazy;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use super::provider::CredentialProvider;
use super::store::SecretStore;
use crate::config::ProviderConfig;
use crate::errors::{CredentialError, Result};

/// Builds the store a new provider reads from
pub type StoreFactory =
    Arc<dyn Fn(&ProviderConfig) -> Result<Arc<dyn SecretStore>> + Send + Sync>;

/// What [`ProviderRegistry::get_provider`] hands back
#[derive(Debug, Clone)]
pub enum ProviderHandle {
    Ready(Arc<CredentialProvider>),
    /// No secret store is usable; use another credential source
    NotConfigured,
}

impl ProviderHandle {
    pub fn is_configured(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn into_provider(self) -> Option<Arc<CredentialProvider>> {
        match self {
            Self::Ready(provider) => Some(provider),
            Self::NotConfigured => None,
        }
    }

    /// The provider, or [`CredentialError::NotConfigured`] for callers with no fallback
    pub fn require(self) -> Result<Arc<CredentialProvider>> {
        self.into_provider().ok_or(CredentialError::NotConfigured)
    }
}

/// Lazily constructed, explicitly closed singleton provider
pub struct ProviderRegistry {
    config: Option<ProviderConfig>,
    /// Why configuration could not be resolved; reported on every request
    config_error: Option<String>,
    factory: Option<StoreFactory>,
    slot: Mutex<Option<Arc<CredentialProvider>>>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("config", &self.config)
            .field("config_error", &self.config_error)
            .field("has_factory", &self.factory.is_some())
            .finish()
    }
}

impl ProviderRegistry {
    pub fn new(config: ProviderConfig, factory: Option<StoreFactory>) -> Self {
        Self {
            config: Some(config),
            config_error: None,
            factory,
            slot: Mutex::new(None),
        }
    }

    /// Registry that always reports [`ProviderHandle::NotConfigured`]
    pub fn not_configured() -> Self {
        Self {
            config: None,
            config_error: None,
            factory: None,
            slot: Mutex::new(None),
        }
    }

    /// Registry over an already-resolved configuration
    ///
    /// A configuration error is logged once and then returned from every
    /// [`ProviderRegistry::get_provider`] call.
    pub fn from_config(config: Result<ProviderConfig>, factory: Option<StoreFactory>) -> Self {
        match config {
            Ok(config) => Self::new(config, factory),
            Err(e) => {
                error!(error = %e, "Invalid secret store configuration");
                let message = match e {
                    CredentialError::Config { message } => message,
                    other => other.to_string(),
                };
                Self {
                    config: None,
                    config_error: Some(message),
                    factory,
                    slot: Mutex::new(None),
                }
            }
        }
    }

    /// Resolve configuration from the environment and pick the compiled-in store
    pub fn from_env() -> Self {
        Self::from_config(ProviderConfig::from_env(), default_store_factory())
    }

    pub fn config(&self) -> Option<&ProviderConfig> {
        self.config.as_ref()
    }

    /// Return the provider, constructing it on first use
    pub async fn get_provider(&self) -> Result<ProviderHandle> {
        if let Some(message) = &self.config_error {
            return Err(CredentialError::config(message.clone()));
        }

        let mut slot = self.slot.lock().await;
        if let Some(provider) = slot.as_ref() {
            return Ok(ProviderHandle::Ready(Arc::clone(provider)));
        }

        let (Some(config), Some(factory)) = (self.config.as_ref(), self.factory.as_ref())
        else {
            debug!("No secret store backend available");
            return Ok(ProviderHandle::NotConfigured);
        };
        if !config.is_configured() {
            debug!("Secret identifiers are empty; credential provider not configured");
            return Ok(ProviderHandle::NotConfigured);
        }

        let store = factory(config)?;
        let provider = Arc::new(CredentialProvider::new(config, store));
        *slot = Some(Arc::clone(&provider));
        Ok(ProviderHandle::Ready(provider))
    }

    /// Close and drop the provider, if one exists
    pub async fn close_provider(&self) {
        let mut slot = self.slot.lock().await;
        if let Some(provider) = slot.take() {
            provider.close().await;
            info!("Credential provider closed");
        }
    }

    pub async fn is_active(&self) -> bool {
        self.slot.lock().await.is_some()
    }
}

#[cfg(feature = "aws")]
fn default_store_factory() -> Option<StoreFactory> {
    use super::backends::AwsSecretsManagerStore;

    let factory: StoreFactory = Arc::new(|config: &ProviderConfig| {
        let store: Arc<dyn SecretStore> = Arc::new(AwsSecretsManagerStore::new(config));
        Ok(store)
    });
    Some(factory)
}

#[cfg(not(feature = "aws"))]
fn default_store_factory() -> Option<StoreFactory> {
    None
}

static GLOBAL_REGISTRY: Lazy<ProviderRegistry> = Lazy::new(ProviderRegistry::from_env);

/// Process-wide registry, configured from the environment on first use
pub fn global() -> &'static ProviderRegistry {
    &GLOBAL_REGISTRY
}

/// Process-wide [`ProviderRegistry::get_provider`]
pub async fn get_provider() -> Result<ProviderHandle> {
    GLOBAL_REGISTRY.get_provider().await
}

/// Process-wide [`ProviderRegistry::close_provider`]
pub async fn close_provider() {
    GLOBAL_REGISTRY.close_provider().await
}

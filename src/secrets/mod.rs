//! Datadog credential cache and refresh engine.
//!
//! Datadog API and application keys live in a remote secret store. Reading
//! them on every request is slow and costly, and a store outage would take
//! every caller down with it. This module keeps the pair in a process-local
//! cache, refreshes it shortly before it expires, and keeps serving the last
//! good pair while the store is unreachable and the pair has not yet expired.
//!
//! # Architecture
//!
//! ```text
//! registry ──> CredentialProvider ──> SecretCache (TTL + refresh buffer)
//!                     │
//!                     └──> SecretStoreClient ──> extract ──> SecretStore
//!                                                            ├─ InMemorySecretStore
//!                                                            └─ AwsSecretsManagerStore (aws)
//! ```
//!
//! - [`SecretStore`]: backend-agnostic read access plus optional role delegation
//! - [`SecretStoreClient`]: assumes the role, reads one or two secrets, normalizes values
//! - [`SecretCache`]: single slot with soft (refresh) and hard (expiry) deadlines
//! - [`CredentialProvider`]: single-flight refresh with graceful degradation
//! - [`registry`]: lazily built process-wide provider with explicit teardown
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
//! let store = Arc::new(
//!     InMemorySecretStore::new()
//!         .with_secret("/prod/datadog/API_KEY", "api-key")
//!         .with_secret("/prod/datadog/APP_KEY", r#"{"value": "app-key"}"#),
//! );
//! let config = ProviderConfig::separate("/prod/datadog/API_KEY", "/prod/datadog/APP_KEY");
//! let provider = CredentialProvider::new(&config, store);
//!
//! let credentials = provider.get_credentials().await?;
//! assert_eq!(credentials.app_key().expose_secret(), "app-key");
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod cache;
pub mod client;
pub mod clock;
pub mod extract;
pub mod provider;
pub mod record;
pub mod registry;
pub mod store;
pub mod types;

pub use cache::{SecretCache, SlotState};
pub use client::{SecretStoreClient, ROLE_SESSION_NAME};
pub use clock::{Clock, ManualClock, SystemClock};
pub use extract::{extract_combined, extract_value};
pub use provider::{CredentialProvider, CredentialSource, FetchOutcome};
pub use record::CredentialRecord;
pub use registry::{close_provider, get_provider, ProviderHandle, ProviderRegistry, StoreFactory};
pub use store::{DelegatedCredentials, SecretPayload, SecretStore};
pub use types::SecretString;

//! # dd-secrets
//!
//! Cached, self-refreshing Datadog API and application keys read from a
//! remote secret store.
//!
//! ## Architecture
//!
//! ```text
//! caller → registry → CredentialProvider → SecretCache
//!                            ↓
//!                     SecretStoreClient → SecretStore (memory | AWS Secrets Manager)
//! ```
//!
//! ## Core Components
//!
//! - **Provider**: single-flight refresh with stale-but-valid fallback during store outages
//! - **Cache**: one record with a soft refresh deadline and a hard expiry
//! - **Client**: separate or combined secret layouts, JSON or plain-text values,
//!   optional role delegation
//! - **Registry**: lazily built process-wide provider with explicit teardown
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use dd_secrets::secrets::{get_provider, ProviderHandle};
//!
//! #[tokio::main]
//! async fn main() -> dd_secrets::Result<()> {
//!     match get_provider().await? {
//!         ProviderHandle::Ready(provider) => {
//!             let credentials = provider.get_credentials().await?;
//!             println!("api key {}", credentials.api_key().fingerprint());
//!         }
//!         ProviderHandle::NotConfigured => println!("falling back to DD_API_KEY"),
//!     }
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod errors;
pub mod observability;
pub mod secrets;

// Re-export commonly used types and traits
pub use config::{ObservabilityConfig, ProviderConfig};
pub use errors::{CredentialError, ErrorKind, Result};
pub use secrets::{CredentialProvider, CredentialRecord, ProviderHandle, SecretStore};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_available() {
        assert!(!VERSION.is_empty());
        assert_eq!(APP_NAME, "dd-secrets");
    }
}

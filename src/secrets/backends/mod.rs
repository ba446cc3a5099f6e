//! Secret store backends
//!
//! ## Supported Backends
//!
//! - **Memory**: in-process store for development and tests
//! - **AWS Secrets Manager**: (optional feature `aws`)

#[cfg(feature = "aws")]
pub mod aws;
pub mod memory;

#[cfg(feature = "aws")]
pub use aws::AwsSecretsManagerStore;
pub use memory::{InMemorySecretStore, InjectedFailure};

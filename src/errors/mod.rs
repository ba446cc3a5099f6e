//! # Error Handling
//!
//! Typed errors for the credential cache. Fetch failures carry enough
//! classification for the provider to decide between stale-cache fallback
//! and surfacing the failure.

pub mod types;

pub use types::{CredentialError, ErrorKind, Result};

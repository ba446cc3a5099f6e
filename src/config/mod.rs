//! # Configuration Management
//!
//! Provider and logging configuration, resolved from the environment with
//! defaults so the crate is usable with zero configuration.

pub mod settings;

pub use settings::{
    FallbackPolicy, ObservabilityConfig, ProviderConfig, DEFAULT_API_KEY_SECRET,
    DEFAULT_APP_KEY_SECRET, DEFAULT_CACHE_TTL_SECONDS, DEFAULT_PROFILE, DEFAULT_REGION,
    REFRESH_BUFFER,
};

//! # Command Line Interface
//!
//! Inspect the resolved secret store configuration and check that
//! credentials can be fetched. Secret values are only ever printed as
//! masked fingerprints.

pub mod output;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::config::{ObservabilityConfig, ProviderConfig};
use crate::observability::{init_logging, log_config_info};
use crate::secrets::{registry, CredentialRecord, ProviderHandle};
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "dd-secrets")]
#[command(about = "Cached Datadog credentials from a remote secret store")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (json or table)
    #[arg(short, long, global = true, default_value = "table")]
    pub output: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the configuration resolved from the environment
    Config,

    /// Fetch credentials once and print masked fingerprints
    Fetch,
}

/// Masked view of a credential record
#[derive(Debug, Serialize)]
pub struct CredentialSummary {
    pub api_key: String,
    pub app_key: String,
    pub fetched_at: String,
    pub expires_at: String,
}

impl From<&CredentialRecord> for CredentialSummary {
    fn from(record: &CredentialRecord) -> Self {
        Self {
            api_key: record.api_key().fingerprint(),
            app_key: record.app_key().fingerprint(),
            fetched_at: record.fetched_at().to_rfc3339(),
            expires_at: record.expires_at().to_rfc3339(),
        }
    }
}

const NOT_CONFIGURED_HINT: &str = "Secret store is not configured. Set AWS_SECRET_API_KEY and \
    AWS_SECRET_APP_KEY, and build with the default `aws` feature to enable AWS Secrets Manager.";

/// Run CLI commands
pub async fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    initialise_logging(cli.verbose);

    match cli.command {
        Commands::Config => show_config(cli.output)?,
        Commands::Fetch => fetch_credentials(cli.output).await?,
    }

    Ok(())
}

/// Install logging for the CLI; invalid logging settings fall back to the
/// defaults and an already-installed subscriber is kept
fn initialise_logging(verbose: bool) {
    let mut config = logging_config(verbose);
    if let Err(e) = config.validate() {
        eprintln!("warning: {}; using default log settings", e);
        config = ObservabilityConfig::default();
    }
    if let Err(e) = init_logging(&config) {
        tracing::debug!(error = %e, "Keeping the existing tracing subscriber");
    }
}

fn logging_config(verbose: bool) -> ObservabilityConfig {
    let mut config = ObservabilityConfig::from_env();
    if verbose {
        config.log_level = "debug".to_string();
    }
    config
}

fn show_config(format: OutputFormat) -> anyhow::Result<()> {
    let config =
        ProviderConfig::from_env().context("Failed to resolve secret store configuration")?;
    log_config_info(&config);

    let rows = [
        ("mode", config.mode().to_string()),
        ("api_key_secret", config.api_key_secret.clone()),
        ("app_key_secret", config.app_key_secret.clone()),
        ("region", config.region.clone()),
        ("profile", config.profile.clone()),
        ("role_arn", config.role_arn.clone().unwrap_or_else(|| "-".to_string())),
        ("cache_ttl_seconds", config.cache_ttl_seconds.to_string()),
        ("fallback_policy", config.fallback_policy.to_string()),
    ];
    output::print_output(&config, &rows, format)
}

async fn fetch_credentials(format: OutputFormat) -> anyhow::Result<()> {
    let handle = registry::get_provider()
        .await
        .context("Failed to create credential provider")?;
    let provider = match handle {
        ProviderHandle::Ready(provider) => provider,
        ProviderHandle::NotConfigured => anyhow::bail!(NOT_CONFIGURED_HINT),
    };

    let fetched = provider.get_credentials().await;
    registry::close_provider().await;
    let record = fetched.context("Failed to fetch Datadog credentials")?;

    let summary = CredentialSummary::from(record.as_ref());
    let rows = [
        ("api_key", summary.api_key.clone()),
        ("app_key", summary.app_key.clone()),
        ("fetched_at", summary.fetched_at.clone()),
        ("expires_at", summary.expires_at.clone()),
    ];
    output::print_output(&summary, &rows, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::SecretString;
    use chrono::{TimeZone, Utc};
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_fetch_with_global_flags() {
        let cli = Cli::try_parse_from(["dd-secrets", "fetch", "--verbose", "-o", "json"]).unwrap();
        assert!(matches!(cli.command, Commands::Fetch));
        assert!(cli.verbose);
        assert_eq!(cli.output, OutputFormat::Json);
    }

    #[test]
    fn test_verbose_forces_debug_level() {
        let config = logging_config(true);
        assert_eq!(config.log_level, "debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_not_configured_hint_names_aws_feature() {
        assert!(NOT_CONFIGURED_HINT.contains("default `aws` feature"));
        assert!(NOT_CONFIGURED_HINT.contains("AWS_SECRET_API_KEY"));
    }

    #[test]
    fn test_summary_masks_keys() {
        let fetched_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let record = CredentialRecord::new(
            SecretString::new("0123456789abcdef"),
            SecretString::new("fedcba9876543210"),
            fetched_at,
            fetched_at + chrono::TimeDelta::seconds(3000),
        );

        let summary = CredentialSummary::from(&record);
        assert_eq!(summary.api_key, "****cdef");
        assert_eq!(summary.app_key, "****3210");
        assert!(!serde_json::to_string(&summary).unwrap().contains("0123456789"));
    }
}

//! AWS Secrets Manager store
//!
//! Reads secrets with `GetSecretValue` and, when a role is configured,
//! exchanges the ambient identity through STS `AssumeRole`.
//!
//! ## Configuration
//!
//! Uses the standard AWS credential chain (environment, profile, SSO,
//! instance roles) with the profile and region from [`ProviderConfig`].
//! The SDK configuration is loaded on first use and kept until
//! [`SecretStore::release`] is called.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_secretsmanager::error::DisplayErrorContext;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::ProviderConfig;
use crate::errors::{CredentialError, Result};
use crate::secrets::store::{DelegatedCredentials, SecretPayload, SecretStore};
use crate::secrets::types::SecretString;

/// Secret store backed by AWS Secrets Manager
pub struct AwsSecretsManagerStore {
    region: String,
    profile: String,
    session: Mutex<Option<SdkConfig>>,
}

impl std::fmt::Debug for AwsSecretsManagerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsSecretsManagerStore")
            .field("region", &self.region)
            .field("profile", &self.profile)
            .field("session", &"[SdkConfig]")
            .finish()
    }
}

impl AwsSecretsManagerStore {
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            region: config.region.clone(),
            profile: config.profile.clone(),
            session: Mutex::new(None),
        }
    }

    /// Get or create the SDK session for the configured profile and region
    async fn session(&self) -> SdkConfig {
        let mut session = self.session.lock().await;
        if let Some(existing) = session.as_ref() {
            return existing.clone();
        }

        let loaded = aws_config::defaults(BehaviorVersion::latest())
            .profile_name(&self.profile)
            .region(Region::new(self.region.clone()))
            .load()
            .await;
        info!(profile = %self.profile, region = %self.region, "Created AWS session");
        *session = Some(loaded.clone());
        loaded
    }

    async fn secrets_client(
        &self,
        delegated: Option<&DelegatedCredentials>,
    ) -> aws_sdk_secretsmanager::Client {
        let session = self.session().await;
        match delegated {
            None => aws_sdk_secretsmanager::Client::new(&session),
            Some(delegated) => {
                let credentials = aws_sdk_secretsmanager::config::Credentials::new(
                    delegated.access_key_id.clone(),
                    delegated.secret_access_key.expose_secret().to_string(),
                    Some(delegated.session_token.expose_secret().to_string()),
                    None,
                    "dd-secrets-assumed-role",
                );
                let config = aws_sdk_secretsmanager::config::Builder::from(&session)
                    .credentials_provider(credentials)
                    .build();
                aws_sdk_secretsmanager::Client::from_conf(config)
            }
        }
    }
}

#[async_trait]
impl SecretStore for AwsSecretsManagerStore {
    async fn get_secret_value(
        &self,
        secret_id: &str,
        delegated: Option<&DelegatedCredentials>,
    ) -> Result<SecretPayload> {
        let client = self.secrets_client(delegated).await;

        let output = client
            .get_secret_value()
            .secret_id(secret_id)
            .send()
            .await
            .map_err(|err| {
                let service_error = err.into_service_error();
                if service_error.is_resource_not_found_exception() {
                    CredentialError::secret_not_found(secret_id)
                } else {
                    let message = format!(
                        "GetSecretValue for '{}' failed: {}",
                        secret_id,
                        DisplayErrorContext(&service_error)
                    );
                    CredentialError::store_unavailable_with_source(
                        message,
                        Box::new(service_error),
                    )
                }
            })?;

        debug!(secret_id = %secret_id, "Received secret from AWS Secrets Manager");

        if let Some(text) = output.secret_string() {
            return Ok(SecretPayload::Text(text.to_string()));
        }
        match output.secret_binary() {
            Some(blob) => Ok(SecretPayload::Binary(blob.as_ref().to_vec())),
            None => Err(CredentialError::malformed(
                secret_id,
                "secret has neither a string nor a binary value",
            )),
        }
    }

    async fn assume_role(&self, role_id: &str, session_name: &str) -> Result<DelegatedCredentials> {
        let session = self.session().await;
        let sts = aws_sdk_sts::Client::new(&session);

        let output = sts
            .assume_role()
            .role_arn(role_id)
            .role_session_name(session_name)
            .send()
            .await
            .map_err(|err| {
                CredentialError::store_unavailable(format!(
                    "AssumeRole for '{}' failed: {}",
                    role_id,
                    aws_sdk_sts::error::DisplayErrorContext(&err)
                ))
            })?;

        let credentials = output.credentials().ok_or_else(|| {
            CredentialError::store_unavailable(format!(
                "AssumeRole for '{}' returned no credentials",
                role_id
            ))
        })?;

        Ok(DelegatedCredentials {
            access_key_id: credentials.access_key_id().to_string(),
            secret_access_key: SecretString::new(credentials.secret_access_key()),
            session_token: SecretString::new(credentials.session_token()),
        })
    }

    async fn release(&self) {
        if self.session.lock().await.take().is_some() {
            debug!("Released AWS session");
        }
    }

    fn store_type(&self) -> &'static str {
        "aws_secrets_manager"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_keeps_region_and_profile() {
        let config = ProviderConfig {
            region: "eu-west-1".to_string(),
            ..Default::default()
        };
        let store = AwsSecretsManagerStore::new(&config);
        assert_eq!(store.store_type(), "aws_secrets_manager");
        let debug = format!("{:?}", store);
        assert!(debug.contains("eu-west-1"));
        assert!(debug.contains("default"));
    }

    #[tokio::test]
    async fn test_release_without_session_is_noop() {
        let store = AwsSecretsManagerStore::new(&ProviderConfig::default());
        store.release().await;
        assert!(store.session.lock().await.is_none());
    }
}

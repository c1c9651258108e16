//! Azure AD bearer tokens
//!
//! Every REST adapter asks a [`TokenProvider`] for a bearer token scoped to the
//! service it calls. The production provider wraps an `azure_identity`
//! credential chosen by [`IdentityConfig::auth_method`]; tests substitute a
//! [`StaticTokenProvider`].

use crate::config::{AuthMethod, IdentityConfig};
use crate::domain::{NimbusError, Result};
use async_trait::async_trait;
use azure_core::credentials::TokenCredential;
use azure_identity::{
    ClientSecretCredential, ManagedIdentityCredential, ManagedIdentityCredentialOptions,
    UserAssignedId,
};
use std::sync::Arc;

/// Token scope for Azure Resource Manager (Resource Graph, Compute)
pub const MANAGEMENT_SCOPE: &str = "https://management.azure.com/.default";

/// Token scope for Azure Blob Storage
pub const STORAGE_SCOPE: &str = "https://storage.azure.com/.default";

/// Source of bearer tokens
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Return an access token valid for `scope`
    async fn bearer_token(&self, scope: &str) -> Result<String>;
}

/// Token provider backed by an `azure_identity` credential
///
/// Token caching and refresh are handled by the credential.
pub struct AzureTokenProvider {
    credential: Arc<dyn TokenCredential>,
    method: AuthMethod,
}

impl AzureTokenProvider {
    /// Build the credential described by the identity configuration
    ///
    /// # Errors
    ///
    /// Returns [`NimbusError::Authentication`] if the credential cannot be
    /// constructed, or [`NimbusError::Configuration`] if client-secret fields
    /// are missing.
    pub fn from_config(identity: &IdentityConfig) -> Result<Self> {
        let credential: Arc<dyn TokenCredential> = match identity.auth_method {
            AuthMethod::ManagedIdentity => {
                let mut options = ManagedIdentityCredentialOptions::default();
                if let Some(ref client_id) = identity.managed_identity_client_id {
                    options.user_assigned_id = Some(UserAssignedId::ClientId(client_id.clone()));
                }

                tracing::info!(
                    user_assigned = identity.managed_identity_client_id.is_some(),
                    "Using managed identity credential"
                );

                ManagedIdentityCredential::new(Some(options)).map_err(|e| {
                    NimbusError::Authentication(format!(
                        "Failed to create managed identity credential: {e}"
                    ))
                })?
            }
            AuthMethod::ClientSecret => {
                use secrecy::ExposeSecret;

                let missing = |field: &str| {
                    NimbusError::Configuration(format!(
                        "identity.{field} is required when auth_method = 'client_secret'"
                    ))
                };
                let tenant_id = identity.tenant_id.as_deref().ok_or_else(|| missing("tenant_id"))?;
                let client_id = identity.client_id.clone().ok_or_else(|| missing("client_id"))?;
                let client_secret = identity
                    .client_secret
                    .as_ref()
                    .ok_or_else(|| missing("client_secret"))?;

                tracing::info!(
                    tenant_id = %tenant_id,
                    client_id = %client_id,
                    "Using client secret credential"
                );

                let secret = azure_core::credentials::Secret::new(
                    client_secret.expose_secret().as_ref().to_string(),
                );
                ClientSecretCredential::new(tenant_id, client_id, secret, None).map_err(|e| {
                    NimbusError::Authentication(format!(
                        "Failed to create client secret credential: {e}"
                    ))
                })?
            }
        };

        Ok(Self {
            credential,
            method: identity.auth_method,
        })
    }

    /// Authentication method in use
    pub fn method(&self) -> AuthMethod {
        self.method
    }
}

#[async_trait]
impl TokenProvider for AzureTokenProvider {
    async fn bearer_token(&self, scope: &str) -> Result<String> {
        let token = TokenCredential::get_token(&*self.credential, &[scope], None)
            .await
            .map_err(|e| {
                NimbusError::Authentication(format!(
                    "Failed to acquire Azure AD token for {scope}: {e}"
                ))
            })?;

        Ok(token.token.secret().to_string())
    }
}

/// Token provider that always returns the same token
///
/// Useful against local emulators and in tests.
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    /// Create a provider returning `token` for every scope
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn bearer_token(&self, _scope: &str) -> Result<String> {
        Ok(self.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;

    #[tokio::test]
    async fn test_static_token_provider() {
        let provider = StaticTokenProvider::new("token-123");
        assert_eq!(
            provider.bearer_token(MANAGEMENT_SCOPE).await.unwrap(),
            "token-123"
        );
        assert_eq!(provider.bearer_token(STORAGE_SCOPE).await.unwrap(), "token-123");
    }

    #[test]
    fn test_client_secret_missing_tenant() {
        let identity = IdentityConfig {
            auth_method: AuthMethod::ClientSecret,
            client_id: Some("client".to_string()),
            client_secret: Some(secret_string("secret".to_string())),
            ..Default::default()
        };

        let result = AzureTokenProvider::from_config(&identity);
        match result {
            Err(NimbusError::Configuration(msg)) => assert!(msg.contains("tenant_id")),
            _ => panic!("Expected Configuration error"),
        }
    }

    #[test]
    fn test_client_secret_credential_construction() {
        let identity = IdentityConfig {
            auth_method: AuthMethod::ClientSecret,
            tenant_id: Some("00000000-0000-0000-0000-000000000000".to_string()),
            client_id: Some("11111111-1111-1111-1111-111111111111".to_string()),
            client_secret: Some(secret_string("secret".to_string())),
            ..Default::default()
        };

        let provider = AzureTokenProvider::from_config(&identity).unwrap();
        assert_eq!(provider.method(), AuthMethod::ClientSecret);
    }
}

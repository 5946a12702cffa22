use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Deserialize;
use std::time::Duration;

use crate::config::OidcConfig;

/// Validation of tokens issued by an external OIDC provider.
#[async_trait]
pub trait OidcProvider: Send + Sync {
    async fn is_valid(&self, token: &str) -> Result<bool, anyhow::Error>;

    /// Registry name under which the provider's subjects are mapped
    fn registry(&self) -> Option<&str>;
}

#[derive(Debug, Deserialize)]
struct IntrospectionResponse {
    #[serde(default)]
    active: bool,
}

/// RFC 7662 token introspection.
pub struct IntrospectionOidcProvider {
    client: reqwest::Client,
    config: OidcConfig,
}

impl IntrospectionOidcProvider {
    pub fn new(config: OidcConfig, timeout: Duration) -> Result<Self, anyhow::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        tracing::info!(
            url = %config.introspection_url,
            registry = %config.registry,
            "OIDC introspection enabled"
        );

        Ok(Self { client, config })
    }
}

#[async_trait]
impl OidcProvider for IntrospectionOidcProvider {
    async fn is_valid(&self, token: &str) -> Result<bool, anyhow::Error> {
        let response = self
            .client
            .post(&self.config.introspection_url)
            .basic_auth(
                &self.config.client_id,
                Some(self.config.client_secret.expose_secret()),
            )
            .form(&[("token", token), ("token_type_hint", "access_token")])
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Introspection request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "Introspection endpoint returned {}",
                response.status()
            ));
        }

        let body: IntrospectionResponse = response
            .json()
            .await
            .map_err(|e| anyhow::anyhow!("Invalid introspection response: {}", e))?;

        Ok(body.active)
    }

    fn registry(&self) -> Option<&str> {
        Some(&self.config.registry)
    }
}

/// Used when no provider is configured: no OIDC token is ever valid.
#[derive(Debug, Default)]
pub struct DisabledOidcProvider;

#[async_trait]
impl OidcProvider for DisabledOidcProvider {
    async fn is_valid(&self, _token: &str) -> Result<bool, anyhow::Error> {
        Ok(false)
    }

    fn registry(&self) -> Option<&str> {
        None
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mock_zos::PassTicketService;
use std::sync::Arc;

use crate::models::{Origin, Parsed};
use crate::services::error::TokenError;
use crate::services::invalidation::InvalidationStore;
use crate::services::jwt::{ApimlClaims, JwtService};
use crate::utils::fingerprint;

/// Parsing of gateway tokens and exchange of identities for new tokens.
#[async_trait]
pub trait IdentityMapper: Send + Sync {
    /// Signature and expiry are checked, invalidation is not.
    async fn parse_jwt_with_signature(&self, token: &str) -> Result<Parsed, TokenError>;

    /// Claims only. Callers must establish validity some other way.
    fn parse_jwt_token(&self, token: &str) -> Result<Parsed, TokenError>;

    /// Full check of a gateway JWT, including logout invalidation.
    async fn validate_jwt_token(&self, token: &str) -> Result<Parsed, TokenError>;

    async fn get_ltpa_token(&self, jwt: &str) -> Result<Option<String>, TokenError>;

    /// Mint a gateway JWT for an identity that was already authenticated by
    /// other means.
    async fn create_jwt_token_without_credentials(
        &self,
        user_id: &str,
    ) -> Result<String, TokenError>;
}

pub struct AuthenticationService {
    jwt: JwtService,
    passtickets: Arc<dyn PassTicketService>,
    invalidation: Arc<dyn InvalidationStore>,
    gateway_applid: String,
}

impl AuthenticationService {
    pub fn new(
        jwt: JwtService,
        passtickets: Arc<dyn PassTicketService>,
        invalidation: Arc<dyn InvalidationStore>,
        gateway_applid: &str,
    ) -> Self {
        Self {
            jwt,
            passtickets,
            invalidation,
            gateway_applid: gateway_applid.to_string(),
        }
    }

    fn invalidation_key(token: &str) -> String {
        format!("jwt:{}", fingerprint(token))
    }

    /// Invalidate a gateway JWT until its own expiry.
    pub async fn invalidate_jwt_token(&self, token: &str) -> Result<(), TokenError> {
        let claims = self.jwt.verify(token)?;
        let expires_at = claims.expires_at().ok_or(TokenError::NotValid)?;

        self.invalidation
            .put(&Self::invalidation_key(token), "logout", expires_at)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Failed to store JWT invalidation");
                TokenError::Exchange(e.to_string())
            })?;

        tracing::info!(user_id = %claims.sub, "JWT invalidated");
        Ok(())
    }

    async fn is_invalidated(&self, token: &str) -> Result<bool, anyhow::Error> {
        Ok(self
            .invalidation
            .get(&Self::invalidation_key(token))
            .await?
            .is_some())
    }
}

fn parsed_from_claims(claims: &ApimlClaims, token: &str) -> Parsed {
    Parsed {
        user_id: claims.sub.clone(),
        creation: claims.issued_at(),
        expiration: claims.expires_at(),
        origin: Origin::from_issuer(&claims.iss),
        raw_token: Some(token.to_string()),
    }
}

fn timestamp(seconds: Option<i64>) -> Option<DateTime<Utc>> {
    seconds.and_then(|s| DateTime::from_timestamp(s, 0))
}

#[async_trait]
impl IdentityMapper for AuthenticationService {
    async fn parse_jwt_with_signature(&self, token: &str) -> Result<Parsed, TokenError> {
        let claims = self.jwt.verify(token)?;
        Ok(parsed_from_claims(&claims, token))
    }

    fn parse_jwt_token(&self, token: &str) -> Result<Parsed, TokenError> {
        let claims = JwtService::decode_unverified(token)?;
        let user_id = claims.sub.ok_or(TokenError::NotValid)?;
        let origin = claims
            .iss
            .as_deref()
            .map(Origin::from_issuer)
            .unwrap_or(Origin::Oidc);

        Ok(Parsed {
            user_id,
            creation: timestamp(claims.iat),
            expiration: timestamp(claims.exp),
            origin,
            raw_token: Some(token.to_string()),
        })
    }

    async fn validate_jwt_token(&self, token: &str) -> Result<Parsed, TokenError> {
        let parsed = self.parse_jwt_with_signature(token).await?;

        let invalidated = self.is_invalidated(token).await.map_err(|e| {
            tracing::warn!(error = %e, "Invalidation lookup failed");
            TokenError::NotValid
        })?;
        if invalidated {
            return Err(TokenError::Invalidated);
        }

        Ok(parsed)
    }

    async fn get_ltpa_token(&self, jwt: &str) -> Result<Option<String>, TokenError> {
        let claims = self.jwt.verify(jwt)?;
        Ok(claims.ltpa)
    }

    async fn create_jwt_token_without_credentials(
        &self,
        user_id: &str,
    ) -> Result<String, TokenError> {
        // A PassTicket for the gateway applid stands in for the password.
        let ticket = self
            .passtickets
            .generate(user_id, &self.gateway_applid)
            .map_err(|e| TokenError::Exchange(e.to_string()))?;
        self.passtickets
            .evaluate(user_id, &self.gateway_applid, &ticket)
            .map_err(|e| TokenError::Exchange(e.to_string()))?;

        self.jwt
            .issue_jwt(user_id, None)
            .map_err(|e| TokenError::Exchange(e.to_string()))
    }
}

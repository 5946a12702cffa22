use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use crate::models::ZOWE_PAT_ISSUER;
use crate::services::error::TokenError;
use crate::services::invalidation::InvalidationStore;
use crate::services::jwt::{ApimlClaims, JwtService};
use crate::utils::fingerprint;

/// Issuing and checking personal access tokens.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// A PAT is usable for a service only if one of its scopes names it.
    async fn is_valid_for_scopes(&self, token: &str, service_id: &str) -> bool;

    async fn is_invalidated(&self, token: &str) -> Result<bool, anyhow::Error>;

    async fn get_token(
        &self,
        user_id: &str,
        validity_seconds: i64,
        scopes: &[String],
    ) -> Result<String, anyhow::Error>;
}

pub struct AccessTokenProvider {
    jwt: JwtService,
    invalidation: Arc<dyn InvalidationStore>,
    default_validity_seconds: i64,
    max_validity_seconds: i64,
}

impl AccessTokenProvider {
    pub fn new(
        jwt: JwtService,
        invalidation: Arc<dyn InvalidationStore>,
        default_validity_seconds: i64,
        max_validity_seconds: i64,
    ) -> Self {
        Self {
            jwt,
            invalidation,
            default_validity_seconds,
            max_validity_seconds,
        }
    }

    fn token_key(token: &str) -> String {
        format!("pat:{}", fingerprint(token))
    }

    fn user_key(user_id: &str) -> String {
        format!("pat:user:{}", user_id.to_uppercase())
    }

    fn scope_key(service_id: &str) -> String {
        format!("pat:scope:{}", service_id.to_lowercase())
    }

    /// Validity `0` or beyond the maximum falls back to the default.
    pub fn effective_validity(&self, requested_seconds: i64) -> i64 {
        if requested_seconds <= 0 || requested_seconds > self.max_validity_seconds {
            self.default_validity_seconds
        } else {
            requested_seconds
        }
    }

    fn verify_pat(&self, token: &str) -> Result<ApimlClaims, TokenError> {
        let claims = self.jwt.verify(token)?;
        if claims.iss != ZOWE_PAT_ISSUER {
            return Err(TokenError::NotValid);
        }
        Ok(claims)
    }

    // Rules must outlive every token they could match.
    fn rule_expiry(&self) -> DateTime<Utc> {
        Utc::now() + Duration::seconds(self.max_validity_seconds.max(self.default_validity_seconds))
    }

    /// Revoke one token. Revoking it twice is an error.
    pub async fn invalidate_token(&self, token: &str) -> Result<(), TokenError> {
        let claims = self.verify_pat(token)?;

        let already = self.is_invalidated(token).await.map_err(|e| {
            tracing::warn!(error = %e, "Invalidation lookup failed");
            TokenError::Exchange(e.to_string())
        })?;
        if already {
            return Err(TokenError::Invalidated);
        }

        let expires_at = claims.expires_at().ok_or(TokenError::NotValid)?;
        self.invalidation
            .put(&Self::token_key(token), "revoked", expires_at)
            .await
            .map_err(|e| TokenError::Exchange(e.to_string()))?;

        tracing::info!(user_id = %claims.sub, "Personal access token revoked");
        Ok(())
    }

    /// Revoke every token of `user_id` issued up to now.
    pub async fn invalidate_all_tokens_for_user(&self, user_id: &str) -> Result<(), anyhow::Error> {
        let revoked_at = Utc::now().timestamp();
        self.invalidation
            .put(
                &Self::user_key(user_id),
                &revoked_at.to_string(),
                self.rule_expiry(),
            )
            .await?;

        tracing::info!(user_id = %user_id, "All personal access tokens of user revoked");
        Ok(())
    }

    /// Revoke every token scoped to `service_id` issued up to now.
    pub async fn invalidate_all_tokens_for_service(
        &self,
        service_id: &str,
    ) -> Result<(), anyhow::Error> {
        let revoked_at = Utc::now().timestamp();
        self.invalidation
            .put(
                &Self::scope_key(service_id),
                &revoked_at.to_string(),
                self.rule_expiry(),
            )
            .await?;

        tracing::info!(service_id = %service_id, "All personal access tokens of service revoked");
        Ok(())
    }

    // `iat` has second precision, so a rule covers the whole second it was set in.
    async fn revoked_by_rule(&self, key: &str, issued_at: i64) -> Result<bool, anyhow::Error> {
        let Some(value) = self.invalidation.get(key).await? else {
            return Ok(false);
        };
        let revoked_at: i64 = value
            .parse()
            .map_err(|e| anyhow::anyhow!("Corrupt revocation rule {}: {}", key, e))?;
        Ok(issued_at <= revoked_at)
    }
}

#[async_trait]
impl TokenProvider for AccessTokenProvider {
    async fn is_valid_for_scopes(&self, token: &str, service_id: &str) -> bool {
        match self.verify_pat(token) {
            Ok(claims) => claims
                .scopes
                .iter()
                .any(|scope| scope.eq_ignore_ascii_case(service_id)),
            Err(e) => {
                tracing::debug!(error = %e, "Personal access token rejected");
                false
            }
        }
    }

    async fn is_invalidated(&self, token: &str) -> Result<bool, anyhow::Error> {
        if self.invalidation.get(&Self::token_key(token)).await?.is_some() {
            return Ok(true);
        }

        // Rules need the claims; an unreadable token is simply not valid.
        let claims = match self.jwt.verify(token) {
            Ok(claims) => claims,
            Err(_) => return Ok(false),
        };
        if self
            .revoked_by_rule(&Self::user_key(&claims.sub), claims.iat)
            .await?
        {
            return Ok(true);
        }

        for scope in &claims.scopes {
            if self
                .revoked_by_rule(&Self::scope_key(scope), claims.iat)
                .await?
            {
                return Ok(true);
            }
        }

        Ok(false)
    }

    async fn get_token(
        &self,
        user_id: &str,
        validity_seconds: i64,
        scopes: &[String],
    ) -> Result<String, anyhow::Error> {
        let validity = self.effective_validity(validity_seconds);
        let token = self.jwt.issue_pat(user_id, validity, scopes)?;

        tracing::info!(
            user_id = %user_id,
            validity_seconds = validity,
            scopes = ?scopes,
            "Personal access token issued"
        );
        Ok(token)
    }
}

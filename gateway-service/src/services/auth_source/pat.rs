use async_trait::async_trait;
use std::sync::Arc;

use super::{get_token_origin, AuthSourceService, RequestCredentials, PAT_COOKIE, PAT_HEADER};
use crate::models::{AuthSource, Origin, Parsed};
use crate::services::access_token::TokenProvider;
use crate::services::authentication::IdentityMapper;
use crate::services::error::TokenError;
use crate::utils::cookies;

/// Personal access tokens.
pub struct PatAuthSourceService {
    identity: Arc<dyn IdentityMapper>,
    tokens: Arc<dyn TokenProvider>,
}

impl PatAuthSourceService {
    pub fn new(identity: Arc<dyn IdentityMapper>, tokens: Arc<dyn TokenProvider>) -> Self {
        Self { identity, tokens }
    }
}

#[async_trait]
impl AuthSourceService for PatAuthSourceService {
    fn get_auth_source_from_request(
        &self,
        request: &RequestCredentials<'_>,
    ) -> Option<AuthSource> {
        cookies::get_cookie(request.headers, PAT_COOKIE)
            .or_else(|| cookies::header_value(request.headers, PAT_HEADER).map(str::to_string))
            .or_else(|| {
                cookies::bearer_token(request.headers)
                    .filter(|token| get_token_origin(token) == Origin::ZowePat)
                    .map(str::to_string)
            })
            .map(AuthSource::Pat)
    }

    async fn is_valid(&self, source: &AuthSource, service_id: &str) -> bool {
        let AuthSource::Pat(token) = source else {
            return false;
        };

        if !self.tokens.is_valid_for_scopes(token, service_id).await {
            return false;
        }

        match self.tokens.is_invalidated(token).await {
            Ok(invalidated) => !invalidated,
            Err(e) => {
                tracing::warn!(error = %e, "Could not check PAT invalidation");
                false
            }
        }
    }

    async fn parse(&self, source: &AuthSource) -> Result<Option<Parsed>, TokenError> {
        match source {
            AuthSource::Pat(token) => self.identity.parse_jwt_with_signature(token).await.map(Some),
            _ => Ok(None),
        }
    }

    async fn get_jwt(&self, source: &AuthSource) -> Result<Option<String>, TokenError> {
        let Some(parsed) = self.parse(source).await? else {
            return Ok(None);
        };

        self.identity
            .create_jwt_token_without_credentials(&parsed.user_id)
            .await
            .map(Some)
    }

    async fn get_ltpa_token(&self, source: &AuthSource) -> Result<Option<String>, TokenError> {
        match self.get_jwt(source).await? {
            Some(jwt) => self.identity.get_ltpa_token(&jwt).await,
            None => Ok(None),
        }
    }
}

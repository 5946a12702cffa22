use async_trait::async_trait;
use std::sync::Arc;

use super::{get_token_origin, AuthSourceService, RequestCredentials};
use crate::models::{AuthSource, Origin, Parsed};
use crate::services::authentication::IdentityMapper;
use crate::services::error::TokenError;
use crate::utils::cookies;

/// Gateway JWTs from the authentication cookie or a bearer header.
pub struct JwtAuthSourceService {
    identity: Arc<dyn IdentityMapper>,
    cookie_name: String,
}

impl JwtAuthSourceService {
    pub fn new(identity: Arc<dyn IdentityMapper>, cookie_name: &str) -> Self {
        Self {
            identity,
            cookie_name: cookie_name.to_string(),
        }
    }
}

#[async_trait]
impl AuthSourceService for JwtAuthSourceService {
    fn get_auth_source_from_request(
        &self,
        request: &RequestCredentials<'_>,
    ) -> Option<AuthSource> {
        if let Some(token) = cookies::get_cookie(request.headers, &self.cookie_name) {
            return Some(AuthSource::Jwt(token));
        }

        cookies::bearer_token(request.headers)
            .filter(|token| matches!(get_token_origin(token), Origin::Zowe | Origin::Zosmf))
            .map(|token| AuthSource::Jwt(token.to_string()))
    }

    async fn is_valid(&self, source: &AuthSource, _service_id: &str) -> bool {
        let AuthSource::Jwt(token) = source else {
            return false;
        };

        match self.identity.validate_jwt_token(token).await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(error = %e, "JWT rejected");
                false
            }
        }
    }

    async fn parse(&self, source: &AuthSource) -> Result<Option<Parsed>, TokenError> {
        match source {
            AuthSource::Jwt(token) => self.identity.parse_jwt_with_signature(token).await.map(Some),
            _ => Ok(None),
        }
    }

    async fn get_jwt(&self, source: &AuthSource) -> Result<Option<String>, TokenError> {
        match source {
            AuthSource::Jwt(token) => Ok(Some(token.clone())),
            _ => Ok(None),
        }
    }

    async fn get_ltpa_token(&self, source: &AuthSource) -> Result<Option<String>, TokenError> {
        match source {
            AuthSource::Jwt(token) => self.identity.get_ltpa_token(token).await,
            _ => Ok(None),
        }
    }
}

use async_trait::async_trait;
use std::sync::Arc;

use super::{get_token_origin, AuthSourceService, RequestCredentials};
use crate::models::{AuthSource, Origin, Parsed};
use crate::services::authentication::IdentityMapper;
use crate::services::error::TokenError;
use crate::services::identity_mapping::IdentityMappingService;
use crate::services::oidc::OidcProvider;
use crate::utils::cookies;

/// Access tokens issued by an external OIDC provider. The distributed
/// identity in `sub` is mapped to a mainframe user.
pub struct OAuth2AuthSourceService {
    identity: Arc<dyn IdentityMapper>,
    oidc: Arc<dyn OidcProvider>,
    mappings: Arc<IdentityMappingService>,
}

impl OAuth2AuthSourceService {
    pub fn new(
        identity: Arc<dyn IdentityMapper>,
        oidc: Arc<dyn OidcProvider>,
        mappings: Arc<IdentityMappingService>,
    ) -> Self {
        Self {
            identity,
            oidc,
            mappings,
        }
    }
}

#[async_trait]
impl AuthSourceService for OAuth2AuthSourceService {
    fn get_auth_source_from_request(
        &self,
        request: &RequestCredentials<'_>,
    ) -> Option<AuthSource> {
        cookies::bearer_token(request.headers)
            .filter(|token| get_token_origin(token) == Origin::Oidc)
            .map(|token| AuthSource::OAuth2(token.to_string()))
    }

    async fn is_valid(&self, source: &AuthSource, _service_id: &str) -> bool {
        let AuthSource::OAuth2(token) = source else {
            return false;
        };

        match self.oidc.is_valid(token).await {
            Ok(active) => active,
            Err(e) => {
                tracing::warn!(error = %e, "OIDC token validation failed");
                false
            }
        }
    }

    async fn parse(&self, source: &AuthSource) -> Result<Option<Parsed>, TokenError> {
        let AuthSource::OAuth2(token) = source else {
            return Ok(None);
        };

        let parsed = self.identity.parse_jwt_token(token)?;
        let registry = self.oidc.registry().ok_or(TokenError::NotValid)?;
        let mainframe_id = self
            .mappings
            .map(registry, &parsed.user_id)
            .ok_or_else(|| {
                tracing::debug!(registry = %registry, "No mainframe identity mapped");
                TokenError::NotValid
            })?;

        Ok(Some(Parsed {
            user_id: mainframe_id.to_string(),
            origin: Origin::Oidc,
            ..parsed
        }))
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IdentityMappingEntry;
    use crate::services::jwt::{ApimlClaims, JwtService};
    use crate::services::testing::{Fixture, StaticOidcProvider};
    use chrono::Utc;

    fn idp_token(subject: &str) -> String {
        let now = Utc::now().timestamp();
        JwtService::from_secret(b"idp-key", 60)
            .sign(&ApimlClaims {
                sub: subject.to_string(),
                iat: now,
                exp: now + 300,
                iss: "https://idp.example.com".to_string(),
                jti: "1".to_string(),
                scopes: Vec::new(),
                ltpa: None,
            })
            .unwrap()
    }

    fn service(fixture: &Fixture, active: bool) -> OAuth2AuthSourceService {
        OAuth2AuthSourceService::new(
            fixture.identity.clone(),
            Arc::new(StaticOidcProvider {
                active,
                registry: "okta".to_string(),
            }),
            Arc::new(IdentityMappingService::new(&[IdentityMappingEntry {
                user_name: "Jane".to_string(),
                distributed_id: "jane@example.com".to_string(),
                mainframe_id: "JANE".to_string(),
                registry: "okta".to_string(),
            }])),
        )
    }

    #[tokio::test]
    async fn mapped_subject_becomes_mainframe_user() {
        let fixture = Fixture::new();
        let source = AuthSource::OAuth2(idp_token("jane@example.com"));
        let oauth2 = service(&fixture, true);

        assert!(oauth2.is_valid(&source, "cics").await);
        let parsed = oauth2.parse(&source).await.unwrap().unwrap();
        assert_eq!(parsed.user_id, "JANE");
        assert_eq!(parsed.origin, Origin::Oidc);
    }

    #[tokio::test]
    async fn unmapped_subject_is_not_valid() {
        let fixture = Fixture::new();
        let source = AuthSource::OAuth2(idp_token("stranger@example.com"));

        assert_eq!(
            service(&fixture, true).parse(&source).await,
            Err(TokenError::NotValid)
        );
    }

    #[tokio::test]
    async fn inactive_token_is_invalid() {
        let fixture = Fixture::new();
        let source = AuthSource::OAuth2(idp_token("jane@example.com"));
        assert!(!service(&fixture, false).is_valid(&source, "cics").await);
    }
}

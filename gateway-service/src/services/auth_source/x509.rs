use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use super::{AuthSourceService, RequestCredentials};
use crate::models::{AuthSource, Origin, Parsed};
use crate::services::authentication::IdentityMapper;
use crate::services::error::TokenError;
use crate::services::identity_mapping::IdentityMappingService;

/// Client certificates placed in the request extensions by the TLS layer.
pub struct X509AuthSourceService {
    identity: Arc<dyn IdentityMapper>,
    mappings: Arc<IdentityMappingService>,
}

impl X509AuthSourceService {
    pub fn new(identity: Arc<dyn IdentityMapper>, mappings: Arc<IdentityMappingService>) -> Self {
        Self { identity, mappings }
    }
}

#[async_trait]
impl AuthSourceService for X509AuthSourceService {
    fn get_auth_source_from_request(
        &self,
        request: &RequestCredentials<'_>,
    ) -> Option<AuthSource> {
        request.certificate.cloned().map(AuthSource::ClientCert)
    }

    async fn is_valid(&self, source: &AuthSource, _service_id: &str) -> bool {
        let AuthSource::ClientCert(certificate) = source else {
            return false;
        };

        !certificate.is_expired_at(Utc::now())
            && self.mappings.map_certificate(certificate).is_some()
    }

    async fn parse(&self, source: &AuthSource) -> Result<Option<Parsed>, TokenError> {
        let AuthSource::ClientCert(certificate) = source else {
            return Ok(None);
        };

        if certificate.is_expired_at(Utc::now()) {
            return Err(TokenError::Expired);
        }
        let user_id = self
            .mappings
            .map_certificate(certificate)
            .ok_or(TokenError::NotValid)?;

        Ok(Some(Parsed {
            user_id,
            creation: None,
            expiration: certificate.not_after,
            origin: Origin::X509,
            raw_token: None,
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

//! Extraction and validation of caller credentials.
//!
//! Each credential kind has its own service; [`DefaultAuthSourceService`]
//! dispatches on the [`AuthSource`] variant and is what the rest of the
//! gateway talks to. Extraction order, first match wins:
//!
//! 1. TLS client certificate
//! 2. gateway JWT cookie
//! 3. PAT cookie or `PRIVATE-TOKEN` header
//! 4. `Authorization: Bearer`, classified by the token issuer

mod jwt;
mod oauth2;
mod pat;
mod x509;

pub use jwt::JwtAuthSourceService;
pub use oauth2::OAuth2AuthSourceService;
pub use pat::PatAuthSourceService;
pub use x509::X509AuthSourceService;

use async_trait::async_trait;
use http::HeaderMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::models::{AuthSource, ClientCertificate, Origin, Parsed};
use crate::services::access_token::TokenProvider;
use crate::services::authentication::IdentityMapper;
use crate::services::error::TokenError;
use crate::services::identity_mapping::IdentityMappingService;
use crate::services::jwt::JwtService;
use crate::services::metrics;
use crate::services::oidc::OidcProvider;

pub const PAT_COOKIE: &str = "personalAccessToken";
pub const PAT_HEADER: &str = "PRIVATE-TOKEN";

/// The parts of an inbound request that can carry credentials.
#[derive(Debug, Clone, Copy)]
pub struct RequestCredentials<'a> {
    pub headers: &'a HeaderMap,
    pub certificate: Option<&'a ClientCertificate>,
}

impl<'a> RequestCredentials<'a> {
    pub fn new(headers: &'a HeaderMap, certificate: Option<&'a ClientCertificate>) -> Self {
        Self {
            headers,
            certificate,
        }
    }

    pub fn from_parts(parts: &'a http::request::Parts) -> Self {
        Self::new(&parts.headers, parts.extensions.get::<ClientCertificate>())
    }
}

/// Who issued a bearer token, judged from its unverified `iss` claim.
/// Anything that is not a readable JWT is treated as an OIDC access token.
pub fn get_token_origin(raw_token: &str) -> Origin {
    match JwtService::decode_unverified(raw_token) {
        Ok(claims) => claims
            .iss
            .as_deref()
            .map(Origin::from_issuer)
            .unwrap_or(Origin::Oidc),
        Err(_) => Origin::Oidc,
    }
}

#[async_trait]
pub trait AuthSourceService: Send + Sync {
    fn get_auth_source_from_request(&self, request: &RequestCredentials<'_>)
        -> Option<AuthSource>;

    /// Never errors: any fault while checking counts as invalid.
    async fn is_valid(&self, source: &AuthSource, service_id: &str) -> bool;

    /// `Ok(None)` when the source is not of this service's kind.
    async fn parse(&self, source: &AuthSource) -> Result<Option<Parsed>, TokenError>;

    /// Gateway JWT for the source, minting one when needed.
    async fn get_jwt(&self, source: &AuthSource) -> Result<Option<String>, TokenError>;

    async fn get_ltpa_token(&self, source: &AuthSource) -> Result<Option<String>, TokenError>;
}

pub struct DefaultAuthSourceService {
    jwt: JwtAuthSourceService,
    pat: PatAuthSourceService,
    oauth2: OAuth2AuthSourceService,
    x509: X509AuthSourceService,
    timeout: Duration,
}

impl DefaultAuthSourceService {
    pub fn new(
        identity: Arc<dyn IdentityMapper>,
        tokens: Arc<dyn TokenProvider>,
        oidc: Arc<dyn OidcProvider>,
        mappings: Arc<IdentityMappingService>,
        jwt_cookie_name: &str,
        timeout: Duration,
    ) -> Self {
        Self {
            jwt: JwtAuthSourceService::new(identity.clone(), jwt_cookie_name),
            pat: PatAuthSourceService::new(identity.clone(), tokens),
            oauth2: OAuth2AuthSourceService::new(identity.clone(), oidc, mappings.clone()),
            x509: X509AuthSourceService::new(identity, mappings),
            timeout,
        }
    }

    fn service_for(&self, source: &AuthSource) -> &dyn AuthSourceService {
        match source {
            AuthSource::Jwt(_) => &self.jwt,
            AuthSource::Pat(_) => &self.pat,
            AuthSource::OAuth2(_) => &self.oauth2,
            AuthSource::ClientCert(_) => &self.x509,
        }
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        future: impl Future<Output = Result<T, TokenError>> + Send,
    ) -> Result<T, TokenError> {
        match tokio::time::timeout(self.timeout, future).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(operation = operation, "Credential service timed out");
                Err(TokenError::NotValid)
            }
        }
    }
}

#[async_trait]
impl AuthSourceService for DefaultAuthSourceService {
    fn get_auth_source_from_request(
        &self,
        request: &RequestCredentials<'_>,
    ) -> Option<AuthSource> {
        self.x509
            .get_auth_source_from_request(request)
            .or_else(|| self.jwt.get_auth_source_from_request(request))
            .or_else(|| self.pat.get_auth_source_from_request(request))
            .or_else(|| self.oauth2.get_auth_source_from_request(request))
    }

    async fn is_valid(&self, source: &AuthSource, service_id: &str) -> bool {
        let service = self.service_for(source);
        let valid = match tokio::time::timeout(self.timeout, service.is_valid(source, service_id))
            .await
        {
            Ok(valid) => valid,
            Err(_) => {
                tracing::warn!(
                    source_type = source.source_type().as_str(),
                    "Credential validation timed out"
                );
                false
            }
        };

        if !valid {
            tracing::debug!(
                source_type = source.source_type().as_str(),
                service_id = %service_id,
                "Credential rejected"
            );
        }
        metrics::record_auth_source(source.source_type(), valid);
        valid
    }

    async fn parse(&self, source: &AuthSource) -> Result<Option<Parsed>, TokenError> {
        self.bounded("parse", self.service_for(source).parse(source))
            .await
    }

    async fn get_jwt(&self, source: &AuthSource) -> Result<Option<String>, TokenError> {
        self.bounded("get_jwt", self.service_for(source).get_jwt(source))
            .await
    }

    async fn get_ltpa_token(&self, source: &AuthSource) -> Result<Option<String>, TokenError> {
        self.bounded(
            "get_ltpa_token",
            self.service_for(source).get_ltpa_token(source),
        )
        .await
    }
}

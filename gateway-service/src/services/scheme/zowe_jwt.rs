use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Arc;

use super::{expire_at, parse_required, AuthenticationSchemeHandler};
use crate::models::{
    AuthSource, Authentication, AuthenticationCommand, AuthenticationScheme, OutboundCredential,
};
use crate::services::auth_source::AuthSourceService;
use crate::services::error::AuthSchemeError;

/// Forwards a gateway JWT in the authentication cookie. Non-JWT sources are
/// exchanged for a freshly minted token.
pub struct ZoweJwtScheme {
    sources: Arc<dyn AuthSourceService>,
    cookie_name: String,
    default_expiration: Duration,
}

impl ZoweJwtScheme {
    pub fn new(
        sources: Arc<dyn AuthSourceService>,
        cookie_name: &str,
        default_expiration: Duration,
    ) -> Self {
        Self {
            sources,
            cookie_name: cookie_name.to_string(),
            default_expiration,
        }
    }
}

#[async_trait]
impl AuthenticationSchemeHandler for ZoweJwtScheme {
    fn scheme(&self) -> AuthenticationScheme {
        AuthenticationScheme::ZoweJwt
    }

    async fn create_command(
        &self,
        _authentication: &Authentication,
        source: Option<&AuthSource>,
    ) -> Result<AuthenticationCommand, AuthSchemeError> {
        let parsed = parse_required(self.sources.as_ref(), source).await?;
        let source = source.ok_or(AuthSchemeError::MissingAuthentication)?;

        let jwt = self
            .sources
            .get_jwt(source)
            .await?
            .ok_or(AuthSchemeError::MissingAuthentication)?;

        Ok(AuthenticationCommand::new(
            OutboundCredential::Cookie {
                name: self.cookie_name.clone(),
                value: jwt,
            },
            Some(expire_at(Utc::now(), self.default_expiration, parsed.expiration)),
        ))
    }
}

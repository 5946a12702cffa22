use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Arc;

use super::{expire_at, parse_required, AuthenticationSchemeHandler};
use crate::models::{
    AuthSource, Authentication, AuthenticationCommand, AuthenticationScheme, OutboundCredential,
};
use crate::services::auth_source::AuthSourceService;
use crate::services::error::AuthSchemeError;

pub const LTPA_COOKIE: &str = "LtpaToken2";

/// z/OSMF accepts the LTPA token carried inside the caller's gateway JWT.
pub struct ZosmfScheme {
    sources: Arc<dyn AuthSourceService>,
    jwt_cookie_name: String,
    default_expiration: Duration,
}

impl ZosmfScheme {
    pub fn new(
        sources: Arc<dyn AuthSourceService>,
        jwt_cookie_name: &str,
        default_expiration: Duration,
    ) -> Self {
        Self {
            sources,
            jwt_cookie_name: jwt_cookie_name.to_string(),
            default_expiration,
        }
    }
}

#[async_trait]
impl AuthenticationSchemeHandler for ZosmfScheme {
    fn scheme(&self) -> AuthenticationScheme {
        AuthenticationScheme::Zosmf
    }

    async fn create_command(
        &self,
        _authentication: &Authentication,
        source: Option<&AuthSource>,
    ) -> Result<AuthenticationCommand, AuthSchemeError> {
        let parsed = parse_required(self.sources.as_ref(), source).await?;
        let source = source.ok_or(AuthSchemeError::MissingAuthentication)?;

        let ltpa = self
            .sources
            .get_ltpa_token(source)
            .await?
            .ok_or(AuthSchemeError::MissingLtpa)?;

        let command = AuthenticationCommand::new(
            OutboundCredential::Cookie {
                name: LTPA_COOKIE.to_string(),
                value: ltpa,
            },
            Some(expire_at(Utc::now(), self.default_expiration, parsed.expiration)),
        );
        Ok(command.removing_cookie(&self.jwt_cookie_name))
    }
}

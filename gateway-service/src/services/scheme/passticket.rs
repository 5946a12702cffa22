use async_trait::async_trait;
use chrono::{Duration, Utc};
use mock_zos::PassTicketService;
use std::sync::Arc;

use super::{expire_at, parse_required, AuthenticationSchemeHandler};
use crate::models::{
    AuthSource, Authentication, AuthenticationCommand, AuthenticationScheme, OutboundCredential,
};
use crate::services::auth_source::AuthSourceService;
use crate::services::error::AuthSchemeError;
use crate::services::metrics;

/// Basic authentication with a PassTicket for the route's applid in place of
/// the password.
pub struct HttpBasicPassticketScheme {
    sources: Arc<dyn AuthSourceService>,
    passtickets: Arc<dyn PassTicketService>,
    jwt_cookie_name: String,
    default_expiration: Duration,
}

impl HttpBasicPassticketScheme {
    pub fn new(
        sources: Arc<dyn AuthSourceService>,
        passtickets: Arc<dyn PassTicketService>,
        jwt_cookie_name: &str,
        default_expiration: Duration,
    ) -> Self {
        Self {
            sources,
            passtickets,
            jwt_cookie_name: jwt_cookie_name.to_string(),
            default_expiration,
        }
    }
}

#[async_trait]
impl AuthenticationSchemeHandler for HttpBasicPassticketScheme {
    fn scheme(&self) -> AuthenticationScheme {
        AuthenticationScheme::HttpBasicPassticket
    }

    async fn create_command(
        &self,
        authentication: &Authentication,
        source: Option<&AuthSource>,
    ) -> Result<AuthenticationCommand, AuthSchemeError> {
        let parsed = parse_required(self.sources.as_ref(), source).await?;
        let applid = authentication
            .applid
            .as_deref()
            .filter(|applid| !applid.is_empty())
            .ok_or(AuthSchemeError::MissingApplid)?;

        let ticket = self
            .passtickets
            .generate(&parsed.user_id, applid)
            .map_err(|e| {
                tracing::warn!(applid = %applid, error = %e, "PassTicket generation failed");
                e
            })?;
        metrics::record_passticket_generated(applid);

        let command = AuthenticationCommand::new(
            OutboundCredential::BasicAuth {
                user_id: parsed.user_id,
                password: ticket,
            },
            Some(expire_at(Utc::now(), self.default_expiration, parsed.expiration)),
        );
        Ok(command.removing_cookie(&self.jwt_cookie_name))
    }
}

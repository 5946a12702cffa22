use async_trait::async_trait;

use super::AuthenticationSchemeHandler;
use crate::models::{AuthSource, Authentication, AuthenticationCommand, AuthenticationScheme};
use crate::services::error::AuthSchemeError;

/// Requests are forwarded without any credential attached.
pub struct BypassScheme;

#[async_trait]
impl AuthenticationSchemeHandler for BypassScheme {
    fn scheme(&self) -> AuthenticationScheme {
        AuthenticationScheme::Bypass
    }

    fn is_required_valid_source(&self) -> bool {
        false
    }

    async fn create_command(
        &self,
        _authentication: &Authentication,
        _source: Option<&AuthSource>,
    ) -> Result<AuthenticationCommand, AuthSchemeError> {
        Ok(AuthenticationCommand::EMPTY)
    }
}

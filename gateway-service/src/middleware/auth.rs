use axum::{extract::FromRequestParts, http::request::Parts};
use service_core::error::AppError;

use crate::models::{AuthSource, Parsed};
use crate::services::{AuthSourceService, RequestCredentials};
use crate::AppState;

/// Caller authenticated with any supported credential, validated against the
/// gateway's own service id.
pub struct AuthUser {
    pub source: AuthSource,
    pub parsed: Parsed,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let source = state
            .sources
            .get_auth_source_from_request(&RequestCredentials::from_parts(parts))
            .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Authentication is required")))?;

        if !state
            .sources
            .is_valid(&source, &state.config.gateway_service_id)
            .await
        {
            return Err(AppError::Unauthorized(anyhow::anyhow!("Token is not valid")));
        }

        let parsed = state
            .sources
            .parse(&source)
            .await
            .map_err(|e| AppError::Unauthorized(anyhow::anyhow!(e)))?
            .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Token is not valid")))?;

        Ok(AuthUser { source, parsed })
    }
}

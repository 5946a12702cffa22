use service_core::{
    axum::{extract::State, http::StatusCode, response::IntoResponse, Json},
    error::AppError,
};

use crate::{
    dtos::access_token::TokenRequest,
    services::{ServiceError, TokenError},
    AppState,
};

/// `204` when the identity provider reports the token active.
pub async fn validate(
    State(state): State<AppState>,
    Json(req): Json<TokenRequest>,
) -> Result<impl IntoResponse, AppError> {
    let active = state.oidc.is_valid(&req.token).await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "OIDC introspection failed");
        false
    });

    if !active {
        return Err(ServiceError::Token(TokenError::NotValid).into());
    }
    Ok(StatusCode::NO_CONTENT)
}

use service_core::{
    axum::{extract::State, http::StatusCode, response::IntoResponse, Json},
    error::AppError,
};

use crate::{
    dtos::access_token::{
        AccessTokenRequest, RevokeScopeRequest, RevokeUserRequest, TokenRequest,
        ValidateAccessTokenRequest,
    },
    middleware::AuthUser,
    services::{ServiceError, TokenError, TokenProvider},
    AppState,
};

/// Issue a personal access token for the authenticated caller.
pub async fn generate(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<AccessTokenRequest>,
) -> Result<impl IntoResponse, AppError> {
    let scopes: Vec<String> = req
        .scopes
        .into_iter()
        .map(|scope| scope.trim().to_string())
        .filter(|scope| !scope.is_empty())
        .collect();
    if scopes.is_empty() {
        return Err(ServiceError::ValidationError("At least one scope is required".to_string()).into());
    }

    let token = state
        .tokens
        .get_token(&user.parsed.user_id, req.validity, &scopes)
        .await?;

    Ok((StatusCode::OK, token))
}

/// `204` when the token may be used for the service, `401` otherwise.
pub async fn validate(
    State(state): State<AppState>,
    Json(req): Json<ValidateAccessTokenRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !state.tokens.is_valid_for_scopes(&req.token, &req.service_id).await {
        return Err(ServiceError::Token(TokenError::NotValid).into());
    }

    let invalidated = state.tokens.is_invalidated(&req.token).await.map_err(|e| {
        tracing::warn!(error = %e, "Could not check PAT invalidation");
        ServiceError::Token(TokenError::NotValid)
    })?;
    if invalidated {
        return Err(ServiceError::Token(TokenError::Invalidated).into());
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Revoke a single token. Revoking it twice is refused.
pub async fn revoke(
    State(state): State<AppState>,
    Json(req): Json<TokenRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .tokens
        .invalidate_token(&req.token)
        .await
        .map_err(ServiceError::from)?;
    state.service_authentication.evict_token(&req.token);

    Ok(StatusCode::NO_CONTENT)
}

/// Revoke every token of a user issued up to now.
///
/// Callers may revoke their own tokens; other users need a revocation admin.
pub async fn revoke_user(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<RevokeUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let caller = user.parsed.user_id.as_str();
    let user_id = req.user_id.as_deref().unwrap_or(caller);

    if !user_id.eq_ignore_ascii_case(caller) && !state.config.is_revocation_admin(caller) {
        tracing::warn!(
            user_id = %user_id,
            revoked_by = %caller,
            "Refused to revoke tokens of another user"
        );
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "Not allowed to revoke tokens of another user"
        )));
    }

    state.tokens.invalidate_all_tokens_for_user(user_id).await?;

    tracing::info!(
        user_id = %user_id,
        revoked_by = %caller,
        "Personal access tokens revoked for user"
    );
    Ok(StatusCode::NO_CONTENT)
}

/// Revoke every token scoped to a service issued up to now. Admins only.
pub async fn revoke_scope(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<RevokeScopeRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !state.config.is_revocation_admin(&user.parsed.user_id) {
        tracing::warn!(
            service_id = %req.service_id,
            revoked_by = %user.parsed.user_id,
            "Refused to revoke tokens of a service"
        );
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "Not allowed to revoke tokens of a service"
        )));
    }
    if req.service_id.trim().is_empty() {
        return Err(ServiceError::ValidationError("serviceId is required".to_string()).into());
    }
    state
        .tokens
        .invalidate_all_tokens_for_service(&req.service_id)
        .await?;

    tracing::info!(
        service_id = %req.service_id,
        revoked_by = %user.parsed.user_id,
        "Personal access tokens revoked for service"
    );
    Ok(StatusCode::NO_CONTENT)
}

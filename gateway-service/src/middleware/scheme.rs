use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;

use crate::services::RequestCredentials;
use crate::AppState;

/// Applies the outbound credential required by the routed service to the
/// request before it is handed to the transport.
pub async fn authentication_scheme_middleware(
    State(state): State<AppState>,
    Path((service_id, _path)): Path<(String, String)>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let command = state
        .service_authentication
        .get_authentication_command(&service_id, &RequestCredentials::from_parts(&parts))
        .await?;

    command.apply(&mut parts.headers).map_err(|e| {
        tracing::error!(service_id = %service_id, error = %e, "Outbound credential is not a valid header");
        AppError::InternalError(anyhow::anyhow!(e))
    })?;

    tracing::debug!(
        service_id = %service_id,
        credential = ?command.credential,
        "Outbound credential applied"
    );

    Ok(next.run(Request::from_parts(parts, body)).await)
}

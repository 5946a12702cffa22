use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::STANDARD, Engine};
use service_core::{
    axum::{
        extract::State,
        http::{header, HeaderMap, StatusCode},
        response::IntoResponse,
        Json,
    },
    error::AppError,
};

use crate::{
    dtos::auth::{LoginRequest, TicketRequest, TicketResponse},
    middleware::AuthUser,
    models::AuthSource,
    services::{metrics, ServiceError},
    AppState,
};

/// `user:password` from an `Authorization: Basic` header.
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let encoded = headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Basic ")?;
    let decoded = String::from_utf8(STANDARD.decode(encoded.trim()).ok()?).ok()?;
    let (user, password) = decoded.split_once(':')?;
    Some((user.to_string(), password.to_string()))
}

/// Log in with a PassTicket for the gateway applid. The gateway JWT is set
/// as a cookie.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    body: Option<Json<LoginRequest>>,
) -> Result<impl IntoResponse, AppError> {
    let (user_id, password) = basic_credentials(&headers)
        .or_else(|| body.map(|Json(req)| (req.username, req.password)))
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Credentials are required")))?;

    state
        .passtickets
        .evaluate(&user_id, &state.config.gateway_applid, &password)
        .map_err(ServiceError::from)?;

    let user_id = user_id.to_uppercase();

    let token = state.jwt.issue_jwt(&user_id, None)?;
    tracing::info!(user_id = %user_id, "User logged in");

    let cookie = Cookie::build((state.config.jwt.cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Strict);

    Ok((StatusCode::NO_CONTENT, jar.add(cookie)))
}

/// Invalidate the caller's gateway JWT.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let AuthSource::Jwt(token) = &user.source else {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Only gateway tokens can be logged out"
        )));
    };

    state
        .authentication
        .invalidate_jwt_token(token)
        .await
        .map_err(ServiceError::from)?;
    state.service_authentication.evict_token(token);

    tracing::info!(user_id = %user.parsed.user_id, "User logged out");

    let removal = Cookie::build(state.config.jwt.cookie_name.clone()).path("/");
    Ok((StatusCode::NO_CONTENT, jar.remove(removal)))
}

/// Identity behind the caller's credential.
pub async fn query(user: AuthUser) -> impl IntoResponse {
    Json(user.parsed)
}

/// PassTicket for the caller and the requested application.
pub async fn ticket(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<TicketRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.application_name.trim().is_empty() {
        return Err(ServiceError::ValidationError("applicationName is required".to_string()).into());
    }

    let ticket = state
        .passtickets
        .generate(&user.parsed.user_id, &req.application_name)
        .map_err(ServiceError::from)?;
    metrics::record_passticket_generated(&req.application_name);

    Ok(Json(TicketResponse {
        user_id: user.parsed.user_id,
        application_name: req.application_name,
        ticket,
    }))
}

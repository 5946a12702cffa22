pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use chrono::Duration;
use mock_zos::PassTicketService;
use service_core::axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{any, delete, get, post},
    Router,
};
use service_core::middleware::{metrics::metrics_middleware, tracing::request_id_middleware};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::GatewayConfig;
use crate::services::{
    AccessTokenProvider, AuthenticationSchemeFactory, AuthenticationService,
    DefaultAuthSourceService, Downstream, IdentityMappingService, InvalidationStore, JwtService,
    OidcProvider, ServiceAuthenticationService,
};
use service_core::error::AppError;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub jwt: JwtService,
    pub passtickets: Arc<dyn PassTicketService>,
    pub invalidation: Arc<dyn InvalidationStore>,
    pub authentication: Arc<AuthenticationService>,
    pub tokens: Arc<AccessTokenProvider>,
    pub oidc: Arc<dyn OidcProvider>,
    pub sources: Arc<DefaultAuthSourceService>,
    pub service_authentication: Arc<ServiceAuthenticationService>,
    pub downstream: Arc<dyn Downstream>,
}

impl AppState {
    /// Wire the gateway services on top of the infrastructure handles.
    pub fn new(
        config: GatewayConfig,
        jwt: JwtService,
        passtickets: Arc<dyn PassTicketService>,
        invalidation: Arc<dyn InvalidationStore>,
        oidc: Arc<dyn OidcProvider>,
        downstream: Arc<dyn Downstream>,
    ) -> Self {
        let authentication = Arc::new(AuthenticationService::new(
            jwt.clone(),
            passtickets.clone(),
            invalidation.clone(),
            &config.gateway_applid,
        ));
        let tokens = Arc::new(AccessTokenProvider::new(
            jwt.clone(),
            invalidation.clone(),
            config.pat.default_validity_seconds,
            config.pat.max_validity_seconds,
        ));
        let mappings = Arc::new(IdentityMappingService::new(
            &config.routes.identity_mappings,
        ));
        let sources = Arc::new(DefaultAuthSourceService::new(
            authentication.clone(),
            tokens.clone(),
            oidc.clone(),
            mappings,
            &config.jwt.cookie_name,
            config.provider_timeout,
        ));
        let schemes = AuthenticationSchemeFactory::standard(
            sources.clone(),
            passtickets.clone(),
            &config.jwt.cookie_name,
            Duration::seconds(config.jwt.token_expiration_seconds),
        );
        let service_authentication = Arc::new(ServiceAuthenticationService::new(
            &config.routes.routes,
            sources.clone(),
            schemes,
        ));

        tracing::info!(
            routes = config.routes.routes.len(),
            identity_mappings = config.routes.identity_mappings.len(),
            "Gateway services initialized"
        );

        Self {
            config: Arc::new(config),
            jwt,
            passtickets,
            invalidation,
            authentication,
            tokens,
            oidc,
            sources,
            service_authentication,
            downstream,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let routed = Router::new()
        .route("/api/:service_id/*path", any(handlers::gateway::forward))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::authentication_scheme_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(handlers::metrics::metrics))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/query", get(handlers::auth::query))
        .route("/auth/ticket", post(handlers::auth::ticket))
        .route(
            "/auth/access-token/generate",
            post(handlers::access_token::generate),
        )
        .route(
            "/auth/access-token/validate",
            post(handlers::access_token::validate),
        )
        .route(
            "/auth/access-token/revoke",
            delete(handlers::access_token::revoke),
        )
        .route(
            "/auth/access-token/revoke/tokens/user",
            delete(handlers::access_token::revoke_user),
        )
        .route(
            "/auth/access-token/revoke/tokens/scope",
            delete(handlers::access_token::revoke_scope),
        )
        .route(
            "/auth/oidc-token/validate",
            post(handlers::oidc::validate),
        )
        .merge(routed)
        .with_state(state)
        // Add metrics middleware
        .layer(from_fn(metrics_middleware))
        // Add tracing layer
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &service_core::axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            },
        ))
        // Add tracing middleware for request_id
        .layer(from_fn(request_id_middleware))
}

/// Service health check
pub async fn health_check(
    service_core::axum::extract::State(state): service_core::axum::extract::State<AppState>,
) -> Result<service_core::axum::Json<serde_json::Value>, AppError> {
    state.invalidation.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Invalidation store health check failed");
        AppError::ServiceUnavailable
    })?;

    Ok(service_core::axum::Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
        "checks": {
            "invalidation_store": "up",
            "routes": state.config.routes.routes.len()
        }
    })))
}

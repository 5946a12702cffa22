use gateway_service::{
    build_router,
    config::GatewayConfig,
    services::{
        DisabledOidcProvider, InMemoryInvalidationStore, IntrospectionOidcProvider,
        InvalidationStore, JwtService, NoTransport, OidcProvider, RedisInvalidationStore,
    },
    AppState,
};
use mock_zos::IrrPassTicket;
use service_core::observability::{init_metrics, init_tracing};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), service_core::error::AppError> {
    // Load configuration - fail fast if invalid
    let config = GatewayConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.common.otlp_endpoint.as_deref(),
    )?;

    init_metrics()?;

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting gateway service"
    );

    let jwt = JwtService::new(&config.jwt)?;

    let invalidation: Arc<dyn InvalidationStore> = match &config.redis {
        Some(redis) => Arc::new(RedisInvalidationStore::new(redis).await?),
        None => {
            tracing::warn!("REDIS_URL not set, using in-memory invalidation store");
            Arc::new(InMemoryInvalidationStore::new())
        }
    };

    let oidc: Arc<dyn OidcProvider> = match &config.oidc {
        Some(oidc) => Arc::new(IntrospectionOidcProvider::new(
            oidc.clone(),
            config.provider_timeout,
        )?),
        None => {
            tracing::info!("OIDC not configured, OAuth2 tokens will be refused");
            Arc::new(DisabledOidcProvider)
        }
    };

    let port = config.common.port;
    let service_span = tracing::info_span!(
        "service",
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
    );

    let state = AppState::new(
        config,
        jwt,
        Arc::new(IrrPassTicket::new()),
        invalidation,
        oidc,
        Arc::new(NoTransport),
    );
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let _guard = service_span.enter();

    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    service_core::axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}

use async_trait::async_trait;
use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use service_core::error::AppError;

/// Transport to a routed service. Receives the request with the outbound
/// credential already applied.
#[async_trait]
pub trait Downstream: Send + Sync {
    async fn forward(&self, service_id: &str, request: Request) -> Response;
}

/// Used when the gateway runs without a transport; every routed request ends
/// in `502 Bad Gateway` after authentication succeeded.
pub struct NoTransport;

#[async_trait]
impl Downstream for NoTransport {
    async fn forward(&self, service_id: &str, _request: Request) -> Response {
        tracing::debug!(service_id = %service_id, "No transport configured");
        AppError::BadGateway(format!("no transport configured for {}", service_id))
            .into_response()
    }
}

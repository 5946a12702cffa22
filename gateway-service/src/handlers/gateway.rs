use service_core::axum::{
    extract::{Path, Request, State},
    response::Response,
};

use crate::AppState;

/// Routed request; the outbound credential was applied by the
/// authentication-scheme middleware.
pub async fn forward(
    State(state): State<AppState>,
    Path((service_id, _path)): Path<(String, String)>,
    req: Request,
) -> Response {
    state.downstream.forward(&service_id, req).await
}

use serde::{Deserialize, Serialize};

/// Credentials posted as JSON instead of a Basic header
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketRequest {
    pub application_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketResponse {
    pub user_id: String,
    pub application_name: String,
    pub ticket: String,
}

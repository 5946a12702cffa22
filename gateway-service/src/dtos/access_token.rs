use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AccessTokenRequest {
    /// Seconds; `0` or anything above the configured maximum means the default
    #[serde(default)]
    pub validity: i64,
    #[serde(default)]
    pub scopes: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateAccessTokenRequest {
    pub token: String,
    pub service_id: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeUserRequest {
    /// Defaults to the authenticated caller
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeScopeRequest {
    pub service_id: String,
}

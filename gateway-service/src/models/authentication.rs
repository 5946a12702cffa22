use serde::{Deserialize, Serialize};
use std::fmt;

/// How a downstream service expects callers to authenticate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthenticationScheme {
    #[serde(rename = "bypass")]
    Bypass,
    #[serde(rename = "zoweJwt")]
    ZoweJwt,
    #[serde(rename = "httpBasicPassTicket")]
    HttpBasicPassticket,
    #[serde(rename = "zosmf")]
    Zosmf,
    #[serde(rename = "x509")]
    X509,
}

impl AuthenticationScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthenticationScheme::Bypass => "bypass",
            AuthenticationScheme::ZoweJwt => "zoweJwt",
            AuthenticationScheme::HttpBasicPassticket => "httpBasicPassTicket",
            AuthenticationScheme::Zosmf => "zosmf",
            AuthenticationScheme::X509 => "x509",
        }
    }
}

impl fmt::Display for AuthenticationScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authentication declared by a downstream service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authentication {
    pub scheme: AuthenticationScheme,

    /// RACF application name used when generating PassTickets
    #[serde(default)]
    pub applid: Option<String>,

    /// Service accepts the gateway's own credentials for single sign-on
    #[serde(default = "default_supports_sso")]
    pub supports_sso: bool,
}

fn default_supports_sso() -> bool {
    true
}

impl Authentication {
    pub fn new(scheme: AuthenticationScheme) -> Self {
        Self {
            scheme,
            applid: None,
            supports_sso: true,
        }
    }

    pub fn with_applid(scheme: AuthenticationScheme, applid: &str) -> Self {
        Self {
            scheme,
            applid: Some(applid.to_string()),
            supports_sso: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RouteConfig {
    pub service_id: String,
    pub authentication: Authentication,
}

/// One row of the distributed identity to mainframe user mapping.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IdentityMappingEntry {
    /// User name label, informational only
    #[serde(default)]
    pub user_name: String,
    pub distributed_id: String,
    pub mainframe_id: String,
    pub registry: String,
}

/// Document referenced by `ROUTES_FILE`. Keys are snake_case because the
/// `config` loader folds key case.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoutesDocument {
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
    #[serde(default)]
    pub identity_mappings: Vec<IdentityMappingEntry>,
}

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Issuer claim of JWTs minted by the gateway
pub const ZOWE_ISSUER: &str = "APIML";
/// Issuer claim of personal access tokens
pub const ZOWE_PAT_ISSUER: &str = "APIML_PAT";
/// Issuer claim of tokens minted by z/OSMF
pub const ZOSMF_ISSUER: &str = "zOSMF";

/// Credential found on an inbound request, before any validation.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthSource {
    Jwt(String),
    Pat(String),
    OAuth2(String),
    ClientCert(ClientCertificate),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthSourceType {
    Jwt,
    Pat,
    OAuth2,
    ClientCert,
}

impl AuthSourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthSourceType::Jwt => "jwt",
            AuthSourceType::Pat => "pat",
            AuthSourceType::OAuth2 => "oauth2",
            AuthSourceType::ClientCert => "x509",
        }
    }
}

impl AuthSource {
    pub fn source_type(&self) -> AuthSourceType {
        match self {
            AuthSource::Jwt(_) => AuthSourceType::Jwt,
            AuthSource::Pat(_) => AuthSourceType::Pat,
            AuthSource::OAuth2(_) => AuthSourceType::OAuth2,
            AuthSource::ClientCert(_) => AuthSourceType::ClientCert,
        }
    }

    /// Raw credential text; certificates are rendered as base64 DER.
    pub fn raw_source(&self) -> Cow<'_, str> {
        match self {
            AuthSource::Jwt(token) | AuthSource::Pat(token) | AuthSource::OAuth2(token) => {
                Cow::Borrowed(token.as_str())
            }
            AuthSource::ClientCert(certificate) => Cow::Owned(certificate.encoded()),
        }
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            AuthSource::Jwt(token) | AuthSource::Pat(token) | AuthSource::OAuth2(token) => {
                Some(token)
            }
            AuthSource::ClientCert(_) => None,
        }
    }
}

// Credentials never reach the logs.
impl fmt::Debug for AuthSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthSource::ClientCert(certificate) => f
                .debug_tuple("ClientCert")
                .field(&certificate.distinguished_name)
                .finish(),
            other => f
                .debug_tuple(other.source_type().as_str())
                .field(&"<redacted>")
                .finish(),
        }
    }
}

/// Client certificate presented during the TLS handshake. The TLS terminator
/// places it into the request extensions; it is never parsed here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCertificate {
    pub common_name: String,
    pub distinguished_name: String,
    pub der: Vec<u8>,
    pub not_after: Option<DateTime<Utc>>,
}

impl ClientCertificate {
    pub fn encoded(&self) -> String {
        STANDARD.encode(&self.der)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.not_after.map(|end| now >= end).unwrap_or(false)
    }
}

/// Identity provider that issued the original credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Origin {
    Zowe,
    ZowePat,
    Zosmf,
    Oidc,
    X509,
}

impl Origin {
    /// Any issuer the gateway does not recognize is an external OIDC provider.
    pub fn from_issuer(issuer: &str) -> Origin {
        match issuer {
            ZOWE_ISSUER => Origin::Zowe,
            ZOWE_PAT_ISSUER => Origin::ZowePat,
            ZOSMF_ISSUER => Origin::Zosmf,
            _ => Origin::Oidc,
        }
    }
}

/// Canonical identity derived from an [`AuthSource`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Parsed {
    /// Mainframe user id
    pub user_id: String,

    /// When the credential was issued, if known
    pub creation: Option<DateTime<Utc>>,

    /// When the credential stops being valid, if it expires at all
    pub expiration: Option<DateTime<Utc>>,

    pub origin: Origin,

    /// Token that may be forwarded unchanged to a downstream service
    #[serde(skip)]
    pub raw_token: Option<String>,
}

impl Parsed {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiration.map(|end| now >= end).unwrap_or(false)
    }
}

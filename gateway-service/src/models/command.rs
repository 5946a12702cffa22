use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use http::header::{InvalidHeaderValue, AUTHORIZATION};
use http::{HeaderMap, HeaderName, HeaderValue};
use std::fmt;

use crate::utils::cookies;

/// Credential attached to the request sent downstream.
#[derive(Clone, PartialEq, Eq)]
pub enum OutboundCredential {
    None,
    Cookie { name: String, value: String },
    BasicAuth { user_id: String, password: String },
    Headers(Vec<(HeaderName, String)>),
}

impl fmt::Debug for OutboundCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutboundCredential::None => f.write_str("None"),
            OutboundCredential::Cookie { name, .. } => f
                .debug_struct("Cookie")
                .field("name", name)
                .field("value", &"<redacted>")
                .finish(),
            OutboundCredential::BasicAuth { user_id, .. } => f
                .debug_struct("BasicAuth")
                .field("user_id", user_id)
                .field("password", &"<redacted>")
                .finish(),
            OutboundCredential::Headers(headers) => f
                .debug_list()
                .entries(headers.iter().map(|(name, _)| name))
                .finish(),
        }
    }
}

/// Outcome of an authentication scheme: what to attach to the outbound
/// request and until when that credential may be reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticationCommand {
    pub credential: OutboundCredential,
    pub expire_at: Option<DateTime<Utc>>,
    /// Cookies stripped from the outbound request before the credential is set
    pub remove_cookies: Vec<String>,
}

impl AuthenticationCommand {
    pub const EMPTY: AuthenticationCommand = AuthenticationCommand {
        credential: OutboundCredential::None,
        expire_at: None,
        remove_cookies: Vec::new(),
    };

    pub fn new(credential: OutboundCredential, expire_at: Option<DateTime<Utc>>) -> Self {
        Self {
            credential,
            expire_at,
            remove_cookies: Vec::new(),
        }
    }

    pub fn removing_cookie(mut self, name: &str) -> Self {
        self.remove_cookies.push(name.to_string());
        self
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expire_at.map(|end| now >= end).unwrap_or(false)
    }

    /// Write the credential into `headers`. Existing values are replaced, so
    /// applying the same command twice leaves the headers unchanged.
    pub fn apply(&self, headers: &mut HeaderMap) -> Result<(), InvalidHeaderValue> {
        let removed: Vec<&str> = self.remove_cookies.iter().map(String::as_str).collect();

        let replaced_cookie = match &self.credential {
            OutboundCredential::Cookie { name, value } => Some((name.as_str(), value.as_str())),
            _ => None,
        };
        if replaced_cookie.is_some() || !removed.is_empty() {
            cookies::rewrite_cookie_header(headers, &removed, replaced_cookie)?;
        }

        match &self.credential {
            OutboundCredential::None | OutboundCredential::Cookie { .. } => {}
            OutboundCredential::BasicAuth { user_id, password } => {
                let encoded = STANDARD.encode(format!("{}:{}", user_id, password));
                headers.insert(
                    AUTHORIZATION,
                    HeaderValue::from_str(&format!("Basic {}", encoded))?,
                );
            }
            OutboundCredential::Headers(values) => {
                for (name, value) in values {
                    headers.insert(name.clone(), HeaderValue::from_str(value)?);
                }
            }
        }

        Ok(())
    }
}

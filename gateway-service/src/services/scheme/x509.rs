use async_trait::async_trait;
use chrono::{Duration, Utc};
use http::HeaderName;

use super::{expire_at, AuthenticationSchemeHandler};
use crate::models::{
    AuthSource, Authentication, AuthenticationCommand, AuthenticationScheme, OutboundCredential,
};
use crate::services::error::AuthSchemeError;

pub const CERTIFICATE_PUBLIC_HEADER: &str = "x-certificate-public";
pub const CERTIFICATE_DN_HEADER: &str = "x-certificate-distinguishedname";
pub const CERTIFICATE_CN_HEADER: &str = "x-certificate-commonname";

/// Passes the caller's client certificate downstream in headers.
pub struct X509Scheme {
    default_expiration: Duration,
}

impl X509Scheme {
    pub fn new(default_expiration: Duration) -> Self {
        Self { default_expiration }
    }
}

#[async_trait]
impl AuthenticationSchemeHandler for X509Scheme {
    fn scheme(&self) -> AuthenticationScheme {
        AuthenticationScheme::X509
    }

    async fn create_command(
        &self,
        _authentication: &Authentication,
        source: Option<&AuthSource>,
    ) -> Result<AuthenticationCommand, AuthSchemeError> {
        let certificate = match source {
            Some(AuthSource::ClientCert(certificate)) => certificate,
            Some(_) => return Err(AuthSchemeError::InvalidToken),
            None => return Err(AuthSchemeError::MissingAuthentication),
        };

        let now = Utc::now();
        if certificate.is_expired_at(now) {
            return Err(AuthSchemeError::ExpiredToken);
        }

        let headers = vec![
            (
                HeaderName::from_static(CERTIFICATE_PUBLIC_HEADER),
                certificate.encoded(),
            ),
            (
                HeaderName::from_static(CERTIFICATE_DN_HEADER),
                certificate.distinguished_name.clone(),
            ),
            (
                HeaderName::from_static(CERTIFICATE_CN_HEADER),
                certificate.common_name.clone(),
            ),
        ];

        Ok(AuthenticationCommand::new(
            OutboundCredential::Headers(headers),
            Some(expire_at(now, self.default_expiration, certificate.not_after)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClientCertificate;
    use http::HeaderMap;

    fn certificate(not_after: Option<chrono::DateTime<Utc>>) -> AuthSource {
        AuthSource::ClientCert(ClientCertificate {
            common_name: "ZOWEUSER".to_string(),
            distinguished_name: "CN=ZOWEUSER,O=Zowe".to_string(),
            der: vec![0x30, 0x82],
            not_after,
        })
    }

    #[tokio::test]
    async fn certificate_headers_are_set() {
        let not_after = Utc::now() + Duration::minutes(5);
        let command = X509Scheme::new(Duration::hours(8))
            .create_command(
                &Authentication::new(AuthenticationScheme::X509),
                Some(&certificate(Some(not_after))),
            )
            .await
            .unwrap();

        assert_eq!(command.expire_at, Some(not_after));

        let mut headers = HeaderMap::new();
        command.apply(&mut headers).unwrap();
        command.apply(&mut headers).unwrap();
        assert_eq!(headers.get_all(CERTIFICATE_CN_HEADER).iter().count(), 1);
        assert_eq!(headers[CERTIFICATE_DN_HEADER], "CN=ZOWEUSER,O=Zowe");
        assert_eq!(headers[CERTIFICATE_PUBLIC_HEADER], "MII=");
    }

    #[tokio::test]
    async fn other_sources_are_refused() {
        let result = X509Scheme::new(Duration::hours(8))
            .create_command(
                &Authentication::new(AuthenticationScheme::X509),
                Some(&AuthSource::Jwt("token".to_string())),
            )
            .await;
        assert_eq!(result, Err(AuthSchemeError::InvalidToken));
    }

    #[tokio::test]
    async fn expired_certificate_is_refused() {
        let result = X509Scheme::new(Duration::hours(8))
            .create_command(
                &Authentication::new(AuthenticationScheme::X509),
                Some(&certificate(Some(Utc::now() - Duration::seconds(1)))),
            )
            .await;
        assert_eq!(result, Err(AuthSchemeError::ExpiredToken));
    }
}

//! Translation of a validated caller identity into the credential a
//! downstream service expects.

mod bypass;
mod passticket;
mod x509;
mod zosmf;
mod zowe_jwt;

pub use bypass::BypassScheme;
pub use passticket::HttpBasicPassticketScheme;
pub use x509::{X509Scheme, CERTIFICATE_CN_HEADER, CERTIFICATE_DN_HEADER, CERTIFICATE_PUBLIC_HEADER};
pub use zosmf::{ZosmfScheme, LTPA_COOKIE};
pub use zowe_jwt::ZoweJwtScheme;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use mock_zos::PassTicketService;
use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{
    AuthSource, Authentication, AuthenticationCommand, AuthenticationScheme, Parsed,
};
use crate::services::auth_source::AuthSourceService;
use crate::services::error::AuthSchemeError;

#[async_trait]
pub trait AuthenticationSchemeHandler: Send + Sync {
    fn scheme(&self) -> AuthenticationScheme;

    /// Whether the caller must present a valid credential at all.
    fn is_required_valid_source(&self) -> bool {
        true
    }

    async fn create_command(
        &self,
        authentication: &Authentication,
        source: Option<&AuthSource>,
    ) -> Result<AuthenticationCommand, AuthSchemeError>;
}

/// The outbound credential lives no longer than the configured default and
/// never past the expiry of the credential it was derived from.
pub fn expire_at(
    now: DateTime<Utc>,
    default_expiration: Duration,
    source_expiration: Option<DateTime<Utc>>,
) -> DateTime<Utc> {
    let by_default = now + default_expiration;
    match source_expiration {
        Some(expiration) if expiration < by_default => expiration,
        _ => by_default,
    }
}

async fn parse_required(
    sources: &dyn AuthSourceService,
    source: Option<&AuthSource>,
) -> Result<Parsed, AuthSchemeError> {
    let source = source.ok_or(AuthSchemeError::MissingAuthentication)?;
    sources
        .parse(source)
        .await?
        .ok_or(AuthSchemeError::MissingAuthentication)
}

pub struct AuthenticationSchemeFactory {
    handlers: HashMap<AuthenticationScheme, Arc<dyn AuthenticationSchemeHandler>>,
}

impl AuthenticationSchemeFactory {
    pub fn new(handlers: Vec<Arc<dyn AuthenticationSchemeHandler>>) -> Self {
        Self {
            handlers: handlers
                .into_iter()
                .map(|handler| (handler.scheme(), handler))
                .collect(),
        }
    }

    /// Every scheme the gateway supports.
    pub fn standard(
        sources: Arc<dyn AuthSourceService>,
        passtickets: Arc<dyn PassTicketService>,
        jwt_cookie_name: &str,
        default_expiration: Duration,
    ) -> Self {
        Self::new(vec![
            Arc::new(BypassScheme),
            Arc::new(ZoweJwtScheme::new(
                sources.clone(),
                jwt_cookie_name,
                default_expiration,
            )),
            Arc::new(HttpBasicPassticketScheme::new(
                sources.clone(),
                passtickets,
                jwt_cookie_name,
                default_expiration,
            )),
            Arc::new(ZosmfScheme::new(
                sources,
                jwt_cookie_name,
                default_expiration,
            )),
            Arc::new(X509Scheme::new(default_expiration)),
        ])
    }

    pub fn get(
        &self,
        scheme: AuthenticationScheme,
    ) -> Option<&Arc<dyn AuthenticationSchemeHandler>> {
        self.handlers.get(&scheme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OutboundCredential, ZOWE_PAT_ISSUER};
    use crate::services::jwt::ApimlClaims;
    use crate::services::testing::{Fixture, COOKIE_NAME};

    const DEFAULT_EXPIRATION_SECONDS: i64 = 28_800;

    fn factory(fixture: &Fixture) -> AuthenticationSchemeFactory {
        AuthenticationSchemeFactory::standard(
            fixture.sources.clone(),
            fixture.passtickets.clone(),
            COOKIE_NAME,
            Duration::seconds(DEFAULT_EXPIRATION_SECONDS),
        )
    }

    fn pat_expiring_in(fixture: &Fixture, seconds: i64) -> (AuthSource, i64) {
        let now = Utc::now().timestamp();
        let exp = now + seconds;
        let token = fixture
            .jwt
            .sign(&ApimlClaims {
                sub: "ZOWEUSER".to_string(),
                iat: now,
                exp,
                iss: ZOWE_PAT_ISSUER.to_string(),
                jti: "pat".to_string(),
                scopes: vec!["cics".to_string()],
                ltpa: None,
            })
            .unwrap();
        (AuthSource::Pat(token), exp)
    }

    #[test]
    fn expire_at_takes_the_earlier_bound() {
        let now = Utc::now();
        let default = Duration::hours(8);

        assert_eq!(expire_at(now, default, None), now + default);
        assert_eq!(
            expire_at(now, default, Some(now + Duration::hours(1))),
            now + Duration::hours(1)
        );
        assert_eq!(
            expire_at(now, default, Some(now + Duration::days(30))),
            now + default
        );
    }

    #[tokio::test]
    async fn pat_command_expires_with_the_pat_when_it_ends_first() {
        let fixture = Fixture::new();
        let (source, exp) = pat_expiring_in(&fixture, 600);
        let handler = factory(&fixture)
            .get(AuthenticationScheme::HttpBasicPassticket)
            .cloned()
            .unwrap();

        let command = handler
            .create_command(
                &Authentication::with_applid(AuthenticationScheme::HttpBasicPassticket, "CICSAPPL"),
                Some(&source),
            )
            .await
            .unwrap();

        assert_eq!(command.expire_at.unwrap().timestamp(), exp);
    }

    #[tokio::test]
    async fn pat_command_is_capped_by_default_expiration() {
        let fixture = Fixture::new();
        let (source, _) = pat_expiring_in(&fixture, 30 * 86_400);
        let handler = factory(&fixture)
            .get(AuthenticationScheme::HttpBasicPassticket)
            .cloned()
            .unwrap();

        let before = Utc::now();
        let command = handler
            .create_command(
                &Authentication::with_applid(AuthenticationScheme::HttpBasicPassticket, "CICSAPPL"),
                Some(&source),
            )
            .await
            .unwrap();
        let after = Utc::now();

        let expire_at = command.expire_at.unwrap();
        assert!(expire_at >= before + Duration::seconds(DEFAULT_EXPIRATION_SECONDS));
        assert!(expire_at <= after + Duration::seconds(DEFAULT_EXPIRATION_SECONDS));
    }

    #[tokio::test]
    async fn passticket_command_carries_evaluable_ticket() {
        let fixture = Fixture::new();
        let (source, _) = pat_expiring_in(&fixture, 600);
        let handler = factory(&fixture)
            .get(AuthenticationScheme::HttpBasicPassticket)
            .cloned()
            .unwrap();

        let command = handler
            .create_command(
                &Authentication::with_applid(AuthenticationScheme::HttpBasicPassticket, "CICSAPPL"),
                Some(&source),
            )
            .await
            .unwrap();

        let OutboundCredential::BasicAuth { user_id, password } = &command.credential else {
            panic!("expected basic auth, got {:?}", command.credential);
        };
        assert_eq!(user_id, "ZOWEUSER");
        assert!(fixture
            .passtickets
            .evaluate(user_id, "CICSAPPL", password)
            .is_ok());
        assert_eq!(command.remove_cookies, vec![COOKIE_NAME.to_string()]);
    }

    #[tokio::test]
    async fn passticket_requires_applid() {
        let fixture = Fixture::new();
        let (source, _) = pat_expiring_in(&fixture, 600);
        let handler = factory(&fixture)
            .get(AuthenticationScheme::HttpBasicPassticket)
            .cloned()
            .unwrap();

        let result = handler
            .create_command(
                &Authentication::new(AuthenticationScheme::HttpBasicPassticket),
                Some(&source),
            )
            .await;
        assert_eq!(result, Err(AuthSchemeError::MissingApplid));
    }

    #[tokio::test]
    async fn passticket_generation_failure_is_reported() {
        let fixture = Fixture::new();
        let (source, _) = pat_expiring_in(&fixture, 600);
        let handler = factory(&fixture)
            .get(AuthenticationScheme::HttpBasicPassticket)
            .cloned()
            .unwrap();

        let result = handler
            .create_command(
                &Authentication::with_applid(AuthenticationScheme::HttpBasicPassticket, "XBADAPPL"),
                Some(&source),
            )
            .await;
        assert_eq!(
            result,
            Err(AuthSchemeError::PassTicket(
                mock_zos::GenerationError::UnknownApplId
            ))
        );
    }

    #[tokio::test]
    async fn missing_source_is_rejected_unless_bypass() {
        let fixture = Fixture::new();
        let factory = factory(&fixture);

        for scheme in [
            AuthenticationScheme::ZoweJwt,
            AuthenticationScheme::HttpBasicPassticket,
            AuthenticationScheme::Zosmf,
            AuthenticationScheme::X509,
        ] {
            let handler = factory.get(scheme).unwrap();
            assert!(handler.is_required_valid_source());
            let result = handler
                .create_command(&Authentication::with_applid(scheme, "APPL"), None)
                .await;
            assert_eq!(result, Err(AuthSchemeError::MissingAuthentication));
        }

        let bypass = factory.get(AuthenticationScheme::Bypass).unwrap();
        assert!(!bypass.is_required_valid_source());
        assert_eq!(
            bypass
                .create_command(&Authentication::new(AuthenticationScheme::Bypass), None)
                .await,
            Ok(AuthenticationCommand::EMPTY)
        );
    }

    #[tokio::test]
    async fn expired_jwt_maps_to_expired_token() {
        let fixture = Fixture::new();
        let now = Utc::now().timestamp();
        let token = fixture
            .jwt
            .sign(&ApimlClaims {
                sub: "ZOWEUSER".to_string(),
                iat: now - 120,
                exp: now - 60,
                iss: "APIML".to_string(),
                jti: "old".to_string(),
                scopes: Vec::new(),
                ltpa: None,
            })
            .unwrap();

        let result = factory(&fixture)
            .get(AuthenticationScheme::ZoweJwt)
            .unwrap()
            .create_command(
                &Authentication::new(AuthenticationScheme::ZoweJwt),
                Some(&AuthSource::Jwt(token)),
            )
            .await;
        assert_eq!(result, Err(AuthSchemeError::ExpiredToken));
    }

    #[tokio::test]
    async fn zowe_jwt_forwards_the_same_token() {
        let fixture = Fixture::new();
        let token = fixture.jwt.issue_jwt("ZOWEUSER", None).unwrap();

        let command = factory(&fixture)
            .get(AuthenticationScheme::ZoweJwt)
            .unwrap()
            .create_command(
                &Authentication::new(AuthenticationScheme::ZoweJwt),
                Some(&AuthSource::Jwt(token.clone())),
            )
            .await
            .unwrap();

        assert_eq!(
            command.credential,
            OutboundCredential::Cookie {
                name: COOKIE_NAME.to_string(),
                value: token,
            }
        );
    }

    #[tokio::test]
    async fn zosmf_needs_ltpa() {
        let fixture = Fixture::new();
        let factory = factory(&fixture);
        let handler = factory.get(AuthenticationScheme::Zosmf).unwrap();
        let authentication = Authentication::new(AuthenticationScheme::Zosmf);

        let with_ltpa = fixture.jwt.issue_jwt("ZOWEUSER", Some("LTPA-TOKEN")).unwrap();
        let command = handler
            .create_command(&authentication, Some(&AuthSource::Jwt(with_ltpa)))
            .await
            .unwrap();
        assert_eq!(
            command.credential,
            OutboundCredential::Cookie {
                name: LTPA_COOKIE.to_string(),
                value: "LTPA-TOKEN".to_string(),
            }
        );

        let without = fixture.jwt.issue_jwt("ZOWEUSER", None).unwrap();
        let result = handler
            .create_command(&authentication, Some(&AuthSource::Jwt(without)))
            .await;
        assert_eq!(result, Err(AuthSchemeError::MissingLtpa));
    }

    #[tokio::test]
    async fn factory_only_knows_registered_handlers() {
        let factory = AuthenticationSchemeFactory::new(vec![Arc::new(BypassScheme)]);
        assert!(factory.get(AuthenticationScheme::Bypass).is_some());
        assert!(factory.get(AuthenticationScheme::ZoweJwt).is_none());
    }
}

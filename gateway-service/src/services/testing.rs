//! Wiring of real services over in-memory stores for unit tests.

use async_trait::async_trait;
use mock_zos::IrrPassTicket;
use std::sync::Arc;
use std::time::Duration;

use crate::services::access_token::AccessTokenProvider;
use crate::services::auth_source::DefaultAuthSourceService;
use crate::services::authentication::AuthenticationService;
use crate::services::identity_mapping::IdentityMappingService;
use crate::services::invalidation::InMemoryInvalidationStore;
use crate::services::jwt::JwtService;
use crate::services::oidc::{DisabledOidcProvider, OidcProvider};

pub const COOKIE_NAME: &str = "apimlAuthenticationToken";
pub const GATEWAY_APPLID: &str = "ZOWEAPPL";

pub struct Fixture {
    pub jwt: JwtService,
    pub passtickets: Arc<IrrPassTicket>,
    pub store: Arc<InMemoryInvalidationStore>,
    pub identity: Arc<AuthenticationService>,
    pub tokens: Arc<AccessTokenProvider>,
    pub oidc: Arc<dyn OidcProvider>,
    pub mappings: Arc<IdentityMappingService>,
    pub sources: Arc<DefaultAuthSourceService>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_oidc(Arc::new(DisabledOidcProvider))
    }

    pub fn with_oidc(oidc: Arc<dyn OidcProvider>) -> Self {
        let jwt = JwtService::from_secret(b"unit-test-secret", 3600);
        let passtickets = Arc::new(IrrPassTicket::new());
        let store = Arc::new(InMemoryInvalidationStore::new());
        let identity = Arc::new(AuthenticationService::new(
            jwt.clone(),
            passtickets.clone(),
            store.clone(),
            GATEWAY_APPLID,
        ));
        let tokens = Arc::new(AccessTokenProvider::new(
            jwt.clone(),
            store.clone(),
            7_776_000,
            7_776_000,
        ));
        let mappings = Arc::new(IdentityMappingService::default());
        let sources = Arc::new(DefaultAuthSourceService::new(
            identity.clone(),
            tokens.clone(),
            oidc.clone(),
            mappings.clone(),
            COOKIE_NAME,
            Duration::from_secs(5),
        ));

        Self {
            jwt,
            passtickets,
            store,
            identity,
            tokens,
            oidc,
            mappings,
            sources,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.sources = Arc::new(DefaultAuthSourceService::new(
            self.identity.clone(),
            self.tokens.clone(),
            self.oidc.clone(),
            self.mappings.clone(),
            COOKIE_NAME,
            timeout,
        ));
        self
    }
}

pub struct StaticOidcProvider {
    pub active: bool,
    pub registry: String,
}

#[async_trait]
impl OidcProvider for StaticOidcProvider {
    async fn is_valid(&self, _token: &str) -> Result<bool, anyhow::Error> {
        Ok(self.active)
    }

    fn registry(&self) -> Option<&str> {
        Some(&self.registry)
    }
}

pub struct SlowOidcProvider(pub Duration);

#[async_trait]
impl OidcProvider for SlowOidcProvider {
    async fn is_valid(&self, _token: &str) -> Result<bool, anyhow::Error> {
        tokio::time::sleep(self.0).await;
        Ok(true)
    }

    fn registry(&self) -> Option<&str> {
        None
    }
}

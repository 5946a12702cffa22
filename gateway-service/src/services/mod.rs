//! Services layer of the gateway.
//!
//! Credential extraction and validation, token lifecycle, and the
//! authentication schemes that produce outbound credentials.

pub mod access_token;
pub mod auth_source;
pub mod authentication;
pub mod downstream;
pub mod error;
pub mod identity_mapping;
pub mod invalidation;
pub mod jwt;
pub mod metrics;
pub mod oidc;
pub mod scheme;
pub mod service_authentication;

#[cfg(test)]
mod testing;

pub use access_token::{AccessTokenProvider, TokenProvider};
pub use auth_source::{AuthSourceService, DefaultAuthSourceService, RequestCredentials};
pub use authentication::{AuthenticationService, IdentityMapper};
pub use downstream::{Downstream, NoTransport};
pub use error::{AuthSchemeError, ServiceError, TokenError};
pub use identity_mapping::IdentityMappingService;
pub use invalidation::{InMemoryInvalidationStore, InvalidationStore, RedisInvalidationStore};
pub use jwt::{ApimlClaims, JwtService};
pub use oidc::{DisabledOidcProvider, IntrospectionOidcProvider, OidcProvider};
pub use scheme::{AuthenticationSchemeFactory, AuthenticationSchemeHandler};
pub use service_authentication::ServiceAuthenticationService;

pub mod auth_source;
pub mod authentication;
pub mod command;

pub use auth_source::{
    AuthSource, AuthSourceType, ClientCertificate, Origin, Parsed, ZOSMF_ISSUER, ZOWE_ISSUER,
    ZOWE_PAT_ISSUER,
};
pub use authentication::{
    Authentication, AuthenticationScheme, IdentityMappingEntry, RouteConfig, RoutesDocument,
};
pub use command::{AuthenticationCommand, OutboundCredential};

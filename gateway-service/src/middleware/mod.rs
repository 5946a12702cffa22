pub mod auth;
pub mod scheme;

pub use auth::AuthUser;
pub use scheme::authentication_scheme_middleware;

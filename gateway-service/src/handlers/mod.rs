//! HTTP handlers of the gateway.

pub mod access_token;
pub mod auth;
pub mod gateway;
pub mod metrics;
pub mod oidc;

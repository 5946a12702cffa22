use mock_zos::{EvaluationError, GenerationError};
use service_core::error::AppError;
use thiserror::Error;

/// Outcome of token validation or exchange.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token is not valid")]
    NotValid,

    #[error("Token is expired")]
    Expired,

    #[error("Token has been invalidated")]
    Invalidated,

    #[error("Token exchange failed: {0}")]
    Exchange(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::NotValid,
        }
    }
}

/// Why an authentication scheme could not produce an outbound credential.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthSchemeError {
    #[error("Authentication is required")]
    MissingAuthentication,

    #[error("Token is not valid")]
    InvalidToken,

    #[error("Token is expired")]
    ExpiredToken,

    #[error("No applid configured for the service")]
    MissingApplid,

    #[error("No LTPA token available")]
    MissingLtpa,

    #[error(transparent)]
    PassTicket(#[from] GenerationError),

    #[error("Credential exchange failed: {0}")]
    Exchange(String),
}

impl From<TokenError> for AuthSchemeError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::NotValid | TokenError::Invalidated => AuthSchemeError::InvalidToken,
            TokenError::Expired => AuthSchemeError::ExpiredToken,
            TokenError::Exchange(reason) => AuthSchemeError::Exchange(reason),
        }
    }
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Scheme(#[from] AuthSchemeError),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unknown service: {0}")]
    UnknownService(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("PassTicket error: {0}")]
    PassTicket(#[from] GenerationError),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<EvaluationError> for ServiceError {
    fn from(err: EvaluationError) -> Self {
        tracing::debug!(error = %err, "PassTicket evaluation refused");
        ServiceError::InvalidCredentials
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Token(e) => AppError::Unauthorized(anyhow::anyhow!(e)),
            ServiceError::Scheme(e) => match e {
                AuthSchemeError::MissingApplid => AppError::InternalError(anyhow::anyhow!(e)),
                _ => AppError::Unauthorized(anyhow::anyhow!(e)),
            },
            ServiceError::InvalidCredentials => {
                AppError::Unauthorized(anyhow::anyhow!("Invalid credentials"))
            }
            ServiceError::UnknownService(id) => {
                AppError::NotFound(anyhow::anyhow!("Unknown service: {}", id))
            }
            ServiceError::ValidationError(e) => AppError::BadRequest(anyhow::anyhow!(e)),
            ServiceError::PassTicket(e) => AppError::BadRequest(anyhow::anyhow!(e)),
            ServiceError::Redis(e) => AppError::RedisError(e),
            ServiceError::Internal(e) => AppError::InternalError(e),
        }
    }
}

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::fs;
use uuid::Uuid;

use crate::config::{JwtConfig, JwtKeys};
use crate::models::{ZOSMF_ISSUER, ZOWE_ISSUER, ZOWE_PAT_ISSUER};
use crate::services::error::TokenError;

/// JWT service for minting and verifying gateway tokens
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    token_expiration_seconds: i64,
}

/// Claims of tokens signed by the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApimlClaims {
    /// Subject (mainframe user ID)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// `APIML`, `APIML_PAT` or `zOSMF`
    pub iss: String,
    /// JWT ID
    pub jti: String,
    /// Services a personal access token may be used for
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,
    /// LTPA token obtained when the user logged in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ltpa: Option<String>,
}

impl ApimlClaims {
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// Claims read without checking the signature. Any issuer may have produced
/// the token, so every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UnverifiedClaims {
    pub sub: Option<String>,
    pub iss: Option<String>,
    pub iat: Option<i64>,
    pub exp: Option<i64>,
}

impl JwtService {
    /// Create a JWT service from the configured key material
    pub fn new(config: &JwtConfig) -> Result<Self, anyhow::Error> {
        match &config.keys {
            JwtKeys::Secret(secret) => Ok(Self::from_secret(
                secret.expose_secret().as_bytes(),
                config.token_expiration_seconds,
            )),
            JwtKeys::RsaFiles {
                private_key_path,
                public_key_path,
            } => {
                let private_key_pem = fs::read_to_string(private_key_path).map_err(|e| {
                    anyhow::anyhow!(
                        "Failed to read private key from {}: {}",
                        private_key_path,
                        e
                    )
                })?;
                let public_key_pem = fs::read_to_string(public_key_path).map_err(|e| {
                    anyhow::anyhow!("Failed to read public key from {}: {}", public_key_path, e)
                })?;

                Self::from_rsa_pem(
                    private_key_pem.as_bytes(),
                    public_key_pem.as_bytes(),
                    config.token_expiration_seconds,
                )
            }
        }
    }

    pub fn from_rsa_pem(
        private_key_pem: &[u8],
        public_key_pem: &[u8],
        token_expiration_seconds: i64,
    ) -> Result<Self, anyhow::Error> {
        let encoding_key = EncodingKey::from_rsa_pem(private_key_pem)
            .map_err(|e| anyhow::anyhow!("Failed to parse private key: {}", e))?;
        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem)
            .map_err(|e| anyhow::anyhow!("Failed to parse public key: {}", e))?;

        tracing::info!("JWT service initialized with RS256 keys");

        Ok(Self {
            encoding_key,
            decoding_key,
            algorithm: Algorithm::RS256,
            token_expiration_seconds,
        })
    }

    /// HS256 with a shared secret
    pub fn from_secret(secret: &[u8], token_expiration_seconds: i64) -> Self {
        tracing::info!("JWT service initialized with HS256 secret");

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
            token_expiration_seconds,
        }
    }

    pub fn token_expiration(&self) -> Duration {
        Duration::seconds(self.token_expiration_seconds)
    }

    pub fn sign(&self, claims: &ApimlClaims) -> Result<String, anyhow::Error> {
        encode(&Header::new(self.algorithm), claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode token: {}", e))
    }

    /// Issue a gateway JWT for a user
    pub fn issue_jwt(&self, user_id: &str, ltpa: Option<&str>) -> Result<String, anyhow::Error> {
        let now = Utc::now();
        let exp = now + self.token_expiration();

        self.sign(&ApimlClaims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: ZOWE_ISSUER.to_string(),
            jti: Uuid::new_v4().to_string(),
            scopes: Vec::new(),
            ltpa: ltpa.map(str::to_string),
        })
    }

    /// Issue a personal access token restricted to `scopes`
    pub fn issue_pat(
        &self,
        user_id: &str,
        validity_seconds: i64,
        scopes: &[String],
    ) -> Result<String, anyhow::Error> {
        let now = Utc::now();
        let exp = now + Duration::seconds(validity_seconds);

        self.sign(&ApimlClaims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: ZOWE_PAT_ISSUER.to_string(),
            jti: Uuid::new_v4().to_string(),
            scopes: scopes.to_vec(),
            ltpa: None,
        })
    }

    /// Check signature, expiry and issuer of a token signed with our key
    pub fn verify(&self, token: &str) -> Result<ApimlClaims, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.set_issuer(&[ZOWE_ISSUER, ZOWE_PAT_ISSUER, ZOSMF_ISSUER]);

        let token_data = decode::<ApimlClaims>(token, &self.decoding_key, &validation)?;
        Ok(token_data.claims)
    }

    /// Read claims without verifying anything. Only for routing decisions and
    /// for tokens whose validity is established elsewhere.
    pub fn decode_unverified(token: &str) -> Result<UnverifiedClaims, TokenError> {
        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let token_data =
            decode::<UnverifiedClaims>(token, &DecodingKey::from_secret(&[]), &validation)?;
        Ok(token_data.claims)
    }
}

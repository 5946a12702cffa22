use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::time::Duration;

use crate::models::RoutesDocument;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub jwt: JwtConfig,
    pub pat: PatConfig,
    pub redis: Option<RedisConfig>,
    pub oidc: Option<OidcConfig>,
    /// RACF application name of the gateway itself
    pub gateway_applid: String,
    /// Service id checked against PAT scopes on the gateway's own endpoints
    pub gateway_service_id: String,
    /// Users allowed to revoke tokens of other users or of whole services
    pub revocation_admins: Vec<String>,
    pub provider_timeout: Duration,
    pub routes: RoutesDocument,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub keys: JwtKeys,
    pub token_expiration_seconds: i64,
    pub cookie_name: String,
}

#[derive(Debug, Clone)]
pub enum JwtKeys {
    Secret(Secret<String>),
    RsaFiles {
        private_key_path: String,
        public_key_path: String,
    },
}

#[derive(Debug, Clone)]
pub struct PatConfig {
    pub default_validity_seconds: i64,
    pub max_validity_seconds: i64,
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct OidcConfig {
    pub introspection_url: String,
    pub client_id: String,
    pub client_secret: Secret<String>,
    /// Registry name used when mapping the token subject to a mainframe id
    pub registry: String,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let keys = match env::var("JWT_SECRET") {
            Ok(secret) => JwtKeys::Secret(Secret::new(secret)),
            Err(_) => JwtKeys::RsaFiles {
                private_key_path: get_env("JWT_PRIVATE_KEY_PATH", None, is_prod)?,
                public_key_path: get_env("JWT_PUBLIC_KEY_PATH", None, is_prod)?,
            },
        };

        let routes = match env::var("ROUTES_FILE") {
            Ok(path) => core_config::Config::load_file::<RoutesDocument>(&path)?,
            Err(_) if is_prod => {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "ROUTES_FILE is required in production but not set"
                )))
            }
            Err(_) => RoutesDocument::default(),
        };

        let oidc = match env::var("OIDC_INTROSPECTION_URL") {
            Ok(introspection_url) => Some(OidcConfig {
                introspection_url,
                client_id: get_env("OIDC_CLIENT_ID", None, is_prod)?,
                client_secret: Secret::new(get_env("OIDC_CLIENT_SECRET", None, is_prod)?),
                registry: get_env("OIDC_REGISTRY", None, is_prod)?,
            }),
            Err(_) => None,
        };

        let config = GatewayConfig {
            common: common_config,
            environment: environment.clone(),
            service_name: get_env("SERVICE_NAME", Some("gateway-service"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            jwt: JwtConfig {
                keys,
                token_expiration_seconds: parse_number(
                    "TOKEN_EXPIRATION_SECONDS",
                    &get_env("TOKEN_EXPIRATION_SECONDS", Some("28800"), is_prod)?,
                )?,
                cookie_name: get_env("COOKIE_NAME", Some("apimlAuthenticationToken"), is_prod)?,
            },
            pat: {
                let default_validity_seconds = parse_number(
                    "PAT_DEFAULT_VALIDITY_SECONDS",
                    &get_env("PAT_DEFAULT_VALIDITY_SECONDS", Some("7776000"), is_prod)?,
                )?;
                PatConfig {
                    default_validity_seconds,
                    max_validity_seconds: match env::var("PAT_MAX_VALIDITY_SECONDS") {
                        Ok(value) => parse_number("PAT_MAX_VALIDITY_SECONDS", &value)?,
                        Err(_) => default_validity_seconds,
                    },
                }
            },
            redis: env::var("REDIS_URL").ok().map(|url| RedisConfig { url }),
            oidc,
            gateway_applid: get_env("GATEWAY_APPLID", Some("ZOWEAPPL"), is_prod)?,
            gateway_service_id: get_env("GATEWAY_SERVICE_ID", Some("gateway"), is_prod)?,
            revocation_admins: parse_user_list(&env::var("REVOCATION_ADMINS").unwrap_or_default()),
            provider_timeout: Duration::from_millis(parse_number(
                "PROVIDER_TIMEOUT_MS",
                &get_env("PROVIDER_TIMEOUT_MS", Some("5000"), is_prod)?,
            )?),
            routes,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.common.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        if self.jwt.token_expiration_seconds <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "TOKEN_EXPIRATION_SECONDS must be positive"
            )));
        }

        if self.pat.default_validity_seconds <= 0
            || self.pat.max_validity_seconds < self.pat.default_validity_seconds
        {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PAT validity must be positive and not exceed PAT_MAX_VALIDITY_SECONDS"
            )));
        }

        if self.gateway_applid.is_empty() || self.gateway_applid.len() > 8 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "GATEWAY_APPLID must be 1 to 8 characters"
            )));
        }

        if self.environment == Environment::Prod {
            if matches!(self.jwt.keys, JwtKeys::Secret(_)) {
                tracing::warn!("HS256 shared secret in production - consider RS256 key files");
            }
            if self.redis.is_none() {
                tracing::warn!("REDIS_URL not set - invalidations are lost on restart");
            }
        }

        Ok(())
    }

    pub fn is_revocation_admin(&self, user_id: &str) -> bool {
        self.revocation_admins
            .iter()
            .any(|admin| admin.eq_ignore_ascii_case(user_id))
    }
}

fn parse_user_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|user| user.trim().to_uppercase())
        .filter(|user| !user.is_empty())
        .collect()
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

fn parse_number<T>(key: &str, value: &str) -> Result<T, AppError>
where
    T: std::str::FromStr<Err = std::num::ParseIntError>,
{
    value
        .parse()
        .map_err(|e: std::num::ParseIntError| AppError::ConfigError(anyhow::anyhow!("{}: {}", key, e)))
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_parses_ignoring_case() {
        assert_eq!("PROD".parse::<Environment>(), Ok(Environment::Prod));
        assert_eq!("dev".parse::<Environment>(), Ok(Environment::Dev));
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn numbers_name_the_offending_key() {
        let err = parse_number::<i64>("PROVIDER_TIMEOUT_MS", "soon").unwrap_err();
        assert!(err.to_string().contains("PROVIDER_TIMEOUT_MS"));
        assert_eq!(parse_number::<u64>("PROVIDER_TIMEOUT_MS", "250").unwrap(), 250);
    }

    #[test]
    fn admin_list_is_trimmed_and_uppercased() {
        assert_eq!(
            parse_user_list(" secadm, ,ibmuser "),
            vec!["SECADM".to_string(), "IBMUSER".to_string()]
        );
        assert!(parse_user_list("").is_empty());
    }
}

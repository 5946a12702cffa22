use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;

/// Settings every service shares: listening port and the optional file with
/// per-service overrides.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

fn default_port() -> u16 {
    10010
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            otlp_endpoint: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Load a structured document (YAML, TOML or JSON picked by extension)
    /// and deserialize it into `T`.
    pub fn load_file<T>(path: &str) -> Result<T, AppError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let document = Cfg::builder()
            .add_source(File::with_name(path).required(true))
            .build()?;

        Ok(document.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_port_is_gateway_port() {
        assert_eq!(Config::default().port, 10010);
        assert!(Config::default().otlp_endpoint.is_none());
    }

    #[test]
    fn load_file_reports_missing_document() {
        let result: Result<Config, AppError> = Config::load_file("/nonexistent/apiml-routes");
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }
}

// Client configuration for the payment provider and the booking API

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub graphql_path: String,
    pub payment_api_url: String,
    pub payment_publishable_key: String,
    pub timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:9000".to_string(),
            graphql_path: "/api".to_string(),
            payment_api_url: "https://api.stripe.com".to_string(),
            payment_publishable_key: String::new(),
            timeout_ms: 10_000,
        }
    }
}

impl ClientConfig {
    /// Loads configuration from `BOOKING_*` environment variables, e.g.
    /// `BOOKING_API_BASE_URL` or `BOOKING_PAYMENT_PUBLISHABLE_KEY`. Unset keys
    /// keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_prefix("BOOKING")
    }

    pub fn from_env_prefix(prefix: &str) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix(prefix).try_parsing(true))
            .build()?;

        let config: ClientConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api_base_url is empty".to_string()));
        }
        if self.payment_api_url.trim().is_empty() {
            return Err(ConfigError::Invalid("payment_api_url is empty".to_string()));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid("timeout_ms must be positive".to_string()));
        }
        Ok(())
    }

    pub fn graphql_url(&self) -> String {
        format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            self.graphql_path.trim_start_matches('/')
        )
    }

    pub fn tokens_url(&self) -> String {
        format!("{}/v1/tokens", self.payment_api_url.trim_end_matches('/'))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_urls() {
        let config = ClientConfig::default();

        assert_eq!(config.graphql_url(), "http://localhost:9000/api");
        assert_eq!(config.tokens_url(), "https://api.stripe.com/v1/tokens");
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_url_joining_trims_slashes() {
        let config = ClientConfig {
            api_base_url: "https://rentals.example.com/".to_string(),
            graphql_path: "/graphql".to_string(),
            payment_api_url: "https://payments.example.com/".to_string(),
            ..Default::default()
        };

        assert_eq!(config.graphql_url(), "https://rentals.example.com/graphql");
        assert_eq!(config.tokens_url(), "https://payments.example.com/v1/tokens");
    }

    #[test]
    fn test_zero_timeout_is_invalid() {
        let config = ClientConfig {
            timeout_ms: 0,
            ..Default::default()
        };

        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_from_env_prefix_overrides_defaults() {
        // Unique prefix so parallel tests don't see each other's variables
        std::env::set_var("LBTEST_API_BASE_URL", "https://rentals.example.com");
        std::env::set_var("LBTEST_TIMEOUT_MS", "2500");

        let config = ClientConfig::from_env_prefix("LBTEST").unwrap();

        assert_eq!(config.api_base_url, "https://rentals.example.com");
        assert_eq!(config.timeout_ms, 2500);
        assert_eq!(config.graphql_path, "/api");

        std::env::remove_var("LBTEST_API_BASE_URL");
        std::env::remove_var("LBTEST_TIMEOUT_MS");
    }
}

//! API configuration

use serde::Deserialize;

use core_kernel::RoundingMode;
use domain_ledger::{LedgerConfig, LedgerError};

/// API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// JWT secret for authentication
    pub jwt_secret: String,
    /// JWT expiration in seconds
    pub jwt_expiration_secs: u64,
    /// Database URL
    pub database_url: String,
    /// Log level
    pub log_level: String,
    /// Per-account daily debit ceiling, as a decimal string
    pub daily_debit_cap: String,
    /// Rounding applied to every incoming amount
    pub rounding_mode: RoundingMode,
    /// Database pool size
    pub max_connections: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            database_url: "postgres://localhost/bank_ledger".to_string(),
            log_level: "info".to_string(),
            daily_debit_cap: "1000.00".to_string(),
            rounding_mode: RoundingMode::HalfEven,
            max_connections: 10,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from `API_*` environment variables
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("API"))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validated ledger settings handed to the engine
    pub fn ledger_config(&self) -> Result<LedgerConfig, LedgerError> {
        LedgerConfig::parse(&self.daily_debit_cap, self.rounding_mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ledger_config() {
        let config = ApiConfig::default().ledger_config().unwrap();
        assert_eq!(config.daily_debit_cap().to_string(), "1000.00");
        assert_eq!(config.rounding_mode(), RoundingMode::HalfEven);
    }

    #[test]
    fn test_rejects_zero_cap() {
        let config = ApiConfig {
            daily_debit_cap: "0".to_string(),
            ..Default::default()
        };
        assert!(config.ledger_config().is_err());
    }

    #[test]
    fn test_server_addr() {
        let config = ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 9000,
            ..Default::default()
        };
        assert_eq!(config.server_addr(), "127.0.0.1:9000");
    }
}

//! Service configuration
//!
//! Each binary loads its configuration from the environment under its own
//! prefix (`QUOTATION_`, `SUBSCRIPTION_`, `CLAIMS_`), so all three services
//! can share one `.env` file.

use serde::Deserialize;

/// Configuration shared by all three service binaries
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// SQLite connection string
    pub database_url: String,
    /// Redis broker URL
    pub broker_url: String,
    /// Log level
    pub log_level: String,
    /// Background sweep interval in seconds
    pub sweep_interval_secs: u64,
    /// Chance that a generated quote converts automatically (subscription
    /// service only)
    pub auto_convert_probability: f64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: "sqlite://data/service.db?mode=rwc".to_string(),
            broker_url: "redis://127.0.0.1:6379".to_string(),
            log_level: "info".to_string(),
            sweep_interval_secs: 60,
            auto_convert_probability: 0.70,
        }
    }
}

impl ServiceConfig {
    /// Loads configuration from environment variables under the given
    /// prefix, falling back to defaults for anything unset.
    pub fn from_env(prefix: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix(prefix))
            .build()?
            .try_deserialize()
    }

    /// Loads configuration, applying service-specific defaults first.
    pub fn load(prefix: &str, default_port: u16, default_db: &str, default_sweep_secs: u64) -> Self {
        let mut config = Self::from_env(prefix).unwrap_or_default();
        if std::env::var(format!("{}_PORT", prefix)).is_err() {
            config.port = default_port;
        }
        if std::env::var(format!("{}_DATABASE_URL", prefix)).is_err() {
            config.database_url = default_db.to_string();
        }
        if std::env::var(format!("{}_SWEEP_INTERVAL_SECS", prefix)).is_err() {
            config.sweep_interval_secs = default_sweep_secs;
        }
        config
    }

    /// Returns the server bind address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.server_addr(), "0.0.0.0:8080");
        assert_eq!(config.auto_convert_probability, 0.70);
    }

    #[test]
    fn test_load_applies_service_defaults() {
        let config = ServiceConfig::load("NOPREFIX_TEST", 8083, "sqlite://data/c.db?mode=rwc", 30);
        assert_eq!(config.port, 8083);
        assert_eq!(config.database_url, "sqlite://data/c.db?mode=rwc");
        assert_eq!(config.sweep_interval_secs, 30);
    }
}

//! Runtime configuration
//!
//! Settings come from `BILLING_`-prefixed environment variables; anything
//! unset falls back to a local-development default, so the binary starts
//! with no configuration against a localhost Postgres.

use serde::Deserialize;

/// Settings for the billing API process
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Interface the listener binds to
    pub host: String,
    pub port: u16,
    /// Postgres connection string the pool is built from
    pub database_url: String,
    /// HMAC secret used to sign and verify bearer tokens
    pub jwt_secret: String,
    /// Lifetime of issued tokens, in seconds
    pub jwt_expiration_secs: u64,
    /// Tracing filter applied when `RUST_LOG` is absent
    pub log_level: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4000,
            database_url: "postgres://localhost/billing".to_string(),
            jwt_secret: "local-dev-secret".to_string(),
            jwt_expiration_secs: 24 * 60 * 60,
            log_level: "info".to_string(),
        }
    }
}

impl ApiConfig {
    /// Reads `BILLING_*` environment variables over the defaults
    ///
    /// Partial configuration is fine: each missing variable keeps its
    /// default rather than failing the whole load.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("BILLING"))
            .build()?
            .try_deserialize()
    }

    /// The socket address string the server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

//! Application configuration
//!
//! Values come from the environment (`JWT_SECRET`, `STORE_BACKEND`, ...)
//! layered over the defaults below. Database and storage settings are read
//! by their own `from_env` constructors in the `common` crate.

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

use crate::jwt::JwtConfig;

/// Which persistence backend serves the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    /// Process-local store, for development and tests
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub bind_address: String,
    pub store_backend: StoreBackend,
    pub jwt_secret: String,
    pub jwt_token_expiry: u64,
    /// Superuser created at start-up when both are set
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("bind_address", "0.0.0.0:3001")?
            .set_default("store_backend", "postgres")?
            .set_default("jwt_token_expiry", 604_800_i64)?
            .add_source(Environment::default().try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn jwt_config(&self) -> JwtConfig {
        JwtConfig {
            secret: self.jwt_secret.clone(),
            token_expiry: self.jwt_token_expiry,
        }
    }

    /// Start-up superuser credentials, if configured
    pub fn admin_credentials(&self) -> Option<(&str, &str)> {
        match (&self.admin_email, &self.admin_password) {
            (Some(email), Some(password)) => Some((email.as_str(), password.as_str())),
            _ => None,
        }
    }
}

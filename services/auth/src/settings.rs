//! Service settings loaded through the `config` crate
//!
//! Values come from `APP_*` environment variables, e.g. `APP_BIND_ADDRESS`,
//! `APP_ROOT_EMAIL`, `APP_ROOT_PASSWORD`.

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub bind_address: String,
    /// Nickname of the bootstrapped root account
    pub root_nickname: String,
    pub root_email: Option<String>,
    pub root_password: Option<String>,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("bind_address", "0.0.0.0:3000")?
            .set_default("root_nickname", "root")?
            .add_source(Environment::with_prefix("APP"))
            .build()?
            .try_deserialize()
    }

    /// Root credentials, when both are configured
    pub fn root_credentials(&self) -> Option<(&str, &str)> {
        match (&self.root_email, &self.root_password) {
            (Some(email), Some(password)) => Some((email.as_str(), password.as_str())),
            _ => None,
        }
    }
}

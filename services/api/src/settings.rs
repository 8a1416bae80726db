//! Service settings loaded through the `config` crate
//!
//! Values come from `APP_*` environment variables: `APP_BIND_ADDRESS`,
//! `APP_UTC_OFFSET_MINUTES`, `APP_LEDGER_ENDPOINT`, `APP_LEDGER_CANISTER_ID`,
//! `APP_LEDGER_TIMEOUT_SECS`.

use anyhow::Result;
use chrono::FixedOffset;
use config::{Config, ConfigError, Environment};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub bind_address: String,
    /// Company local time relative to UTC
    pub utc_offset_minutes: i32,
    pub ledger_endpoint: String,
    /// Ledger notifications are disabled without a canister id
    pub ledger_canister_id: Option<String>,
    pub ledger_timeout_secs: u64,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("bind_address", "0.0.0.0:3001")?
            .set_default("utc_offset_minutes", 0)?
            .set_default("ledger_endpoint", "http://localhost:4943")?
            .set_default("ledger_timeout_secs", 10)?
            .add_source(Environment::with_prefix("APP").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).ok_or_else(|| {
            anyhow::anyhow!("UTC offset of {} minutes is out of range", self.utc_offset_minutes)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear() {
        unsafe {
            for key in [
                "APP_BIND_ADDRESS",
                "APP_UTC_OFFSET_MINUTES",
                "APP_LEDGER_ENDPOINT",
                "APP_LEDGER_CANISTER_ID",
                "APP_LEDGER_TIMEOUT_SECS",
            ] {
                std::env::remove_var(key);
            }
        }
    }

    #[test]
    #[serial]
    fn defaults() {
        clear();
        let settings = Settings::load().unwrap();
        assert_eq!(settings.bind_address, "0.0.0.0:3001");
        assert_eq!(settings.offset().unwrap(), FixedOffset::east_opt(0).unwrap());
        assert_eq!(settings.ledger_timeout_secs, 10);
        assert!(settings.ledger_canister_id.is_none());
    }

    #[test]
    #[serial]
    fn offset_and_ledger_from_environment() {
        clear();
        unsafe {
            std::env::set_var("APP_UTC_OFFSET_MINUTES", "420");
            std::env::set_var("APP_LEDGER_CANISTER_ID", "rrkah-fqaaa-aaaaa-aaaaq-cai");
        }

        let settings = Settings::load().unwrap();
        assert_eq!(
            settings.offset().unwrap(),
            FixedOffset::east_opt(7 * 3600).unwrap()
        );
        assert_eq!(
            settings.ledger_canister_id.as_deref(),
            Some("rrkah-fqaaa-aaaaa-aaaaq-cai")
        );
        clear();
    }

    #[test]
    #[serial]
    fn absurd_offsets_are_rejected() {
        clear();
        unsafe {
            std::env::set_var("APP_UTC_OFFSET_MINUTES", "100000");
        }
        let settings = Settings::load().unwrap();
        assert!(settings.offset().is_err());
        clear();
    }
}

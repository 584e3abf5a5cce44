use anyhow::{anyhow, Result};
use std::env;

use crate::constants::Constants;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub log_level: String,
    pub reconcile_interval_secs: u64,
    pub clock_refresh_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:./roombook.db".to_string());

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let reconcile_interval_secs =
            read_secs("RECONCILE_INTERVAL_SECS", Constants::RECONCILE_INTERVAL_SECS)?;
        let clock_refresh_secs = read_secs("CLOCK_REFRESH_SECS", Constants::CLOCK_REFRESH_SECS)?;

        Ok(Self {
            database_url,
            log_level,
            reconcile_interval_secs,
            clock_refresh_secs,
        })
    }
}

fn read_secs(key: &str, default: u64) -> Result<u64> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| anyhow!("{} must be a number of seconds", key)),
        Err(_) => Ok(default),
    }
}

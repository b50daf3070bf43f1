use anyhow::Result;
use std::env;
use std::time::Duration;
use crate::constants::{DEFAULT_GEOCODER_TIMEOUT_SECS, DEFAULT_GEOCODER_URL, DEFAULT_GEOCODER_USER_AGENT};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub geocoder_url: String,
    pub geocoder_user_agent: String,
    pub geocoder_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            geocoder_url: env::var("GEOCODER_URL")
                .unwrap_or_else(|_| DEFAULT_GEOCODER_URL.to_string()),
            geocoder_user_agent: env::var("GEOCODER_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_GEOCODER_USER_AGENT.to_string()),
            geocoder_timeout: Duration::from_secs(
                env::var("GEOCODER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|secs| secs.parse().ok())
                    .unwrap_or(DEFAULT_GEOCODER_TIMEOUT_SECS),
            ),
        })
    }
}

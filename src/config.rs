use serde::Deserialize;

use crate::board::session::DEFAULT_NOTICE_CAPACITY;
use crate::services::DEFAULT_CHANGE_FEED_CAPACITY;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub cors_origin: String,
    pub change_feed_capacity: usize,
    pub notice_capacity: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        Ok(Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(21547),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:board-sync.db".into()),
            cors_origin: std::env::var("CORS_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:21548,http://127.0.0.1:21548".into()),
            change_feed_capacity: parse_capacity("CHANGE_FEED_CAPACITY", DEFAULT_CHANGE_FEED_CAPACITY)?,
            notice_capacity: parse_capacity("NOTICE_CAPACITY", DEFAULT_NOTICE_CAPACITY)?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 21547,
            database_url: "sqlite:board-sync.db".into(),
            cors_origin: "http://localhost:21548,http://127.0.0.1:21548".into(),
            change_feed_capacity: DEFAULT_CHANGE_FEED_CAPACITY,
            notice_capacity: DEFAULT_NOTICE_CAPACITY,
        }
    }
}

fn parse_capacity(key: &str, default: usize) -> Result<usize, anyhow::Error> {
    match std::env::var(key) {
        Ok(raw) => {
            let value: usize = raw
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("{key} must be a positive integer: {e}"))?;
            anyhow::ensure!(value > 0, "{key} must be greater than zero");
            Ok(value)
        }
        Err(_) => Ok(default),
    }
}

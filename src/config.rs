use std::env;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    /// Outbound buffer per tracking subscriber; a subscriber whose
    /// buffer fills up is dropped rather than queued without bound.
    pub subscriber_buffer_size: usize,
    /// Cap on location history returned in snapshots and pulls.
    pub location_history_limit: usize,
    /// Admits unauthenticated/unauthorized tracking subscribers in a
    /// read-only diagnostic mode. Off by default; strict authorization
    /// is the production behavior.
    pub allow_observer_mode: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            subscriber_buffer_size: parse_or_default("SUBSCRIBER_BUFFER_SIZE", 64)?,
            location_history_limit: parse_or_default("LOCATION_HISTORY_LIMIT", 50)?,
            allow_observer_mode: parse_or_default("ALLOW_OBSERVER_MODE", false)?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 3000,
            log_level: "info".to_string(),
            subscriber_buffer_size: 64,
            location_history_limit: 50,
            allow_observer_mode: false,
        }
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}

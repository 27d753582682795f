//! Server settings from environment variables.
//!
//! - `HOST` (default `0.0.0.0`), `PORT` (default `8080`)
//! - `DATABASE`: JSON snapshot file; unset keeps records in memory only
//! - `SESSION_SECRET`: at least 64 bytes for the session cookie key; unset generates one per start

use std::path::PathBuf;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database: Option<PathBuf>,
    pub session_secret: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database: None,
            session_secret: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unparsable or empty values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let port = match non_empty("PORT").map(|p| p.parse::<u16>()) {
            Some(Ok(port)) => port,
            Some(Err(_)) => {
                log::warn!("Ignoring invalid PORT, using {}", default_port());
                default_port()
            }
            None => default_port(),
        };
        Self {
            host: non_empty("HOST").unwrap_or_else(default_host),
            port,
            database: non_empty("DATABASE").map(PathBuf::from),
            session_secret: non_empty("SESSION_SECRET"),
        }
    }
}

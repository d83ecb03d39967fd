//! Configuration module for the lodge backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key for API authentication (required in production)
    pub api_psk: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Endpoint receiving reply e-mails for contact messages
    pub notify_url: Option<String>,
    /// Upper bound for a single notification dispatch
    pub notify_timeout: Duration,
    /// Location used for events that do not name one
    pub default_location: String,
    /// Default mandate length for lodge positions, in years
    pub term_years: u32,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        let api_psk = env::var("LODGE_API_PSK").ok().filter(|s| !s.is_empty());

        let db_path = env::var("LODGE_DB_PATH")
            .unwrap_or_else(|_| "./data/lodge.sqlite".to_string())
            .into();

        let bind_addr = env::var("LODGE_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|e| format!("Invalid LODGE_BIND_ADDR format: {}", e))?;

        let log_level = env::var("LODGE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let notify_url = env::var("LODGE_NOTIFY_URL").ok().filter(|s| !s.is_empty());

        let notify_timeout = match env::var("LODGE_NOTIFY_TIMEOUT_SECS") {
            Ok(v) => Duration::from_secs(
                v.parse()
                    .map_err(|e| format!("Invalid LODGE_NOTIFY_TIMEOUT_SECS: {}", e))?,
            ),
            Err(_) => Duration::from_secs(5),
        };

        let default_location =
            env::var("LODGE_DEFAULT_LOCATION").unwrap_or_else(|_| "Templo".to_string());

        let term_years = match env::var("LODGE_TERM_YEARS") {
            Ok(v) => v
                .parse()
                .map_err(|e| format!("Invalid LODGE_TERM_YEARS: {}", e))?,
            Err(_) => 2,
        };

        Ok(Self {
            api_psk,
            db_path,
            bind_addr,
            log_level,
            notify_url,
            notify_timeout,
            default_location,
            term_years,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // Clear any existing env vars
        for key in [
            "LODGE_API_PSK",
            "LODGE_DB_PATH",
            "LODGE_BIND_ADDR",
            "LODGE_LOG_LEVEL",
            "LODGE_NOTIFY_URL",
            "LODGE_NOTIFY_TIMEOUT_SECS",
            "LODGE_DEFAULT_LOCATION",
            "LODGE_TERM_YEARS",
        ] {
            env::remove_var(key);
        }

        let config = Config::from_env().unwrap();

        assert!(config.api_psk.is_none());
        assert_eq!(config.db_path, PathBuf::from("./data/lodge.sqlite"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
        assert!(config.notify_url.is_none());
        assert_eq!(config.notify_timeout, Duration::from_secs(5));
        assert_eq!(config.default_location, "Templo");
        assert_eq!(config.term_years, 2);
    }
}

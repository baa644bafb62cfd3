//! Configuration module for the offline sync engine.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Flat size estimate for a selected non-Files tab, in bytes.
pub const DEFAULT_TAB_UNIT_SIZE: u64 = 100_000;

/// Engine configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file holding sync settings
    pub db_path: PathBuf,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Size estimate for a selected non-Files tab
    pub tab_unit_size: u64,
    /// Delay between sync job status polls
    pub poll_interval: Duration,
    /// Polls before a running job is treated as inconclusive
    pub max_poll_attempts: u32,
    /// Consecutive poll errors before falling back to a full refresh
    pub max_poll_errors: u32,
    /// Whether the confirmation dialog carries the Wi-Fi-only warning
    pub wifi_only: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./data/offline_sync.sqlite"),
            log_level: "info".to_string(),
            tab_unit_size: DEFAULT_TAB_UNIT_SIZE,
            poll_interval: Duration::from_millis(1000),
            max_poll_attempts: 600,
            max_poll_errors: 3,
            wifi_only: true,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let db_path = env::var("OFFLINE_SYNC_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let log_level = env::var("OFFLINE_SYNC_LOG_LEVEL").unwrap_or(defaults.log_level);

        let tab_unit_size = parse_var("OFFLINE_SYNC_TAB_UNIT_SIZE", defaults.tab_unit_size);
        let poll_interval = Duration::from_millis(parse_var(
            "OFFLINE_SYNC_POLL_INTERVAL_MS",
            defaults.poll_interval.as_millis() as u64,
        ));
        let max_poll_attempts =
            parse_var("OFFLINE_SYNC_MAX_POLL_ATTEMPTS", defaults.max_poll_attempts);
        let max_poll_errors = parse_var("OFFLINE_SYNC_MAX_POLL_ERRORS", defaults.max_poll_errors);
        let wifi_only = parse_var("OFFLINE_SYNC_WIFI_ONLY", defaults.wifi_only);

        Self {
            db_path,
            log_level,
            tab_unit_size,
            poll_interval,
            max_poll_attempts,
            max_poll_errors,
            wifi_only,
        }
    }
}

fn parse_var<T: FromStr + Copy + std::fmt::Debug>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid {} value {:?}, using {:?}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env vars are process-global, so all assertions share one test.
    #[test]
    fn test_config_from_env() {
        for name in [
            "OFFLINE_SYNC_DB_PATH",
            "OFFLINE_SYNC_LOG_LEVEL",
            "OFFLINE_SYNC_TAB_UNIT_SIZE",
            "OFFLINE_SYNC_POLL_INTERVAL_MS",
            "OFFLINE_SYNC_MAX_POLL_ATTEMPTS",
            "OFFLINE_SYNC_MAX_POLL_ERRORS",
            "OFFLINE_SYNC_WIFI_ONLY",
        ] {
            env::remove_var(name);
        }

        let config = Config::from_env();

        assert_eq!(config.db_path, PathBuf::from("./data/offline_sync.sqlite"));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.tab_unit_size, 100_000);
        assert_eq!(config.poll_interval, Duration::from_millis(1000));
        assert_eq!(config.max_poll_attempts, 600);
        assert_eq!(config.max_poll_errors, 3);
        assert!(config.wifi_only);

        env::set_var("OFFLINE_SYNC_TAB_UNIT_SIZE", "2048");
        env::set_var("OFFLINE_SYNC_WIFI_ONLY", "false");
        env::set_var("OFFLINE_SYNC_MAX_POLL_ATTEMPTS", "not-a-number");

        let config = Config::from_env();

        assert_eq!(config.tab_unit_size, 2048);
        assert!(!config.wifi_only);
        assert_eq!(config.max_poll_attempts, 600);

        env::remove_var("OFFLINE_SYNC_TAB_UNIT_SIZE");
        env::remove_var("OFFLINE_SYNC_WIFI_ONLY");
        env::remove_var("OFFLINE_SYNC_MAX_POLL_ATTEMPTS");
    }
}

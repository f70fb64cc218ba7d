use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::aggregate::MoodPolicy;
use crate::error::ConfigError;

/// Default config file, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "life-os.toml";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DashboardConfig {
    /// SQLite file backing the record store
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// IANA timezone that defines the application calendar
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Width of the trailing journal window in days
    #[serde(default = "default_trailing_days")]
    pub trailing_days: u32,

    /// Hard cap on the activities fetch
    #[serde(default = "default_activity_limit")]
    pub activity_limit: usize,

    /// Size of the "recent transactions" list slice
    #[serde(default = "default_recent_transactions")]
    pub recent_transactions: usize,

    /// What to do with mood scores outside 0..=10
    #[serde(default)]
    pub mood_policy: MoodPolicy,

    /// Optional per-fetch timeout in milliseconds
    #[serde(default)]
    pub fetch_timeout_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Bind address for the HTTP server
    #[serde(default = "default_server_addr")]
    pub server_addr: String,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("life-os.db")
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_trailing_days() -> u32 {
    7
}

fn default_activity_limit() -> usize {
    5
}

fn default_recent_transactions() -> usize {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_server_addr() -> String {
    "0.0.0.0:3000".to_string()
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            timezone: default_timezone(),
            trailing_days: default_trailing_days(),
            activity_limit: default_activity_limit(),
            recent_transactions: default_recent_transactions(),
            mood_policy: MoodPolicy::default(),
            fetch_timeout_ms: None,
            log_level: default_log_level(),
            server_addr: default_server_addr(),
        }
    }
}

impl DashboardConfig {
    /// Load from `life-os.toml` (or `$LIFE_OS_CONFIG`) and `LIFE_OS_*` env vars.
    pub fn load() -> Result<Self, ConfigError> {
        let file = std::env::var("LIFE_OS_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        let config: Self = Config::builder()
            .add_source(File::with_name(&file).required(false))
            .add_source(Environment::with_prefix("LIFE_OS").try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tz()?;

        if self.trailing_days == 0 {
            return Err(ConfigError::ZeroLimit("trailing_days"));
        }
        if self.activity_limit == 0 {
            return Err(ConfigError::ZeroLimit("activity_limit"));
        }
        if self.recent_transactions == 0 {
            return Err(ConfigError::ZeroLimit("recent_transactions"));
        }

        Ok(())
    }

    /// Application calendar timezone
    pub fn tz(&self) -> Result<chrono_tz::Tz, ConfigError> {
        self.timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|_| ConfigError::UnknownTimezone(self.timezone.clone()))
    }

    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // load() reads process-wide env vars, so those tests run one at a time
    static TEST_LOCK: Mutex<()> = Mutex::new(());

    const ENV_KEYS: [&str; 4] = [
        "LIFE_OS_CONFIG",
        "LIFE_OS_ACTIVITY_LIMIT",
        "LIFE_OS_TIMEZONE",
        "LIFE_OS_TRAILING_DAYS",
    ];

    fn clear_env() {
        for key in ENV_KEYS {
            std::env::remove_var(key);
        }
    }

    fn write_config(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("life-os.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = DashboardConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.trailing_days, 7);
        assert_eq!(config.activity_limit, 5);
        assert_eq!(config.recent_transactions, 5);
        assert_eq!(config.mood_policy, MoodPolicy::PassThrough);
        assert!(config.fetch_timeout().is_none());
    }

    #[test]
    fn test_serde_defaults_fill_missing_keys() {
        let config: DashboardConfig =
            serde_json::from_value(serde_json::json!({ "timezone": "America/Argentina/Buenos_Aires" })).unwrap();

        assert_eq!(config.database_path, PathBuf::from("life-os.db"));
        assert_eq!(config.tz().unwrap(), chrono_tz::America::Argentina::Buenos_Aires);
    }

    #[test]
    fn test_mood_policy_parses_snake_case() {
        let config: DashboardConfig =
            serde_json::from_value(serde_json::json!({ "mood_policy": "clamp" })).unwrap();

        assert_eq!(config.mood_policy, MoodPolicy::Clamp);
    }

    #[test]
    fn test_rejects_unknown_timezone() {
        let config = DashboardConfig {
            timezone: "Mars/Olympus_Mons".to_string(),
            ..DashboardConfig::default()
        };

        assert!(matches!(config.validate(), Err(ConfigError::UnknownTimezone(_))));
    }

    #[test]
    fn test_rejects_zero_activity_limit() {
        let config = DashboardConfig {
            activity_limit: 0,
            ..DashboardConfig::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroLimit("activity_limit"))
        ));
    }

    #[test]
    fn test_load_layers_file_then_env() {
        let _lock = TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
timezone = "America/Argentina/Buenos_Aires"
activity_limit = 8
trailing_days = 14
mood_policy = "discard"
"#,
        );
        std::env::set_var("LIFE_OS_CONFIG", &path);
        std::env::set_var("LIFE_OS_ACTIVITY_LIMIT", "3");

        let config = DashboardConfig::load();
        clear_env();
        let config = config.unwrap();

        // env beats the file, the file beats the defaults
        assert_eq!(config.activity_limit, 3);
        assert_eq!(config.trailing_days, 14);
        assert_eq!(config.timezone, "America/Argentina/Buenos_Aires");
        assert_eq!(config.mood_policy, MoodPolicy::Discard);
        assert_eq!(config.recent_transactions, 5);
        assert_eq!(config.database_path, PathBuf::from("life-os.db"));
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let _lock = TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        let dir = tempfile::tempdir().unwrap();
        std::env::set_var("LIFE_OS_CONFIG", dir.path().join("missing.toml"));

        let config = DashboardConfig::load();
        clear_env();
        let config = config.unwrap();

        assert_eq!(config.timezone, "UTC");
        assert_eq!(config.activity_limit, 5);
    }

    #[test]
    fn test_load_rejects_unknown_timezone_from_env() {
        let _lock = TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "timezone = \"UTC\"\n");
        std::env::set_var("LIFE_OS_CONFIG", &path);
        std::env::set_var("LIFE_OS_TIMEZONE", "Mars/X");

        let result = DashboardConfig::load();
        clear_env();

        assert!(matches!(result, Err(ConfigError::UnknownTimezone(tz)) if tz == "Mars/X"));
    }

    #[test]
    fn test_load_rejects_zero_limit_from_file() {
        let _lock = TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "trailing_days = 0\n");
        std::env::set_var("LIFE_OS_CONFIG", &path);

        let result = DashboardConfig::load();
        clear_env();

        assert!(matches!(result, Err(ConfigError::ZeroLimit("trailing_days"))));
    }
}

//! Application configuration loaded from environment variables or a JSON file.

use std::env;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Deserialize;

use flood_core::domain::FloodPolicy;
use flood_infra::DatabaseConfig;

/// Demo driver settings.
#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub subject: i64,
    pub attempts: u32,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: Option<DatabaseConfig>,
    pub policy: FloodPolicy,
    pub check_timeout: Option<Duration>,
    pub auto_migrate: bool,
    pub demo: DemoConfig,
}

impl AppConfig {
    /// Load from `FLOOD_CONFIG_FILE` when set, otherwise from the environment.
    pub fn load() -> anyhow::Result<Self> {
        let lookup = |key: &str| env::var(key).ok();
        match lookup("FLOOD_CONFIG_FILE") {
            Some(path) => Self::from_file(path, lookup),
            None => Self::from_lookup(lookup),
        }
    }

    /// Build configuration from a variable lookup (normally `std::env::var`).
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database = lookup("DATABASE_URL")
            .map(|url| -> anyhow::Result<DatabaseConfig> {
                let mut config = DatabaseConfig::new(url);
                config.max_connections = parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?;
                config.min_connections = parse_or(&lookup, "DB_MIN_CONNECTIONS", 1)?;
                Ok(config)
            })
            .transpose()?;

        let policy = FloodPolicy::from_secs(
            parse_or(&lookup, "FLOOD_WINDOW_SECS", 60)?,
            parse_or(&lookup, "FLOOD_MAX_EVENTS", 5)?,
        )?;

        Self::with_runtime_settings(database, policy, &lookup)
    }

    /// Read the legacy `{"DB": {...}, "App": {...}}` JSON file.
    pub fn from_file<F>(path: impl AsRef<Path>, lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Couldn't open the config {}", path.display()))?;
        Self::from_json(&raw, lookup)
            .with_context(|| format!("Couldn't parse the config {}", path.display()))
    }

    pub fn from_json<F>(raw: &str, lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file: FileConfig = serde_json::from_str(raw)?;
        let database = file.db.map(FileDbConfig::into_database_config);

        Self::with_runtime_settings(database, file.app, &lookup)
    }

    fn with_runtime_settings<F>(
        database: Option<DatabaseConfig>,
        policy: FloodPolicy,
        lookup: &F,
    ) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let check_timeout = lookup("FLOOD_CHECK_TIMEOUT_MS")
            .map(|ms| ms.parse::<u64>().map(Duration::from_millis))
            .transpose()
            .context("FLOOD_CHECK_TIMEOUT_MS must be a number of milliseconds")?;

        let auto_migrate = lookup("FLOOD_AUTO_MIGRATE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        Ok(Self {
            database,
            policy,
            check_timeout,
            auto_migrate,
            demo: DemoConfig {
                subject: parse_or(lookup, "FLOOD_DEMO_SUBJECT", 1)?,
                attempts: parse_or(lookup, "FLOOD_DEMO_ATTEMPTS", 5)?,
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(value) => value
            .parse()
            .with_context(|| format!("{key} has an invalid value: {value:?}")),
        None => Ok(default),
    }
}

#[derive(Debug, Deserialize)]
struct FileConfig {
    #[serde(rename = "DB")]
    db: Option<FileDbConfig>,
    #[serde(rename = "App")]
    app: FloodPolicy,
}

#[derive(Debug, Deserialize)]
struct FileDbConfig {
    user: String,
    dbname: String,
    password: String,
    host: String,
    port: u16,
    #[serde(default = "default_sslmode")]
    sslmode: String,
    #[serde(rename = "connCount", default = "default_conn_count")]
    conn_count: u32,
}

fn default_sslmode() -> String {
    "prefer".to_string()
}

fn default_conn_count() -> u32 {
    10
}

impl FileDbConfig {
    fn into_database_config(self) -> DatabaseConfig {
        let url = format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            utf8_percent_encode(&self.user, NON_ALPHANUMERIC),
            utf8_percent_encode(&self.password, NON_ALPHANUMERIC),
            self.host,
            self.port,
            self.dbname,
            self.sslmode
        );
        let mut config = DatabaseConfig::new(url);
        config.max_connections = self.conn_count;
        config
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_database() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();

        assert!(config.database.is_none());
        assert_eq!(config.policy, FloodPolicy::from_secs(60, 5).unwrap());
        assert_eq!(config.check_timeout, None);
        assert!(!config.auto_migrate);
        assert_eq!(config.demo.subject, 1);
        assert_eq!(config.demo.attempts, 5);
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://flood@localhost/flood"),
            ("DB_MAX_CONNECTIONS", "4"),
            ("FLOOD_WINDOW_SECS", "10"),
            ("FLOOD_MAX_EVENTS", "2"),
            ("FLOOD_CHECK_TIMEOUT_MS", "1500"),
            ("FLOOD_AUTO_MIGRATE", "true"),
        ]))
        .unwrap();

        let database = config.database.unwrap();
        assert_eq!(database.url, "postgres://flood@localhost/flood");
        assert_eq!(database.max_connections, 4);
        assert_eq!(config.policy.window_seconds(), 10);
        assert_eq!(config.policy.max_events(), 2);
        assert_eq!(config.check_timeout, Some(Duration::from_millis(1500)));
        assert!(config.auto_migrate);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(AppConfig::from_lookup(lookup_from(&[("FLOOD_MAX_EVENTS", "many")])).is_err());
        assert!(AppConfig::from_lookup(lookup_from(&[("FLOOD_WINDOW_SECS", "0")])).is_err());
    }

    #[test]
    fn test_legacy_json_file() {
        let raw = r#"{
            "DB": {
                "user": "flood",
                "dbname": "flood",
                "password": "secret",
                "host": "db",
                "port": 5432,
                "sslmode": "disable",
                "connCount": 3
            },
            "App": {"maxSecondsPassed": 30, "maxTotalRecords": 4}
        }"#;

        let config = AppConfig::from_json(raw, lookup_from(&[])).unwrap();

        let database = config.database.unwrap();
        assert_eq!(
            database.url,
            "postgres://flood:secret@db:5432/flood?sslmode=disable"
        );
        assert_eq!(database.max_connections, 3);
        assert_eq!(config.policy.window_seconds(), 30);
        assert_eq!(config.policy.max_events(), 4);
    }

    #[test]
    fn test_legacy_credentials_are_url_encoded() {
        let raw = r#"{
            "DB": {
                "user": "flood admin",
                "dbname": "flood",
                "password": "p@ss:w/rd",
                "host": "db",
                "port": 5432
            },
            "App": {"maxSecondsPassed": 60, "maxTotalRecords": 5}
        }"#;

        let config = AppConfig::from_json(raw, lookup_from(&[])).unwrap();

        assert_eq!(
            config.database.unwrap().url,
            "postgres://flood%20admin:p%40ss%3Aw%2Frd@db:5432/flood?sslmode=prefer"
        );
    }
}

//! Runtime configuration.
//!
//! Everything is read from the environment at startup. A `.env` file in the
//! working directory is honored outside of tests. CLI flags override the
//! database URL and owner afterwards.

use std::time::Duration;

use study_core::model::OwnerId;

pub const DEFAULT_DB_URL: &str = "sqlite://study.sqlite3";
pub const DEFAULT_OWNER: &str = "local";
pub const DEFAULT_TICK_MS: u64 = 1000;
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for the environment variable {0}: {1}")]
    InvalidValue(&'static str, String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub db_url: String,
    pub owner: OwnerId,
    pub tick_interval: Duration,
    pub log_filter: String,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` when a variable is set but unusable.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's value if
    /// it is set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` when a variable is set but unusable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let db_url = match lookup("STUDY_DB_URL") {
            Some(raw) if raw.trim().is_empty() => {
                return Err(ConfigError::InvalidValue("STUDY_DB_URL", "empty".into()));
            }
            Some(raw) => raw,
            None => DEFAULT_DB_URL.to_owned(),
        };

        let owner = match lookup("STUDY_OWNER_ID") {
            Some(raw) => raw
                .parse::<OwnerId>()
                .map_err(|e| ConfigError::InvalidValue("STUDY_OWNER_ID", e.to_string()))?,
            None => OwnerId::new(DEFAULT_OWNER),
        };

        let tick_ms = match lookup("STUDY_TICK_MS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => ms,
                _ => {
                    return Err(ConfigError::InvalidValue(
                        "STUDY_TICK_MS",
                        format!("'{raw}' is not a positive number of milliseconds"),
                    ));
                }
            },
            None => DEFAULT_TICK_MS,
        };

        let log_filter = lookup("RUST_LOG")
            .filter(|raw| !raw.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_owned());

        Ok(Self {
            db_url,
            owner,
            tick_interval: Duration::from_millis(tick_ms),
            log_filter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.db_url, DEFAULT_DB_URL);
        assert_eq!(config.owner, OwnerId::new("local"));
        assert_eq!(config.tick_interval, Duration::from_secs(1));
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("STUDY_DB_URL", "sqlite://tmp/test.sqlite3"),
            ("STUDY_OWNER_ID", " ana "),
            ("STUDY_TICK_MS", "250"),
            ("RUST_LOG", "debug,sqlx=warn"),
        ]))
        .unwrap();
        assert_eq!(config.db_url, "sqlite://tmp/test.sqlite3");
        assert_eq!(config.owner, OwnerId::new("ana"));
        assert_eq!(config.tick_interval, Duration::from_millis(250));
        assert_eq!(config.log_filter, "debug,sqlx=warn");
    }

    #[test]
    fn rejects_unusable_values() {
        assert!(matches!(
            Config::from_lookup(lookup(&[("STUDY_TICK_MS", "0")])),
            Err(ConfigError::InvalidValue("STUDY_TICK_MS", _))
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("STUDY_TICK_MS", "fast")])),
            Err(ConfigError::InvalidValue("STUDY_TICK_MS", _))
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("STUDY_OWNER_ID", "  ")])),
            Err(ConfigError::InvalidValue("STUDY_OWNER_ID", _))
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("STUDY_DB_URL", "")])),
            Err(ConfigError::InvalidValue("STUDY_DB_URL", _))
        ));
    }
}

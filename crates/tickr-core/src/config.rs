//! Runtime configuration resolved from `TICKR_*` environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::gateway::DEFAULT_API_URL;
use crate::market::DEFAULT_POLL_INTERVAL;
use crate::search::SearchConfig;

pub const DEFAULT_TIMEOUT_MS: u64 = 3_000;
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a positive integer, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },

    #[error("{name} cannot be empty")]
    Empty { name: &'static str },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickrConfig {
    pub api_url: String,
    pub session_path: PathBuf,
    pub timeout_ms: u64,
    pub session_ttl: Duration,
    pub search: SearchConfig,
    pub market_poll_interval: Duration,
}

impl Default for TickrConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            session_path: default_session_path(env::var_os("HOME").map(PathBuf::from)),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            session_ttl: DEFAULT_SESSION_TTL,
            search: SearchConfig::default(),
            market_poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl TickrConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Resolves configuration through `lookup`; unset variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self {
            session_path: default_session_path(lookup("HOME").map(PathBuf::from)),
            ..Self::default()
        };

        if let Some(url) = lookup("TICKR_API_URL") {
            let url = url.trim();
            if url.is_empty() {
                return Err(ConfigError::Empty {
                    name: "TICKR_API_URL",
                });
            }
            config.api_url = url.trim_end_matches('/').to_owned();
        }
        if let Some(path) = lookup("TICKR_SESSION_PATH").filter(|path| !path.trim().is_empty()) {
            config.session_path = PathBuf::from(path);
        }
        if let Some(value) = number::<u64>(&lookup, "TICKR_TIMEOUT_MS")? {
            config.timeout_ms = value;
        }
        if let Some(value) = number::<u64>(&lookup, "TICKR_SESSION_TTL_SECS")? {
            config.session_ttl = Duration::from_secs(value);
        }
        if let Some(value) = number::<u64>(&lookup, "TICKR_SEARCH_DEBOUNCE_MS")? {
            config.search.debounce = Duration::from_millis(value);
        }
        if let Some(value) = number::<usize>(&lookup, "TICKR_SEARCH_PAGE_SIZE")? {
            config.search.page_size = value;
        }
        if let Some(value) = number::<u64>(&lookup, "TICKR_MARKET_POLL_SECS")? {
            config.market_poll_interval = Duration::from_secs(value);
        }

        Ok(config)
    }
}

fn number<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr + PartialEq + Default,
{
    let Some(raw) = lookup(name) else {
        return Ok(None);
    };
    match raw.trim().parse::<T>() {
        Ok(value) if value != T::default() => Ok(Some(value)),
        _ => Err(ConfigError::InvalidNumber { name, value: raw }),
    }
}

fn default_session_path(home: Option<PathBuf>) -> PathBuf {
    home.filter(|home| !home.as_os_str().is_empty())
        .map(|home| home.join(".tickr"))
        .unwrap_or_else(|| PathBuf::from(".tickr"))
        .join("session.json")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = TickrConfig::from_lookup(lookup(&[("HOME", "/home/arjun")])).expect("config");
        assert_eq!(config.api_url, "http://localhost:8080/api/v1");
        assert_eq!(config.session_path, PathBuf::from("/home/arjun/.tickr/session.json"));
        assert_eq!(config.session_ttl, Duration::from_secs(86_400));
        assert_eq!(config.search.debounce, Duration::from_millis(300));
        assert_eq!(config.search.page_size, 10);
        assert_eq!(config.market_poll_interval, Duration::from_secs(300));
    }

    #[test]
    fn overrides_are_applied() {
        let config = TickrConfig::from_lookup(lookup(&[
            ("TICKR_API_URL", "https://api.tickr.io/api/v1/"),
            ("TICKR_SEARCH_PAGE_SIZE", "25"),
            ("TICKR_MARKET_POLL_SECS", "60"),
        ]))
        .expect("config");
        assert_eq!(config.api_url, "https://api.tickr.io/api/v1");
        assert_eq!(config.search.page_size, 25);
        assert_eq!(config.market_poll_interval, Duration::from_secs(60));
    }

    #[test]
    fn rejects_bad_numbers() {
        for raw in ["abc", "-1", "0"] {
            let error = TickrConfig::from_lookup(lookup(&[("TICKR_TIMEOUT_MS", raw)]))
                .expect_err("must fail");
            assert_eq!(
                error,
                ConfigError::InvalidNumber {
                    name: "TICKR_TIMEOUT_MS",
                    value: raw.to_owned(),
                }
            );
        }
    }
}

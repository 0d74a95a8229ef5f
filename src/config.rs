use std::fmt;
use std::time::Duration;

use yieldtrack::{
    validate_endpoint_url, DEFAULT_HTTP_TIMEOUT, DEFAULT_INDICATOR_DELAY, DEFAULT_MODEL,
    DEFAULT_POLL_INTERVAL, DEFAULT_SNAPSHOT_URL,
};

/// Configuration for the dashboard binary
#[derive(Clone)]
pub struct Config {
    /// Snapshot endpoint polled by the live sync loop
    pub snapshot_url: String,
    pub poll_interval: Duration,
    /// Completion API credential; prediction is unavailable without it
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    /// How long the "in progress" indicator stays up after a submit
    pub indicator_delay: Duration,
    pub http_timeout: Duration,
}

impl Config {
    /// Create a new Config instance from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; every setting is optional
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let snapshot_url = lookup("SNAPSHOT_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SNAPSHOT_URL.to_string());
        validate_endpoint_url(&snapshot_url)
            .map_err(|e| ConfigError::InvalidValue("SNAPSHOT_URL".to_string(), e.message))?;

        let poll_interval = millis(&lookup, "POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL)?;
        let indicator_delay = millis(&lookup, "PREDICTION_INDICATOR_MS", DEFAULT_INDICATOR_DELAY)?;

        let http_timeout = match lookup("HTTP_TIMEOUT_SECS") {
            None => DEFAULT_HTTP_TIMEOUT,
            Some(raw) => Duration::from_secs(positive(&raw, "HTTP_TIMEOUT_SECS")?),
        };

        let gemini_api_key = lookup("GEMINI_API_KEY").filter(|v| !v.trim().is_empty());
        let gemini_model = lookup("GEMINI_MODEL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Ok(Config {
            snapshot_url,
            poll_interval,
            gemini_api_key,
            gemini_model,
            indicator_delay,
            http_timeout,
        })
    }
}

// Keeps the API key out of logs
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("snapshot_url", &self.snapshot_url)
            .field("poll_interval", &self.poll_interval)
            .field(
                "gemini_api_key",
                &self.gemini_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("gemini_model", &self.gemini_model)
            .field("indicator_delay", &self.indicator_delay)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

fn millis(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match lookup(var) {
        None => Ok(default),
        Some(raw) => Ok(Duration::from_millis(positive(&raw, var)?)),
    }
}

fn positive(raw: &str, var: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidValue(
            var.to_string(),
            format!("expected a positive integer, got '{}'", raw),
        )),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.snapshot_url, DEFAULT_SNAPSHOT_URL);
        assert_eq!(config.poll_interval, Duration::from_millis(5000));
        assert_eq!(config.indicator_delay, Duration::from_millis(1500));
        assert_eq!(config.gemini_model, "gemini-2.0-flash");
        assert!(config.gemini_api_key.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("SNAPSHOT_URL", "http://127.0.0.1:8080/sensors.json"),
            ("POLL_INTERVAL_MS", "2000"),
            ("GEMINI_API_KEY", "secret-key"),
            ("GEMINI_MODEL", "gemini-1.5-pro"),
            ("HTTP_TIMEOUT_SECS", "3"),
        ]))
        .unwrap();

        assert_eq!(config.snapshot_url, "http://127.0.0.1:8080/sensors.json");
        assert_eq!(config.poll_interval, Duration::from_millis(2000));
        assert_eq!(config.gemini_api_key.as_deref(), Some("secret-key"));
        assert_eq!(config.gemini_model, "gemini-1.5-pro");
        assert_eq!(config.http_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_invalid_values() {
        let err = Config::from_lookup(lookup_from(&[("POLL_INTERVAL_MS", "0")])).unwrap_err();
        let ConfigError::InvalidValue(var, _) = err;
        assert_eq!(var, "POLL_INTERVAL_MS");

        let err = Config::from_lookup(lookup_from(&[("SNAPSHOT_URL", "sensors.json")])).unwrap_err();
        let ConfigError::InvalidValue(var, _) = err;
        assert_eq!(var, "SNAPSHOT_URL");
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = Config::from_lookup(lookup_from(&[("GEMINI_API_KEY", "secret-key")])).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("<redacted>"));
    }
}

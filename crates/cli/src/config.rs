// Configuration loaded once at startup from the environment

use anyhow::{bail, Context, Result};
use std::str::FromStr;
use taskboard_core::domain::queue::{
    QueueConfig, DEFAULT_MAX_CONCURRENT, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY_BASE_MS,
    DEFAULT_SLOW_REQUEST_THRESHOLD_MS,
};
use taskboard_infra_rest::{RestConfig, DEFAULT_HTTP_TIMEOUT_MS};

pub const ENV_API_URL: &str = "TASKBOARD_API_URL";
pub const ENV_API_KEY: &str = "TASKBOARD_API_KEY";
pub const ENV_MAX_CONCURRENT: &str = "TASKBOARD_MAX_CONCURRENT";
pub const ENV_RETRY_BASE_MS: &str = "TASKBOARD_RETRY_BASE_MS";
pub const ENV_MAX_RETRIES: &str = "TASKBOARD_MAX_RETRIES";
pub const ENV_LOG_SLOW_REQUESTS: &str = "TASKBOARD_LOG_SLOW_REQUESTS";
pub const ENV_SLOW_REQUEST_MS: &str = "TASKBOARD_SLOW_REQUEST_MS";
pub const ENV_HTTP_TIMEOUT_MS: &str = "TASKBOARD_HTTP_TIMEOUT_MS";

/// Everything the composition root needs
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub queue: QueueConfig,
    pub rest: RestConfig,
}

impl AppConfig {
    /// Load from process environment; `api_url` (from the CLI) wins over the env
    pub fn from_env(api_url: Option<String>) -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), api_url)
    }

    pub fn from_lookup<F>(lookup: F, api_url: Option<String>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = match api_url.or_else(|| lookup(ENV_API_URL)) {
            Some(url) if !url.trim().is_empty() => url.trim().to_string(),
            _ => bail!("{} is not set (or pass --api-url)", ENV_API_URL),
        };

        let queue = QueueConfig {
            max_concurrent: parse_var(&lookup, ENV_MAX_CONCURRENT, DEFAULT_MAX_CONCURRENT)?,
            retry_delay_base_ms: parse_var(&lookup, ENV_RETRY_BASE_MS, DEFAULT_RETRY_DELAY_BASE_MS)?,
            max_retries: parse_var(&lookup, ENV_MAX_RETRIES, DEFAULT_MAX_RETRIES)?,
            log_slow_requests: parse_bool(&lookup, ENV_LOG_SLOW_REQUESTS, true)?,
            slow_request_threshold_ms: parse_var(
                &lookup,
                ENV_SLOW_REQUEST_MS,
                DEFAULT_SLOW_REQUEST_THRESHOLD_MS,
            )?,
        };
        queue.validate()?;

        let rest = RestConfig {
            base_url,
            api_key: lookup(ENV_API_KEY).filter(|k| !k.is_empty()),
            timeout_ms: parse_var(&lookup, ENV_HTTP_TIMEOUT_MS, DEFAULT_HTTP_TIMEOUT_MS)?,
        };

        Ok(Self { queue, rest })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {}: {:?}", key, raw)),
        None => Ok(default),
    }
}

fn parse_bool<F>(lookup: &F, key: &str, default: bool) -> Result<bool>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).as_deref().map(str::trim) {
        None => Ok(default),
        Some("1") | Some("true") | Some("yes") | Some("on") => Ok(true),
        Some("0") | Some("false") | Some("no") | Some("off") => Ok(false),
        Some(other) => bail!("Invalid {}: {:?} (expected true/false)", key, other),
    }
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
    fn test_defaults_with_only_url() {
        let config =
            AppConfig::from_lookup(lookup_from(&[(ENV_API_URL, "https://db.example.com")]), None)
                .unwrap();

        assert_eq!(config.queue, QueueConfig::default());
        assert_eq!(config.rest.base_url, "https://db.example.com");
        assert_eq!(config.rest.api_key, None);
        assert_eq!(config.rest.timeout_ms, DEFAULT_HTTP_TIMEOUT_MS);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(
            lookup_from(&[
                (ENV_API_URL, "https://db.example.com"),
                (ENV_API_KEY, "anon"),
                (ENV_MAX_CONCURRENT, "4"),
                (ENV_RETRY_BASE_MS, "250"),
                (ENV_MAX_RETRIES, "5"),
                (ENV_LOG_SLOW_REQUESTS, "false"),
                (ENV_SLOW_REQUEST_MS, "2000"),
            ]),
            Some("http://localhost:54321".to_string()),
        )
        .unwrap();

        assert_eq!(config.rest.base_url, "http://localhost:54321");
        assert_eq!(config.rest.api_key.as_deref(), Some("anon"));
        assert_eq!(config.queue.max_concurrent, 4);
        assert_eq!(config.queue.retry_delay_base_ms, 250);
        assert_eq!(config.queue.max_retries, 5);
        assert!(!config.queue.log_slow_requests);
        assert_eq!(config.queue.slow_request_threshold_ms, 2000);
    }

    #[test]
    fn test_missing_url() {
        let err = AppConfig::from_lookup(lookup_from(&[]), None).unwrap_err();
        assert!(err.to_string().contains(ENV_API_URL));
    }

    #[test]
    fn test_invalid_values_are_errors() {
        let url = (ENV_API_URL, "https://db.example.com");
        assert!(AppConfig::from_lookup(lookup_from(&[url, (ENV_MAX_RETRIES, "three")]), None).is_err());
        assert!(AppConfig::from_lookup(lookup_from(&[url, (ENV_LOG_SLOW_REQUESTS, "maybe")]), None).is_err());
        assert!(AppConfig::from_lookup(lookup_from(&[url, (ENV_MAX_CONCURRENT, "0")]), None).is_err());
    }
}

// Queue Domain Model

use serde::{Deserialize, Serialize};

/// Default ceiling on simultaneously running requests
pub const DEFAULT_MAX_CONCURRENT: usize = 8;

/// Default backoff base unit (1000ms = 1s)
pub const DEFAULT_RETRY_DELAY_BASE_MS: u64 = 1000;

/// Default retry ceiling per request
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default duration above which a completed attempt is logged as slow
pub const DEFAULT_SLOW_REQUEST_THRESHOLD_MS: u64 = 1000;

/// Queue configuration, fixed at construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfig {
    pub max_concurrent: usize,
    pub retry_delay_base_ms: u64,
    pub max_retries: u32,
    /// Enables both slow-request warnings and fatal-failure error logs
    pub log_slow_requests: bool,
    pub slow_request_threshold_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            retry_delay_base_ms: DEFAULT_RETRY_DELAY_BASE_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            log_slow_requests: true,
            slow_request_threshold_ms: DEFAULT_SLOW_REQUEST_THRESHOLD_MS,
        }
    }
}

impl QueueConfig {
    /// Reject configurations the queue cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        if self.max_concurrent == 0 {
            return Err(crate::AppError::Config(
                "max_concurrent must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Point-in-time snapshot of queue occupancy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    pub waiting_count: usize,
    pub running_count: usize,
    pub max_concurrent: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = QueueConfig::default();
        assert_eq!(config.max_concurrent, 8);
        assert_eq!(config.retry_delay_base_ms, 1000);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.slow_request_threshold_ms, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let config = QueueConfig {
            max_concurrent: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_concurrent"));
    }

    #[test]
    fn test_stats_serialization() {
        let stats = QueueStats {
            waiting_count: 2,
            running_count: 8,
            max_concurrent: 8,
        };
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["waiting_count"], 2);
        assert_eq!(json["running_count"], 8);
    }
}

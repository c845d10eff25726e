// Queued Request Domain Model

/// Request identifier (for logging and correlation only, not unique)
pub type RequestId = String;

/// Per-request retry bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryState {
    /// Retries performed so far (0 on the first attempt)
    pub retry_count: u32,
    /// Ceiling copied from the queue configuration at submission
    pub max_retries: u32,
}

impl RetryState {
    pub fn new(max_retries: u32) -> Self {
        Self {
            retry_count: 0,
            max_retries,
        }
    }

    /// 1-based number of the attempt currently running
    pub fn attempt(&self) -> u32 {
        self.retry_count + 1
    }

    pub fn is_exhausted(&self) -> bool {
        self.retry_count >= self.max_retries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_state_budget() {
        let mut state = RetryState::new(2);
        assert_eq!(state.attempt(), 1);
        assert!(!state.is_exhausted());

        state.retry_count = 2;
        assert_eq!(state.attempt(), 3);
        assert!(state.is_exhausted());
    }

    #[test]
    fn test_zero_retries_is_exhausted_immediately() {
        assert!(RetryState::new(0).is_exhausted());
    }
}

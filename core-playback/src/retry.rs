//! Retry budget for recovering a stalled session.

use crate::config::PlayerConfig;
use std::time::Duration;

/// Outcome of asking the controller for another attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Try again; `attempt` counts from 1.
    Retry { attempt: usize },
    /// The budget is spent.
    Exhausted,
}

/// Bounds consecutive recovery attempts.
///
/// The counter only goes back to zero through [`RetryController::reset`],
/// which the session calls once playback reaches `Playing` (or on stop).
#[derive(Debug, Clone)]
pub struct RetryController {
    maximum_retry_count: usize,
    retry_timeout: Duration,
    attempts: usize,
    exhausted: bool,
}

impl RetryController {
    pub fn new(maximum_retry_count: usize, retry_timeout: Duration) -> Self {
        Self {
            maximum_retry_count,
            retry_timeout,
            attempts: 0,
            exhausted: false,
        }
    }

    pub fn from_config(config: &PlayerConfig) -> Self {
        Self::new(config.maximum_retry_count, config.retry_timeout)
    }

    pub fn reconfigure(&mut self, config: &PlayerConfig) {
        self.maximum_retry_count = config.maximum_retry_count;
        self.retry_timeout = config.retry_timeout;
    }

    pub fn maximum_retry_count(&self) -> usize {
        self.maximum_retry_count
    }

    pub fn retry_timeout(&self) -> Duration {
        self.retry_timeout
    }

    pub fn attempts(&self) -> usize {
        self.attempts
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn register_attempt(&mut self) -> RetryDecision {
        if self.exhausted || self.attempts >= self.maximum_retry_count {
            self.exhausted = true;
            return RetryDecision::Exhausted;
        }
        self.attempts += 1;
        RetryDecision::Retry {
            attempt: self.attempts,
        }
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
        self.exhausted = false;
    }
}

//! Retry policy for generative-AI calls
//!
//! Failed attempts are classified into [`AttemptFailure`]s; retryable ones wait
//! `base * 2^attempt_index + jitter` before the next attempt, where the base is
//! 3000 ms after a 503 and 2000 ms otherwise, and jitter is uniform in
//! `[0, 1000)` ms.

use rand::Rng;
use std::time::Duration;
use thiserror::Error;

use super::envelope::MalformedResponse;
use super::transport::TransportError;

/// Total attempts per logical call (1 initial + 5 retries)
pub const MAX_ATTEMPTS: u32 = 6;

/// Backoff base for most retryable failures, in milliseconds
const DEFAULT_BASE_DELAY_MS: u64 = 2000;

/// Backoff base after a 503 Service Unavailable, in milliseconds
const UNAVAILABLE_BASE_DELAY_MS: u64 = 3000;

/// Exclusive upper bound for jitter, in milliseconds
const MAX_JITTER_MS: u64 = 1000;

/// Why a single attempt did not produce a payload
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptFailure {
    /// The server answered with a non-success status
    #[error("server returned status {status}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, kept for diagnostics
        body: String,
    },

    /// No HTTP response was obtained
    #[error(transparent)]
    Network(#[from] TransportError),

    /// A 2xx response without the expected structure
    #[error("malformed response: {0}")]
    Malformed(#[from] MalformedResponse),
}

impl AttemptFailure {
    /// Whether another attempt may succeed
    ///
    /// 5xx and 429 statuses, network failures and malformed success responses
    /// are retryable. Every other status is terminal.
    pub fn is_retryable(&self) -> bool {
        match self {
            AttemptFailure::Status { status, .. } => is_retryable_status(*status),
            AttemptFailure::Network(_) | AttemptFailure::Malformed(_) => true,
        }
    }
}

/// Whether an HTTP status is worth retrying
pub fn is_retryable_status(status: u16) -> bool {
    status == 429 || (500..=599).contains(&status)
}

/// Attempt cap and backoff timing for one logical call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Base delay for most retryable failures
    pub base_delay: Duration,
    /// Base delay after a 503
    pub unavailable_base_delay: Duration,
    /// Exclusive upper bound for random jitter
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
            unavailable_base_delay: Duration::from_millis(UNAVAILABLE_BASE_DELAY_MS),
            max_jitter: Duration::from_millis(MAX_JITTER_MS),
        }
    }
}

impl RetryPolicy {
    /// A policy that retries the same number of times without waiting
    pub fn immediate() -> Self {
        Self {
            base_delay: Duration::ZERO,
            unavailable_base_delay: Duration::ZERO,
            max_jitter: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Computes the wait before the next attempt
    ///
    /// # Arguments
    /// * `attempt_index` - 0 for the wait before the first retry
    /// * `failure` - What went wrong on the attempt just made
    /// * `jitter` - Random component to add on top of the exponential part
    pub fn delay_for(
        &self,
        attempt_index: u32,
        failure: &AttemptFailure,
        jitter: Duration,
    ) -> Duration {
        let base = match failure {
            AttemptFailure::Status { status: 503, .. } => self.unavailable_base_delay,
            _ => self.base_delay,
        };
        let factor = 2u32.saturating_pow(attempt_index);
        base.saturating_mul(factor).saturating_add(jitter)
    }

    /// Draws a uniform jitter in `[0, max_jitter)`
    pub fn jitter(&self) -> Duration {
        let max_ms = self.max_jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..max_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> AttemptFailure {
        AttemptFailure::Status {
            status: code,
            body: String::new(),
        }
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable_status(429));
        assert!(is_retryable_status(500));
        assert!(is_retryable_status(503));
        assert!(is_retryable_status(599));

        assert!(!is_retryable_status(400));
        assert!(!is_retryable_status(401));
        assert!(!is_retryable_status(404));
        assert!(!is_retryable_status(499));
        assert!(!is_retryable_status(302));
    }

    #[test]
    fn test_network_and_malformed_are_retryable() {
        let network = AttemptFailure::from(TransportError::Network("reset".to_string()));
        let malformed = AttemptFailure::from(MalformedResponse::NoCandidates);

        assert!(network.is_retryable());
        assert!(malformed.is_retryable());
        assert!(!status(400).is_retryable());
    }

    #[test]
    fn test_default_policy_values() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 6);
        assert_eq!(policy.base_delay, Duration::from_millis(2000));
        assert_eq!(policy.unavailable_base_delay, Duration::from_millis(3000));
        assert_eq!(policy.max_jitter, Duration::from_millis(1000));
    }

    #[test]
    fn test_delay_doubles_per_attempt() {
        let policy = RetryPolicy::default();
        let failure = status(500);

        let delays: Vec<u128> = (0..5)
            .map(|i| policy.delay_for(i, &failure, Duration::ZERO).as_millis())
            .collect();

        assert_eq!(delays, vec![2000, 4000, 8000, 16000, 32000]);
    }

    #[test]
    fn test_delay_uses_longer_base_for_503() {
        let policy = RetryPolicy::default();

        assert_eq!(
            policy.delay_for(0, &status(503), Duration::ZERO),
            Duration::from_millis(3000)
        );
        assert_eq!(
            policy.delay_for(2, &status(503), Duration::ZERO),
            Duration::from_millis(12000)
        );
        // 502 and 429 use the default base
        assert_eq!(
            policy.delay_for(2, &status(502), Duration::ZERO),
            Duration::from_millis(8000)
        );
        assert_eq!(
            policy.delay_for(0, &status(429), Duration::ZERO),
            Duration::from_millis(2000)
        );
    }

    #[test]
    fn test_network_failure_uses_default_base() {
        let policy = RetryPolicy::default();
        let failure = AttemptFailure::from(TransportError::Network("timeout".to_string()));

        assert_eq!(
            policy.delay_for(1, &failure, Duration::from_millis(250)),
            Duration::from_millis(4250)
        );
    }

    #[test]
    fn test_jitter_is_within_bounds() {
        let policy = RetryPolicy::default();
        for _ in 0..200 {
            let jitter = policy.jitter();
            assert!(jitter < Duration::from_millis(1000));
        }
    }

    #[test]
    fn test_immediate_policy_never_waits() {
        let policy = RetryPolicy::immediate();
        assert_eq!(policy.max_attempts, 6);
        assert_eq!(policy.jitter(), Duration::ZERO);
        assert_eq!(policy.delay_for(4, &status(503), policy.jitter()), Duration::ZERO);
    }
}

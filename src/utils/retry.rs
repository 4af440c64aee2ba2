//! Retry utilities with exponential backoff for resilient catalog calls.

use std::time::Duration;
use tokio::time::{sleep, timeout};

use crate::sources::SourceError;

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of attempts (the first call included)
    pub max_attempts: u32,
    /// Initial delay between retries
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Maximum total time to spend on retries (including delays)
    pub max_total_time: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
            max_total_time: Duration::from_secs(20),
        }
    }
}

impl RetryConfig {
    /// Set the maximum number of attempts
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// A policy that never retries
    pub fn no_retry() -> Self {
        Self::default().max_attempts(1)
    }

    /// Backoff delay before the retry that follows attempt number `attempt`
    fn backoff_delay(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return self.initial_delay.min(self.max_delay);
        }
        let exp_delay = self.initial_delay.as_secs_f64()
            * self.backoff_multiplier.powf(attempt as f64 - 1.0);
        Duration::from_secs_f64(exp_delay.min(self.max_delay.as_secs_f64()))
    }
}

/// Transient errors that should trigger a retry
#[derive(Debug, Clone, PartialEq)]
pub enum TransientError {
    /// Network connectivity issues
    Network,
    /// Rate limit exceeded (with optional retry-after seconds)
    RateLimit(Option<u64>),
    /// Server error (5xx)
    ServerError,
    /// Service unavailable (503)
    ServiceUnavailable,
    /// Gateway timeout (504)
    GatewayTimeout,
    /// Request timeout
    Timeout,
}

impl TransientError {
    /// Check if a SourceError represents a transient error
    pub fn from_source_error(err: &SourceError) -> Option<Self> {
        match err {
            SourceError::RateLimit(retry_after) => Some(TransientError::RateLimit(*retry_after)),
            SourceError::Network(_) => Some(TransientError::Network),
            SourceError::Timeout => Some(TransientError::Timeout),
            SourceError::Server(503) => Some(TransientError::ServiceUnavailable),
            SourceError::Server(504) => Some(TransientError::GatewayTimeout),
            SourceError::Server(_) => Some(TransientError::ServerError),
            _ => None,
        }
    }

    /// Get the recommended delay for this error
    pub fn recommended_delay(&self) -> Duration {
        match self {
            TransientError::RateLimit(Some(seconds)) => {
                Duration::from_secs(seconds.saturating_add(1))
            }
            TransientError::RateLimit(None) => Duration::from_secs(5),
            TransientError::ServiceUnavailable => Duration::from_secs(2),
            TransientError::GatewayTimeout => Duration::from_secs(1),
            TransientError::Timeout => Duration::from_millis(500),
            TransientError::Network => Duration::from_millis(500),
            TransientError::ServerError => Duration::from_millis(500),
        }
    }
}

/// Execute an async operation with retry logic
///
/// Transient errors are retried with exponential backoff, raised to the
/// error's recommended delay but never above `max_delay`. Permanent errors
/// are returned immediately.
///
/// # Returns
///
/// The result of the operation, or the last error once attempts or the
/// time budget are exhausted
pub async fn with_retry<T, F, Fut>(config: RetryConfig, operation: F) -> Result<T, SourceError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, SourceError>>,
{
    let mut attempts = 0;
    let mut total_elapsed = Duration::ZERO;
    let mut operation = operation;

    loop {
        attempts += 1;

        let error = match timeout(config.max_total_time, operation()).await {
            Ok(Ok(result)) => {
                if attempts > 1 {
                    tracing::info!(
                        "Operation succeeded on attempt {} after {} transient failures",
                        attempts,
                        attempts - 1
                    );
                }
                return Ok(result);
            }
            Ok(Err(error)) => error,
            Err(_) => SourceError::Timeout,
        };

        let Some(transient) = TransientError::from_source_error(&error) else {
            // Permanent error - return immediately
            return Err(error);
        };

        let delay = config
            .backoff_delay(attempts)
            .max(transient.recommended_delay())
            .min(config.max_delay);
        total_elapsed += delay;

        if attempts >= config.max_attempts || total_elapsed >= config.max_total_time {
            tracing::warn!(
                "Operation failed after {} attempts (total delay: {:?}): {}",
                attempts,
                total_elapsed,
                error
            );
            return Err(error);
        }

        tracing::debug!(
            "Transient error on attempt {}: {:?}, retrying in {:?}",
            attempts,
            transient,
            delay
        );
        sleep(delay).await;
    }
}

//! Per-catalog request pacing.

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Paces outbound requests to one catalog.
///
/// Clones share the same limiter state. A rate of zero disables pacing.
#[derive(Clone)]
pub struct RequestPacer {
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
    per_second: u32,
}

impl RequestPacer {
    /// Allow at most `per_second` requests per second
    pub fn per_second(per_second: u32) -> Self {
        let limiter = NonZeroU32::new(per_second)
            .map(|rate| Arc::new(RateLimiter::direct(Quota::per_second(rate))));
        Self {
            limiter,
            per_second,
        }
    }

    /// No pacing at all
    pub fn unlimited() -> Self {
        Self::per_second(0)
    }

    /// Wait until the next request may be sent
    pub async fn wait(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }

    pub fn is_limited(&self) -> bool {
        self.limiter.is_some()
    }
}

impl std::fmt::Debug for RequestPacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestPacer")
            .field("per_second", &self.per_second)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unlimited_never_waits() {
        let pacer = RequestPacer::unlimited();
        assert!(!pacer.is_limited());
        for _ in 0..100 {
            pacer.wait().await;
        }
    }

    #[tokio::test]
    async fn test_burst_within_quota_is_immediate() {
        let pacer = RequestPacer::per_second(10);
        assert!(pacer.is_limited());

        let start = std::time::Instant::now();
        for _ in 0..5 {
            pacer.wait().await;
        }
        assert!(start.elapsed() < std::time::Duration::from_millis(500));
    }
}

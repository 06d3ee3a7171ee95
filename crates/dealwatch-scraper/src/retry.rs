//! Bounded exponential backoff around a [`ListingSearch`].
//!
//! Every error is treated as transient: the marketplace returns 5xx, 403 and
//! truncated bodies intermittently, and a retry a few seconds later usually
//! succeeds.
//!
//! # Backoff schedule (defaults)
//!
//! | Attempt | Sleep before attempt |
//! |---------|----------------------|
//! | 0 | none |
//! | 1 | 1 s + jitter |
//! | 2 | 2 s + jitter |
//! | 3 | 4 s + jitter |
//!
//! Jitter is uniform in `[0, max_jitter)`.

use std::time::Duration;

use dealwatch_core::Listing;
use rand::Rng;

use crate::client::{ListingSearch, SearchQuery};
use crate::error::ScraperError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure.
    pub max_retries: u32,
    pub backoff_base: Duration,
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base: Duration::from_secs(1),
            max_jitter: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// No sleeping between attempts. Used by tests.
    #[must_use]
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff_base: Duration::ZERO,
            max_jitter: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (1-based): `base * 2^(attempt-1)`
    /// plus jitter.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(30);
        let backoff = self.backoff_base.saturating_mul(1u32 << exp);
        backoff.saturating_add(self.jitter())
    }

    fn jitter(&self) -> Duration {
        let max_ms = u64::try_from(self.max_jitter.as_millis()).unwrap_or(u64::MAX);
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..max_ms))
    }
}

/// Runs `source.search(query)` up to `policy.max_retries + 1` times.
///
/// # Errors
///
/// Returns [`ScraperError::RetriesExhausted`] wrapping the last failure once
/// every attempt has failed.
pub async fn search_with_retry<S>(
    source: &S,
    query: &SearchQuery,
    policy: &RetryPolicy,
) -> Result<Vec<Listing>, ScraperError>
where
    S: ListingSearch + ?Sized,
{
    let mut attempt = 0u32;
    loop {
        if attempt > 0 {
            let delay = policy.delay_for(attempt);
            tracing::debug!(
                keyword = %query.keyword,
                attempt,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "retrying search after backoff"
            );
            tokio::time::sleep(delay).await;
        }

        match source.search(query).await {
            Ok(listings) => return Ok(listings),
            Err(err) => {
                tracing::warn!(
                    keyword = %query.keyword,
                    attempt = attempt + 1,
                    max_attempts = policy.max_retries + 1,
                    error = %err,
                    "search attempt failed"
                );
                if attempt >= policy.max_retries {
                    return Err(ScraperError::RetriesExhausted {
                        keyword: query.keyword.clone(),
                        attempts: attempt + 1,
                        source: Box::new(err),
                    });
                }
            }
        }
        attempt += 1;
    }
}

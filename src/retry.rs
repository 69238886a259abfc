// SPDX-License-Identifier: MIT

//! Bounded fixed-interval polling.
//!
//! Extracted from the session engine so the attempt ceiling and cadence are
//! testable on their own. Used to resolve the profile creation race: a
//! freshly signed-in identity may exist before its profile document's first
//! write is visible.

use std::future::Future;
use std::time::Duration;

use crate::error::Result;

/// A bounded retry policy: at most `max_attempts` probes, one `interval`
/// pause before each.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    /// Re-run `probe` until it yields a value or the ceiling is exhausted.
    ///
    /// Each attempt waits `interval` first, matching the original cadence of
    /// checking once per tick rather than immediately. Probes run strictly
    /// sequentially; there is never more than one outstanding. A probe error
    /// is terminal and propagates without further attempts.
    pub async fn poll_until<T, F, Fut>(&self, mut probe: F) -> Result<Option<T>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<Option<T>>>,
    {
        for attempt in 1..=self.max_attempts {
            tokio::time::sleep(self.interval).await;
            if let Some(value) = probe(attempt).await? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }
}

// src/utils/rate.rs

//! Per-source request pacing.

use std::time::Duration;

use rand::Rng;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};

/// Enforces a minimum interval between outbound requests to one source.
///
/// Shared across all fetch sites of a source; concurrent tasks are handed
/// serialized time slots, so keyword tasks can run in parallel without
/// exceeding the source's tolerated request rate.
pub struct RateLimiter {
    interval: Duration,
    jitter_ms: u64,
    next_slot: Mutex<Instant>,
}

impl RateLimiter {
    pub fn new(interval: Duration, jitter_ms: u64) -> Self {
        Self {
            interval,
            jitter_ms,
            next_slot: Mutex::new(Instant::now()),
        }
    }

    /// Wait until this source's next request slot comes up.
    pub async fn acquire(&self) {
        if self.interval.is_zero() && self.jitter_ms == 0 {
            return;
        }

        let wait = {
            let mut next_slot = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = (*next_slot).max(now);

            let jitter = if self.jitter_ms > 0 {
                Duration::from_millis(rand::rng().random_range(0..=self.jitter_ms))
            } else {
                Duration::ZERO
            };
            *next_slot = slot + self.interval + jitter;

            slot.duration_since(now)
        };

        if !wait.is_zero() {
            sleep(wait).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn zero_interval_returns_immediately() {
        let limiter = RateLimiter::new(Duration::ZERO, 0);
        let started = std::time::Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        assert!(started.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn sequential_acquires_are_spaced() {
        let limiter = RateLimiter::new(Duration::from_millis(20), 0);
        let started = std::time::Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;
        // First slot is immediate; the next two each wait the interval.
        assert!(started.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn concurrent_acquires_share_the_schedule() {
        use std::sync::Arc;

        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(15), 0));
        let started = std::time::Instant::now();

        let tasks: Vec<_> = (0..3)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move { limiter.acquire().await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert!(started.elapsed() >= Duration::from_millis(30));
    }
}

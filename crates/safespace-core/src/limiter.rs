//! Remote dispatch pacing

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Enforces a minimum interval between consecutive remote dispatches.
///
/// Shared by every worker in a batch, so the remote service sees at most one
/// call per interval no matter how many messages are in flight.
#[derive(Debug)]
pub struct DispatchLimiter {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl DispatchLimiter {
    /// Create a limiter with the given minimum spacing
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(None),
        }
    }

    /// A limiter that never waits
    pub fn unlimited() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until the next dispatch slot is free and claim it
    pub async fn acquire(&self) {
        if self.interval.is_zero() {
            return;
        }

        let mut next_slot = self.next_slot.lock().await;
        let now = Instant::now();

        let slot = match *next_slot {
            Some(slot) if slot > now => slot,
            _ => now,
        };

        *next_slot = Some(slot + self.interval);
        drop(next_slot);

        tokio::time::sleep_until(slot).await;
    }
}

impl Default for DispatchLimiter {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_spacing_between_dispatches() {
        let limiter = DispatchLimiter::new(Duration::from_millis(500));
        let start = Instant::now();

        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;

        assert!(start.elapsed() >= Duration::from_millis(1000));
        assert!(start.elapsed() < Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_are_serialized() {
        let limiter = Arc::new(DispatchLimiter::new(Duration::from_millis(200)));
        let start = Instant::now();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move {
                    limiter.acquire().await;
                    Instant::now()
                })
            })
            .collect();

        let mut times = Vec::new();
        for handle in handles {
            times.push(handle.await.unwrap());
        }
        times.sort();

        assert!(times[3].duration_since(start) >= Duration::from_millis(600));
        for pair in times.windows(2) {
            assert!(pair[1].duration_since(pair[0]) >= Duration::from_millis(200));
        }
    }

    #[tokio::test]
    async fn test_unlimited_never_waits() {
        let limiter = DispatchLimiter::unlimited();
        let start = std::time::Instant::now();

        for _ in 0..100 {
            limiter.acquire().await;
        }

        assert!(start.elapsed() < Duration::from_millis(100));
    }
}

//! Request pacing against the Discogs rate limit.
//!
//! Discogs allows 60 authenticated requests per minute; we budget 50.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

pub const DISCOGS_CALLS_PER_MINUTE: u32 = 50;

/// Source of time for everything that waits.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    async fn sleep(&self, duration: Duration);
}

/// Wall clock backed by tokio timers.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Spaces request starts so that at most `calls` begin within any `per` window.
pub struct Pacer {
    interval: Duration,
    clock: Arc<dyn Clock>,
    last: Mutex<Option<Instant>>,
}

impl Pacer {
    pub fn new(calls: u32, per: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            interval: per / calls.max(1),
            clock,
            last: Mutex::new(None),
        }
    }

    pub fn discogs(clock: Arc<dyn Clock>) -> Self {
        Self::new(DISCOGS_CALLS_PER_MINUTE, Duration::from_secs(60), clock)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Waits until the next request may start. The first call never waits.
    pub async fn pace(&self) {
        let mut last = self.last.lock().await;
        if let Some(previous) = *last {
            let elapsed = self.clock.now().saturating_duration_since(previous);
            if let Some(remaining) = self.interval.checked_sub(elapsed) {
                if !remaining.is_zero() {
                    tracing::debug!(wait_ms = remaining.as_millis() as u64, "Pacing request");
                    self.clock.sleep(remaining).await;
                }
            }
        }
        *last = Some(self.clock.now());
    }
}

// src/fetch/throttle.rs
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Minimum-interval gate between successive calls of one operation class.
///
/// Callers await [`Throttle::wait`] immediately before the outbound request;
/// the gate sleeps until the configured spacing from the previous call has
/// elapsed. This protects shared-rate-limited third-party APIs, not internal
/// concurrency — each operation class owns its own gate, and the owner
/// passes it around explicitly instead of going through global state.
#[derive(Debug)]
pub struct Throttle {
    min_interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: Mutex::new(None),
        }
    }

    pub async fn wait(&self) {
        let mut last = self.last.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

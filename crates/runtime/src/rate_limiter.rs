use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use tokio::time::Instant;

/// Fixed window rate limiter keyed by client.
///
/// Each key gets `capacity` permits per `period`; the window of a key starts with its first
/// request.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    windows: Arc<DashMap<String, Window>>,
    capacity: u64,
    period: Duration,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u64,
    reset_at: Instant,
}

impl RateLimiter {
    /// Create a new [`RateLimiter`] with the given `capacity` and `period`.
    pub fn new(capacity: u64, period: Duration) -> Self {
        Self { windows: Arc::new(DashMap::new()), capacity, period }
    }

    /// Length of one window.
    pub const fn period(&self) -> Duration {
        self.period
    }

    /// Attempt to acquire a permit for `key`.
    pub fn try_acquire(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut window = self
            .windows
            .entry(key.to_owned())
            .or_insert(Window { count: 0, reset_at: now + self.period });

        if now >= window.reset_at {
            *window = Window { count: 1, reset_at: now + self.period };
            true
        } else if window.count < self.capacity {
            window.count += 1;
            true
        } else {
            false
        }
    }

    /// Drop windows that have expired.
    pub fn prune(&self) {
        let now = Instant::now();
        self.windows.retain(|_, window| window.reset_at > now);
    }

    /// Number of tracked clients.
    pub fn tracked(&self) -> usize {
        self.windows.len()
    }
}

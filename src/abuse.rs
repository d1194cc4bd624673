//! Per-connection flood protection for inbound WebSocket events
//!
//! A client that sends more than `max_events` frames within one window has
//! the excess frames dropped. Keys are connection ids, so players sharing a
//! venue network never throttle each other.

use crate::config::RateLimitConfig;
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::RwLock;

/// Fixed-window rate limiter
#[derive(Debug, Clone)]
pub struct RateLimiter {
    /// Map of connection id to (event count, window start)
    events: Arc<RwLock<HashMap<String, (u32, Instant)>>>,
    max_events: u32,
    window: Duration,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::from(&RateLimitConfig::default())
    }
}

impl From<&RateLimitConfig> for RateLimiter {
    fn from(config: &RateLimitConfig) -> Self {
        Self::new(config.max_events, config.window)
    }
}

impl RateLimiter {
    pub fn new(max_events: u32, window: Duration) -> Self {
        Self {
            events: Arc::new(RwLock::new(HashMap::new())),
            max_events,
            window,
        }
    }

    /// Count one event for `key`.
    /// Returns true if allowed, false if over the limit
    pub async fn check(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut events = self.events.write().await;

        match events.get_mut(key) {
            Some((count, window_start)) => {
                if now.duration_since(*window_start) >= self.window {
                    *count = 1;
                    *window_start = now;
                    true
                } else if *count >= self.max_events {
                    false
                } else {
                    *count += 1;
                    true
                }
            }
            None => {
                events.insert(key.to_string(), (1, now));
                true
            }
        }
    }

    /// Forget a key once its connection is gone
    pub async fn remove(&self, key: &str) {
        self.events.write().await.remove(key);
    }

    pub async fn tracked(&self) -> usize {
        self.events.read().await.len()
    }
}

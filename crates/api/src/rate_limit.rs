use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use wayfinder_core::RateLimitConfig;

/// Sliding-window limiter keyed by client address. Every chat turn fans out
/// to up to three public services, so the budget is per turn, not per byte.
#[derive(Debug, Clone)]
pub struct ClientRateLimiter {
    windows: Arc<Mutex<HashMap<String, VecDeque<Instant>>>>,
    window: Duration,
    max_requests: usize,
}

impl ClientRateLimiter {
    pub fn new(window: Duration, max_requests: usize) -> Self {
        Self {
            windows: Arc::new(Mutex::new(HashMap::new())),
            window,
            max_requests,
        }
    }

    /// `None` when limiting is switched off.
    pub fn from_config(config: &RateLimitConfig) -> Option<Self> {
        config
            .enabled()
            .then(|| Self::new(config.window(), config.max_requests))
    }

    /// Admits the request or returns how long until the oldest hit expires.
    pub fn check(&self, client: &str) -> Result<(), Duration> {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: &str, now: Instant) -> Result<(), Duration> {
        let mut windows = self.windows.lock();
        windows.retain(|key, hits| {
            expire(hits, now, self.window);
            key == client || !hits.is_empty()
        });

        let hits = windows.entry(client.to_string()).or_default();
        if hits.len() >= self.max_requests {
            let retry_after = hits
                .front()
                .map(|oldest| self.window.saturating_sub(now.duration_since(*oldest)))
                .unwrap_or(self.window);
            return Err(retry_after);
        }

        hits.push_back(now);
        Ok(())
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.lock().len()
    }
}

fn expire(hits: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(front) = hits.front() {
        if now.duration_since(*front) >= window {
            hits.pop_front();
        } else {
            break;
        }
    }
}

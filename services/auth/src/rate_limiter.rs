//! Login throttling against password and code guessing
//!
//! Attempts are counted per key (`login:<email>`, `code:<nickname>`). A key
//! that exceeds the budget inside the window is locked out for a while; a
//! successful login clears its counter.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::warn;

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Failed attempts tolerated inside the window
    pub max_attempts: u32,
    pub window: Duration,
    pub lockout: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window: Duration::from_secs(300),
            lockout: Duration::from_secs(900),
        }
    }
}

#[derive(Debug)]
struct Attempts {
    count: u32,
    window_start: Instant,
    locked_until: Option<Instant>,
}

#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    entries: Arc<Mutex<HashMap<String, Attempts>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Count an attempt for `key`; false when the key is locked out
    pub async fn check(&self, key: &str) -> bool {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        let entry = entries.entry(key.to_string()).or_insert(Attempts {
            count: 0,
            window_start: now,
            locked_until: None,
        });

        match entry.locked_until {
            Some(until) if now < until => return false,
            Some(_) => {
                entry.count = 0;
                entry.locked_until = None;
                entry.window_start = now;
            }
            None => {}
        }

        if now.duration_since(entry.window_start) >= self.config.window {
            entry.count = 0;
            entry.window_start = now;
        }

        if entry.count >= self.config.max_attempts {
            entry.locked_until = Some(now + self.config.lockout);
            warn!(
                key,
                lockout_secs = self.config.lockout.as_secs(),
                "Too many login attempts"
            );
            return false;
        }

        entry.count += 1;
        true
    }

    /// Forget the attempts of a key after a successful login
    pub async fn reset(&self, key: &str) {
        self.entries.lock().await.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_attempts: u32) -> RateLimiter {
        RateLimiter::new(RateLimiterConfig {
            max_attempts,
            window: Duration::from_secs(60),
            lockout: Duration::from_secs(60),
        })
    }

    #[tokio::test]
    async fn locks_out_after_the_budget() {
        let limiter = limiter(3);
        for _ in 0..3 {
            assert!(limiter.check("login:a@b.co").await);
        }
        assert!(!limiter.check("login:a@b.co").await);
        assert!(!limiter.check("login:a@b.co").await);
        assert!(limiter.check("login:other@b.co").await);
    }

    #[tokio::test]
    async fn reset_clears_the_counter() {
        let limiter = limiter(1);
        assert!(limiter.check("code:alice").await);
        limiter.reset("code:alice").await;
        assert!(limiter.check("code:alice").await);
    }

    #[tokio::test]
    async fn lockout_expires() {
        let limiter = RateLimiter::new(RateLimiterConfig {
            max_attempts: 1,
            window: Duration::from_secs(60),
            lockout: Duration::from_millis(20),
        });
        assert!(limiter.check("code:bob").await);
        assert!(!limiter.check("code:bob").await);
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(limiter.check("code:bob").await);
    }
}

//! Token-bucket gate in front of chat-triggered pipeline cycles.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde::Deserialize;
use tokio::time::Instant;

/// Default refill interval: one token per second.
pub const DEFAULT_REFILL_INTERVAL: Duration = Duration::from_secs(1);

/// Idle per-chat buckets are pruned once the table grows past this size.
const MAX_TRACKED_CHATS: usize = 1024;

/// Which triggers share a bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitScope {
    /// One bucket for the whole process: a busy chat can starve the others.
    #[default]
    Global,
    /// One bucket per chat id.
    PerChat,
}

#[derive(Debug, Clone, Copy)]
struct Bucket {
    tokens: f64,
    last_update: Instant,
}

/// Token bucket with a fixed refill interval and burst size.
///
/// `allow*` consumes a token when one is available and reports whether it
/// did. Denials are not queued.
#[derive(Debug)]
pub struct RateLimiter {
    scope: RateLimitScope,
    burst: f64,
    refill_per_sec: f64,
    buckets: Mutex<HashMap<Option<i64>, Bucket>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_REFILL_INTERVAL, 1, RateLimitScope::Global)
    }
}

impl RateLimiter {
    pub fn new(refill_interval: Duration, burst: u32, scope: RateLimitScope) -> Self {
        let interval_secs = refill_interval.as_secs_f64().max(1e-9);
        Self {
            scope,
            burst: f64::from(burst.max(1)),
            refill_per_sec: 1.0 / interval_secs,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Consumes a token from the process-wide bucket.
    pub fn allow(&self) -> bool {
        self.allow_at(None, Instant::now())
    }

    /// Consumes a token on behalf of `chat_id`.
    ///
    /// With [`RateLimitScope::Global`] every chat draws from the same bucket.
    pub fn allow_chat(&self, chat_id: i64) -> bool {
        let key = match self.scope {
            RateLimitScope::Global => None,
            RateLimitScope::PerChat => Some(chat_id),
        };
        self.allow_at(key, Instant::now())
    }

    fn allow_at(&self, key: Option<i64>, now: Instant) -> bool {
        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);

        if buckets.len() > MAX_TRACKED_CHATS {
            let (burst, rate) = (self.burst, self.refill_per_sec);
            buckets.retain(|_, b| refill(b.tokens, b.last_update, now, rate, burst) < burst);
        }

        let bucket = buckets.entry(key).or_insert(Bucket {
            tokens: self.burst,
            last_update: now,
        });

        bucket.tokens = refill(
            bucket.tokens,
            bucket.last_update,
            now,
            self.refill_per_sec,
            self.burst,
        );
        bucket.last_update = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

fn refill(tokens: f64, last_update: Instant, now: Instant, rate: f64, burst: f64) -> f64 {
    let elapsed = now.saturating_duration_since(last_update).as_secs_f64();
    (tokens + elapsed * rate).min(burst)
}

//! Expiring record of which article ids have already been dispatched.
//!
//! Every operation, including the read-side [`SentCache::was_sent`], runs
//! under one mutex: a check that finds an expired entry deletes it, so reads
//! are writes too. Critical sections never span an `.await`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Default retention window (24 hours)
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

/// Default interval between background sweeps (1 hour)
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Dedup table keyed by article id.
///
/// Presence of a key is the "sent" marker; the value is when it was marked.
/// Construct one per process (or per test) and share it via `Arc`.
#[derive(Debug)]
pub struct SentCache {
    entries: Mutex<HashMap<String, Instant>>,
    retention: Duration,
}

impl Default for SentCache {
    fn default() -> Self {
        Self::new(DEFAULT_RETENTION)
    }
}

impl SentCache {
    pub fn new(retention: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            retention,
        }
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Returns true iff an unexpired entry exists for `id`.
    ///
    /// An expired entry is removed and reported as not sent.
    pub fn was_sent(&self, id: &str) -> bool {
        self.was_sent_at(id, Instant::now())
    }

    pub fn was_sent_at(&self, id: &str, now: Instant) -> bool {
        let mut entries = self.lock();
        self.live_entry(&mut entries, id, now)
    }

    /// Inserts or refreshes the entry for `id` with the current time.
    pub fn mark_sent(&self, id: &str) {
        self.mark_sent_at(id, Instant::now());
    }

    pub fn mark_sent_at(&self, id: &str, now: Instant) {
        self.lock().insert(id.to_owned(), now);
    }

    /// Atomically checks `id` and marks it when it is new.
    ///
    /// Returns `true` when the caller is the one that classified `id` as new.
    /// Two concurrent callers racing on the same unseen id get exactly one
    /// `true` between them.
    pub fn check_and_mark(&self, id: &str) -> bool {
        self.check_and_mark_at(id, Instant::now())
    }

    pub fn check_and_mark_at(&self, id: &str, now: Instant) -> bool {
        let mut entries = self.lock();
        if self.live_entry(&mut entries, id, now) {
            return false;
        }
        entries.insert(id.to_owned(), now);
        true
    }

    /// Deletes every entry older than the retention window.
    ///
    /// Returns the number of entries evicted.
    pub fn sweep(&self, now: Instant) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        let retention = self.retention;
        entries.retain(|_, marked_at| now.saturating_duration_since(*marked_at) <= retention);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn live_entry(&self, entries: &mut HashMap<String, Instant>, id: &str, now: Instant) -> bool {
        match entries.get(id) {
            Some(marked_at) if now.saturating_duration_since(*marked_at) > self.retention => {
                entries.remove(id);
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    // The map is never left half-updated by a panic, so a poisoned lock is
    // still safe to use.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Instant>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Spawns the periodic sweep task.
///
/// The first sweep happens one full `interval` after spawning. The task runs
/// until the returned handle is aborted or the runtime shuts down.
pub fn spawn_sweeper(cache: Arc<SentCache>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let evicted = cache.sweep(Instant::now());
            if evicted > 0 {
                tracing::info!(
                    evicted = evicted,
                    remaining = cache.len(),
                    "Cleaned up expired articles"
                );
            } else {
                tracing::debug!(remaining = cache.len(), "Sweep found no expired articles");
            }
        }
    })
}

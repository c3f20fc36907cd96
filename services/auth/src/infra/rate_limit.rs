//! Per-key fixed-window rate limiting with a block period.
//!
//! Each key counts attempts inside a window whose thresholds come from its
//! [`RateScope`]. Once the quota is spent the key stays blocked until either
//! the window ends or the block duration has passed since the last counted
//! attempt, whichever comes first.

use std::collections::HashMap;
use std::mem::size_of;
use std::sync::{Arc, Mutex, MutexGuard};

use komikai_core::clock::SharedClock;

use crate::domain::repository::{RateLimiter, Sweep};
use crate::domain::types::{RateLimitEntry, RateLimitInfo, RateLimiterStatus, RateScope};

/// In-process rate limiter. Clones share the same map.
#[derive(Clone)]
pub struct MemoryRateLimiter {
    entries: Arc<Mutex<HashMap<String, RateLimitEntry>>>,
    clock: SharedClock,
}

impl MemoryRateLimiter {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            clock,
        }
    }

    /// Number of keys being tracked, stale ones included.
    pub fn tracked_keys(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, RateLimitEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl RateLimiter for MemoryRateLimiter {
    fn check(&self, key: &str) -> bool {
        let now = self.clock.now();
        let policy = RateScope::from_key(key).policy();
        let mut entries = self.lock();

        let Some(entry) = entries.get_mut(key) else {
            entries.insert(key.to_owned(), RateLimitEntry::fresh(now, &policy));
            return true;
        };

        // Window expiry first: a key past its window is never reported blocked.
        if entry.window_elapsed(now) {
            *entry = RateLimitEntry::fresh(now, &policy);
            return true;
        }

        if entry.count >= policy.max_attempts {
            if entry.is_blocked(now, &policy) {
                tracing::warn!(key, count = entry.count, "rate limit exceeded");
                return false;
            }
            *entry = RateLimitEntry::fresh(now, &policy);
            return true;
        }

        entry.count += 1;
        entry.last_attempt_at = now;
        true
    }

    fn info(&self, key: &str) -> RateLimitInfo {
        let now = self.clock.now();
        let policy = RateScope::from_key(key).policy();
        let entries = self.lock();

        match entries.get(key) {
            Some(entry) if !entry.window_elapsed(now) => RateLimitInfo {
                remaining: policy.max_attempts.saturating_sub(entry.count),
                reset_at: entry.window_reset_at,
                blocked: entry.is_blocked(now, &policy),
            },
            // Missing or stale: the next check starts a fresh window.
            _ => RateLimitInfo {
                remaining: policy.max_attempts,
                reset_at: now + policy.window(),
                blocked: false,
            },
        }
    }

    fn status(&self) -> RateLimiterStatus {
        self.sweep();
        let entries = self.lock();
        let memory_estimate_bytes = entries
            .keys()
            .map(|key| key.capacity() + size_of::<String>() + size_of::<RateLimitEntry>())
            .sum();
        RateLimiterStatus {
            total_entries: entries.len(),
            memory_estimate_bytes,
        }
    }
}

impl Sweep for MemoryRateLimiter {
    fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.window_elapsed(now));
        before - entries.len()
    }
}

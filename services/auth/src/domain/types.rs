use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// One-time verification code waiting to be consumed by its identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCode {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

impl PendingCode {
    /// Expired once `now` reaches `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Verification code length in ASCII digits.
pub const VERIFICATION_CODE_LEN: usize = 6;

/// Verification code time-to-live in seconds (10 minutes).
pub const VERIFICATION_CODE_TTL_SECS: i64 = 600;

/// Interval between pending-code sweeps in seconds.
pub const CODE_SWEEP_INTERVAL_SECS: u64 = 60;

/// Interval between rate-limit sweeps in seconds.
pub const RATE_LIMIT_SWEEP_INTERVAL_SECS: u64 = 300;

/// Display name used when neither a configured name nor an email local part exists.
pub const FALLBACK_DISPLAY_NAME: &str = "user";

// ── Rate limiting ────────────────────────────────────────────────────────────

/// Thresholds for one rate-limit scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub window_ms: i64,
    pub max_attempts: u32,
    /// Cool-down once the quota is spent. `None` falls back to the window.
    pub block_duration_ms: Option<i64>,
}

impl RateLimitPolicy {
    pub fn window(&self) -> Duration {
        Duration::milliseconds(self.window_ms)
    }

    pub fn block_duration(&self) -> Duration {
        Duration::milliseconds(self.block_duration_ms.unwrap_or(self.window_ms))
    }
}

/// Rate-limit scope, selected by key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateScope {
    Login,
    Process,
    Default,
}

impl RateScope {
    const LOGIN_PREFIX: &'static str = "login:";
    const PROCESS_PREFIX: &'static str = "process:";

    pub fn from_key(key: &str) -> Self {
        if key.starts_with(Self::LOGIN_PREFIX) {
            Self::Login
        } else if key.starts_with(Self::PROCESS_PREFIX) {
            Self::Process
        } else {
            Self::Default
        }
    }

    /// Fixed thresholds; not configurable at runtime.
    pub const fn policy(self) -> RateLimitPolicy {
        match self {
            Self::Login => RateLimitPolicy {
                window_ms: 60_000,
                max_attempts: 5,
                block_duration_ms: Some(300_000),
            },
            Self::Process => RateLimitPolicy {
                window_ms: 300_000,
                max_attempts: 10,
                block_duration_ms: None,
            },
            Self::Default => RateLimitPolicy {
                window_ms: 60_000,
                max_attempts: 20,
                block_duration_ms: None,
            },
        }
    }

    /// Composite limiter key, e.g. `login:user@example.com`.
    pub fn key(self, identity: &str) -> String {
        match self {
            Self::Login => format!("{}{identity}", Self::LOGIN_PREFIX),
            Self::Process => format!("{}{identity}", Self::PROCESS_PREFIX),
            Self::Default => format!("default:{identity}"),
        }
    }
}

/// Attempt counter for one limiter key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitEntry {
    pub count: u32,
    pub window_reset_at: DateTime<Utc>,
    pub last_attempt_at: DateTime<Utc>,
}

impl RateLimitEntry {
    /// First attempt of a new window.
    pub fn fresh(now: DateTime<Utc>, policy: &RateLimitPolicy) -> Self {
        Self {
            count: 1,
            window_reset_at: now + policy.window(),
            last_attempt_at: now,
        }
    }

    pub fn window_elapsed(&self, now: DateTime<Utc>) -> bool {
        self.window_reset_at < now
    }

    /// Quota spent and the cool-down since the last counted attempt not over.
    pub fn is_blocked(&self, now: DateTime<Utc>, policy: &RateLimitPolicy) -> bool {
        self.count >= policy.max_attempts
            && now - self.last_attempt_at < policy.block_duration()
    }
}

/// Read-only view of a limiter key, handed to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitInfo {
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
    pub blocked: bool,
}

impl RateLimitInfo {
    /// Whole minutes until the window resets, rounded up. Zero once passed.
    pub fn retry_after_minutes(&self, now: DateTime<Utc>) -> i64 {
        let ms = (self.reset_at - now).num_milliseconds();
        if ms <= 0 { 0 } else { (ms + 59_999) / 60_000 }
    }
}

/// Diagnostic snapshot of the rate limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimiterStatus {
    pub total_entries: usize,
    pub memory_estimate_bytes: usize,
}

#![allow(async_fn_in_trait)]

use std::sync::Arc;

use chrono::Duration;

use crate::domain::types::{RateLimitInfo, RateLimiterStatus};
use crate::error::AuthServiceError;

/// Something that drops expired state when asked. Driven by the sweeper.
pub trait Sweep: Send + Sync {
    /// Remove expired entries and return how many were removed.
    fn sweep(&self) -> usize;
}

/// Pending verification codes, at most one per identity.
pub trait CodeStore: Sweep {
    /// Store `code` for `email`, replacing any earlier code.
    fn issue(&self, email: &str, code: &str, ttl: Duration);

    /// `true` exactly once for a matching, unexpired code; the entry is
    /// removed on success. An expired entry is removed by the probe.
    fn consume(&self, email: &str, code: &str) -> bool;
}

/// Per-key attempt counter with window and block.
pub trait RateLimiter: Sweep {
    /// Count an attempt for `key`; `false` when the key is blocked.
    fn check(&self, key: &str) -> bool;

    /// Current quota for `key` without counting an attempt.
    fn info(&self, key: &str) -> RateLimitInfo;

    /// Sweep, then report entry count and a memory estimate.
    fn status(&self) -> RateLimiterStatus;
}

/// Port for the allow-list of users who may sign in.
pub trait UserDirectory: Send + Sync {
    fn is_allowed(&self, email: &str) -> bool;

    /// Configured display name, if any.
    fn display_name(&self, email: &str) -> Option<String>;
}

impl<T: UserDirectory + ?Sized> UserDirectory for Arc<T> {
    fn is_allowed(&self, email: &str) -> bool {
        (**self).is_allowed(email)
    }

    fn display_name(&self, email: &str) -> Option<String> {
        (**self).display_name(email)
    }
}

/// Port for the email collaborator that delivers verification codes.
pub trait CodeMailer: Send + Sync {
    async fn send_login_code(&self, email: &str, code: &str) -> Result<(), AuthServiceError>;
}

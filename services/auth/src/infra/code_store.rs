use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Duration;

use komikai_core::clock::SharedClock;

use crate::domain::repository::{CodeStore, Sweep};
use crate::domain::types::PendingCode;

/// In-process pending-code store. Clones share the same map.
///
/// All state is lost on restart; a user simply requests a new code.
#[derive(Clone)]
pub struct MemoryCodeStore {
    codes: Arc<Mutex<HashMap<String, PendingCode>>>,
    clock: SharedClock,
}

impl MemoryCodeStore {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            codes: Arc::new(Mutex::new(HashMap::new())),
            clock,
        }
    }

    /// Number of codes currently held, expired ones included.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, PendingCode>> {
        self.codes.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CodeStore for MemoryCodeStore {
    fn issue(&self, email: &str, code: &str, ttl: Duration) {
        let pending = PendingCode {
            code: code.to_owned(),
            expires_at: self.clock.now() + ttl,
        };
        let replaced = self.lock().insert(email.to_owned(), pending).is_some();
        tracing::debug!(email, replaced, "verification code issued");
    }

    fn consume(&self, email: &str, code: &str) -> bool {
        let now = self.clock.now();
        let mut codes = self.lock();

        let Some(pending) = codes.get(email) else {
            return false;
        };
        if pending.is_expired_at(now) {
            codes.remove(email);
            tracing::debug!(email, "expired verification code dropped");
            return false;
        }
        if pending.code != code {
            return false;
        }

        codes.remove(email);
        tracing::debug!(email, "verification code consumed");
        true
    }
}

impl Sweep for MemoryCodeStore {
    fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut codes = self.lock();
        let before = codes.len();
        codes.retain(|_, pending| !pending.is_expired_at(now));
        before - codes.len()
    }
}

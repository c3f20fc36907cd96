//! Time source shared by every stateful component.
//!
//! Stores and signers never call `Utc::now()` themselves; they hold a
//! [`SharedClock`] so tests can drive expiry, windows and blocks with a
//! [`ManualClock`] instead of sleeping.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Clock handle shared between components.
pub type SharedClock = Arc<dyn Clock>;

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn shared() -> SharedClock {
        Arc::new(Self)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to. Clones share the same instant.
///
/// ```
/// use chrono::Duration;
/// use komikai_core::clock::{Clock, ManualClock};
///
/// let clock = ManualClock::at_timestamp(1_700_000_000);
/// let other = clock.clone();
/// clock.advance(Duration::minutes(5));
/// assert_eq!(other.now().timestamp(), 1_700_000_300);
/// ```
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Start at a whole second (seconds since the UNIX epoch).
    ///
    /// # Panics
    ///
    /// Panics if `secs` is outside chrono's representable range.
    pub fn at_timestamp(secs: i64) -> Self {
        let start = DateTime::from_timestamp(secs, 0).expect("timestamp out of range");
        Self::new(start)
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = to;
    }

    pub fn shared(&self) -> SharedClock {
        Arc::new(self.clone())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

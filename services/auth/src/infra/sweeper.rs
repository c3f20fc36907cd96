use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::domain::repository::Sweep;

/// Background task sweeping one store on a fixed interval.
///
/// The task stops when the handle is dropped or [`aborted`](Self::abort).
#[must_use = "the sweeper stops when its handle is dropped"]
pub struct SweeperHandle {
    task: JoinHandle<()>,
}

impl SweeperHandle {
    pub fn abort(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawn a task that calls [`Sweep::sweep`] every `every`.
///
/// The store lock is only held inside `sweep`, never across the wait.
/// Must be called from within a tokio runtime.
pub fn spawn_sweeper<S>(target: S, every: Duration, name: &'static str) -> SweeperHandle
where
    S: Sweep + 'static,
{
    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; sweep one full interval later.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = target.sweep();
            if removed > 0 {
                tracing::debug!(sweeper = name, removed, "expired entries swept");
            }
        }
    });
    SweeperHandle { task }
}

//! Shutdown barrier for background work.
//!
//! Background tasks register with [`Cleanup::track`] (or run through
//! [`Cleanup::spawn`]) and the shutdown sequence calls
//! [`Cleanup::await_drain`] with a deadline token. The wait ends when the last
//! registration is released or the token fires, whichever comes first. Work
//! still running at that point is abandoned, not cancelled.
//!
//! The barrier is an ordinary value injected through `AppState`, so tests can
//! build as many independent instances as they need.

use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::{TaskTracker, task_tracker::TaskTrackerToken};

#[derive(Clone, Debug, Default)]
pub struct Cleanup {
    tracker: TaskTracker,
}

/// One unit of outstanding work. Dropping it releases the registration, so it
/// is released on every exit path (early return, `?`, panic unwind).
#[derive(Debug)]
#[must_use = "the registration is released as soon as the guard is dropped"]
pub struct CleanupGuard {
    _token: TaskTrackerToken,
}

impl Cleanup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&self) -> CleanupGuard {
        CleanupGuard {
            _token: self.tracker.token(),
        }
    }

    /// Spawn a tracked task on the current runtime.
    pub fn spawn<F>(&self, task: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.tracker.spawn(task)
    }

    /// Number of registrations not yet released.
    pub fn outstanding(&self) -> usize {
        self.tracker.len()
    }

    /// Wait until every registration is released or `cancel` fires.
    ///
    /// Never fails. Callers that need to know why it returned check
    /// `cancel.is_cancelled()` themselves.
    pub async fn await_drain(&self, cancel: &CancellationToken) {
        // A tracker only reports "done" once closed; registrations keep working afterwards.
        self.tracker.close();

        tokio::select! {
            _ = self.tracker.wait() => {
                tracing::debug!("background cleanup drained");
            }
            _ = cancel.cancelled() => {
                tracing::warn!(
                    outstanding = self.tracker.len(),
                    "cleanup deadline reached, abandoning remaining background work"
                );
            }
        }
    }
}

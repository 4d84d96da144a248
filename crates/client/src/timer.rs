//! Cancellable timers.
//!
//! Delayed and debounced work runs on spawned tokio tasks whose handles are
//! owned here. Dropping the owner aborts the task, so a controller that goes
//! away never leaves a timer firing against it.

use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::trace;

/// A one-shot task that runs after a delay unless cancelled first.
#[derive(Debug)]
pub struct DelayedTask {
    handle: JoinHandle<()>,
}

impl DelayedTask {
    /// Schedule `task` to run after `delay`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(delay: Duration, task: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });
        Self { handle }
    }

    /// Cancel the task. Has no effect if it already ran.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    /// Whether the task ran to completion or was cancelled.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for DelayedTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Runs only the last of a burst of calls, once the burst has been quiet
/// for the debounce window.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    pending: Mutex<Option<DelayedTask>>,
}

impl Debouncer {
    /// Create a debouncer with the given quiet window.
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self {
            window,
            pending: Mutex::new(None),
        }
    }

    /// The quiet window.
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Schedule `task`, cancelling whatever was scheduled before.
    pub fn call<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let next = DelayedTask::schedule(self.window, task);
        let previous = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(next);
        if previous.is_some() {
            trace!("Debounced call superseded");
        }
    }

    /// Cancel any scheduled call.
    pub fn cancel(&self) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

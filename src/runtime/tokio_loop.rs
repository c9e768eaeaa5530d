//! Tokio runtime host loop.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::AbortHandle;

use crate::core::{DelayedHostLoop, HostCallback, HostLoop, SchedulerError, TimerHandle};

/// Host loop that runs callbacks as tasks on a tokio runtime.
///
/// With a current-thread runtime this is a single execution context; on a
/// multi-threaded runtime callbacks may run on any of its workers.
#[derive(Clone, Debug)]
pub struct TokioLoop {
    handle: Handle,
}

impl TokioLoop {
    /// Create a host from a tokio runtime handle.
    #[must_use]
    pub const fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Create a host for the runtime the caller is running on.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::NoRuntime` outside a tokio runtime.
    pub fn current() -> Result<Self, SchedulerError> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|e| SchedulerError::NoRuntime(e.to_string()))
    }
}

impl HostLoop for TokioLoop {
    fn post(&self, callback: HostCallback) {
        self.handle.spawn(async move { callback() });
    }
}

/// Delayed tokio task, cancelled by aborting it.
#[derive(Debug)]
pub struct TokioTimer {
    task: AbortHandle,
}

impl TimerHandle for TokioTimer {
    fn cancel(&self) {
        self.task.abort();
    }
}

impl DelayedHostLoop for TokioLoop {
    type Timer = TokioTimer;

    fn post_after(&self, callback: HostCallback, delay: Duration) -> TokioTimer {
        let task = self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            callback();
        });
        TokioTimer {
            task: task.abort_handle(),
        }
    }
}

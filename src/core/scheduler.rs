//! The scheduler contract and the shared posting engine.

use std::time::{Duration, Instant};

use tracing::debug;

use super::disposable::Disposable;
use super::handle::ScheduledHandle;
use super::host::{DelayedHostLoop, HostLoop};
use crate::util::time::{delay_millis, remaining_until};

/// Schedules actions onto an execution context.
///
/// Every `schedule*` call returns its own independent [`ScheduledHandle`]
/// synchronously; the action runs later on the scheduler's context and
/// receives the scheduler and the caller's `state`. The value it returns is
/// kept by the handle and disposed along with it.
///
/// Schedulers are cheap to clone: clones share the underlying host.
pub trait Scheduler: Clone + Send + Sync + 'static {
    /// Current time according to this scheduler's clock.
    fn now(&self) -> Instant;

    /// Run `action` as soon as possible.
    fn schedule<S, F, R>(&self, state: S, action: F) -> ScheduledHandle
    where
        S: Send + 'static,
        F: FnOnce(&Self, S) -> R + Send + 'static,
        R: Disposable + Send + 'static;

    /// Run `action` once `due` has elapsed. A zero delay posts immediately.
    fn schedule_after<S, F, R>(&self, state: S, due: Duration, action: F) -> ScheduledHandle
    where
        S: Send + 'static,
        F: FnOnce(&Self, S) -> R + Send + 'static,
        R: Disposable + Send + 'static;

    /// Run `action` at the absolute instant `due`.
    ///
    /// An instant at or before [`Scheduler::now`] posts immediately instead of
    /// arming a zero-length timer.
    fn schedule_at<S, F, R>(&self, state: S, due: Instant, action: F) -> ScheduledHandle
    where
        S: Send + 'static,
        F: FnOnce(&Self, S) -> R + Send + 'static,
        R: Disposable + Send + 'static,
    {
        match remaining_until(self.now(), due) {
            Some(delay) => self.schedule_after(state, delay, action),
            None => self.schedule(state, action),
        }
    }
}

/// Post `job` to `host` behind a fresh handle.
pub fn post_now<H, F, R>(host: &H, job: F) -> ScheduledHandle
where
    H: HostLoop + ?Sized,
    F: FnOnce() -> R + Send + 'static,
    R: Disposable + Send + 'static,
{
    let handle = ScheduledHandle::new();
    host.post(handle.wrap(job));
    debug!(handle_id = handle.id(), "Action posted to host loop");
    handle
}

/// Arm a native host timer that runs `job` after `delay`, behind a fresh
/// handle that owns the timer until it fires or is disposed.
pub fn post_after<H, F, R>(host: &H, delay: Duration, job: F) -> ScheduledHandle
where
    H: DelayedHostLoop + ?Sized,
    F: FnOnce() -> R + Send + 'static,
    R: Disposable + Send + 'static,
{
    let handle = ScheduledHandle::new();
    let timer = host.post_after(handle.wrap(job), delay);
    handle.attach_timer(timer);
    debug!(
        handle_id = handle.id(),
        delay_ms = delay_millis(delay),
        "Action armed on host timer"
    );
    handle
}

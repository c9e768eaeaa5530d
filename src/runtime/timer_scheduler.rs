//! Scheduler for hosts with a native timer primitive.
//!
//! Handler loopers, run loops and embedded main loops all offer "post now"
//! and "post after delay". [`TimerScheduler`] restates the disposal protocol
//! on top of both: immediate work goes through [`post_now`], delayed work arms
//! a host timer whose handle is owned by the returned [`ScheduledHandle`].

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::core::{post_after, post_now, DelayedHostLoop, Disposable, ScheduledHandle, Scheduler};

/// Scheduler backed by a host's native post and timer primitives.
pub struct TimerScheduler<H> {
    host: Arc<H>,
}

impl<H: DelayedHostLoop> TimerScheduler<H> {
    /// Wrap a host loop.
    pub fn new(host: H) -> Self {
        Self::from_shared(Arc::new(host))
    }

    /// Wrap a host loop that is already shared elsewhere.
    pub const fn from_shared(host: Arc<H>) -> Self {
        Self { host }
    }

    /// The underlying host loop.
    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }
}

impl<H> Clone for TimerScheduler<H> {
    fn clone(&self) -> Self {
        Self {
            host: Arc::clone(&self.host),
        }
    }
}

impl<H> fmt::Debug for TimerScheduler<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerScheduler")
            .field("host", &std::any::type_name::<H>())
            .finish()
    }
}

impl<H: DelayedHostLoop> Scheduler for TimerScheduler<H> {
    fn now(&self) -> Instant {
        self.host.now()
    }

    fn schedule<S, F, R>(&self, state: S, action: F) -> ScheduledHandle
    where
        S: Send + 'static,
        F: FnOnce(&Self, S) -> R + Send + 'static,
        R: Disposable + Send + 'static,
    {
        let scheduler = self.clone();
        post_now(&*self.host, move || action(&scheduler, state))
    }

    fn schedule_after<S, F, R>(&self, state: S, due: Duration, action: F) -> ScheduledHandle
    where
        S: Send + 'static,
        F: FnOnce(&Self, S) -> R + Send + 'static,
        R: Disposable + Send + 'static,
    {
        if due.is_zero() {
            return self.schedule(state, action);
        }
        let scheduler = self.clone();
        post_after(&*self.host, due, move || action(&scheduler, state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::core::Phase;
    use crate::infra::ManualLoop;

    #[test]
    fn test_zero_delay_bypasses_timer() {
        let scheduler = TimerScheduler::new(ManualLoop::new());
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);

        let handle = scheduler.schedule_after((), Duration::ZERO, move |_, ()| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(scheduler.host().timer_count(), 0);
        assert_eq!(scheduler.host().queue_len(), 1);
        scheduler.host().run_queue();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(handle.phase(), Phase::Fired);
    }

    #[test]
    fn test_action_can_reschedule_itself() {
        fn tick(scheduler: &TimerScheduler<ManualLoop>, remaining: Arc<AtomicUsize>) {
            if remaining.fetch_sub(1, Ordering::SeqCst) > 1 {
                drop(scheduler.schedule_after(remaining, Duration::from_millis(10), |s, r| {
                    tick(s, r);
                }));
            }
        }

        let scheduler = TimerScheduler::new(ManualLoop::new());
        let remaining = Arc::new(AtomicUsize::new(3));
        drop(scheduler.schedule(Arc::clone(&remaining), |s, r| tick(s, r)));

        scheduler.host().run_queue();
        assert_eq!(remaining.load(Ordering::SeqCst), 2);
        scheduler.host().advance_by(Duration::from_millis(10));
        scheduler.host().advance_by(Duration::from_millis(10));
        assert_eq!(remaining.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.host().timer_count(), 0);
    }
}

//! Scheduler for hosts that can only "post now".
//!
//! Serial dispatch queues and similar hosts have no timer that a test clock
//! can drive. [`DispatchScheduler`] measures delays on a secondary
//! [`Scheduler`] and, when that fires, hops onto the host with an immediate
//! post. The two stages are chained by composition: the host post's handle is
//! the *result* of the secondary's action, so disposing the outer handle
//! either cancels the pending timer or cancels/disposes the host stage.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::core::{post_now, Disposable, HostLoop, ScheduledHandle, Scheduler, SchedulerError};

#[cfg(not(target_arch = "wasm32"))]
use crate::config::EventLoopConfig;
#[cfg(not(target_arch = "wasm32"))]
use crate::infra::EventLoopScheduler;

/// Scheduler that runs actions on a post-only host and keeps time on a
/// secondary scheduler.
///
/// Actions always execute on the host, never on the secondary's context.
/// [`Scheduler::now`] reports the secondary's clock.
///
/// On both the immediate and the delayed path the action receives this
/// `DispatchScheduler`, not the secondary, so work it schedules in turn also
/// runs on the host. Use [`DispatchScheduler::secondary`] to reach the time
/// keeper directly.
///
/// A pending delayed action holds a clone of this scheduler inside the
/// secondary's timer. With an [`EventLoopScheduler`] secondary, that keeps
/// the event loop thread alive until the handle is disposed or the timer
/// fires.
pub struct DispatchScheduler<H, D> {
    host: Arc<H>,
    secondary: D,
}

impl<H: HostLoop, D: Scheduler> DispatchScheduler<H, D> {
    /// Combine a host loop with the scheduler that measures delays for it.
    pub fn new(host: H, secondary: D) -> Self {
        Self {
            host: Arc::new(host),
            secondary,
        }
    }

    /// The underlying host loop.
    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The secondary time-keeping scheduler.
    #[must_use]
    pub const fn secondary(&self) -> &D {
        &self.secondary
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl<H: HostLoop> DispatchScheduler<H, EventLoopScheduler> {
    /// Keep time on a dedicated event loop thread spawned from `config`.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::InvalidConfig` or `SchedulerError::Spawn` if
    /// the event loop cannot be started.
    pub fn with_event_loop(host: H, config: EventLoopConfig) -> Result<Self, SchedulerError> {
        let secondary = crate::infra::event_loop_scheduler(config)?;
        Ok(Self::new(host, secondary))
    }
}

impl<H, D: Clone> Clone for DispatchScheduler<H, D> {
    fn clone(&self) -> Self {
        Self {
            host: Arc::clone(&self.host),
            secondary: self.secondary.clone(),
        }
    }
}

impl<H, D> fmt::Debug for DispatchScheduler<H, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchScheduler")
            .field("host", &std::any::type_name::<H>())
            .field("secondary", &std::any::type_name::<D>())
            .finish()
    }
}

impl<H: HostLoop, D: Scheduler> Scheduler for DispatchScheduler<H, D> {
    fn now(&self) -> Instant {
        self.secondary.now()
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
        self.secondary.schedule_after(state, due, move |_, state| {
            // On the secondary's context: defer the action to the host.
            let host = Arc::clone(&scheduler.host);
            post_now(&*host, move || action(&scheduler, state))
        })
    }
}

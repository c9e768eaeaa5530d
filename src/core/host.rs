//! Host loop capabilities the schedulers are built on.
//!
//! A host loop is whatever execution context actually runs posted work: a GUI
//! main thread, a serial dispatch queue, a run loop. The schedulers only need
//! two capabilities from it, "post now" and, optionally, "post after a delay".

use std::time::{Duration, Instant};

use crate::util::time::delay_millis;

/// Callback posted to a host loop.
pub type HostCallback = Box<dyn FnOnce() + Send + 'static>;

/// A host loop that can run callbacks on its own execution context.
pub trait HostLoop: Send + Sync + 'static {
    /// Enqueue `callback` to run on the host's context as soon as possible.
    ///
    /// Implementations must not run the callback synchronously on the
    /// caller's thread.
    fn post(&self, callback: HostCallback);

    /// Current time as seen by this host.
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Cancellable handle to a native host timer.
pub trait TimerHandle: Send + 'static {
    /// Prevent a not-yet-fired timer from firing. A no-op after it fired.
    fn cancel(&self);
}

/// A host loop that also provides a native delay primitive.
pub trait DelayedHostLoop: HostLoop {
    /// Timer handle returned by [`DelayedHostLoop::post_after`].
    type Timer: TimerHandle;

    /// Run `callback` on the host's context once `delay` has elapsed.
    fn post_after(&self, callback: HostCallback, delay: Duration) -> Self::Timer;
}

/// Host loop assembled from plain closures.
///
/// `post` receives callbacks to run as soon as possible. The optional delayed
/// primitive receives the callback and a delay in whole milliseconds, the way
/// handler-style platform APIs take it, and returns a [`TimerHandle`].
///
/// ```
/// use std::sync::Arc;
/// use parking_lot::Mutex;
/// use prometheus_platform_schedulers::core::{FnLoop, HostCallback, HostLoop};
///
/// let queue: Arc<Mutex<Vec<HostCallback>>> = Arc::default();
/// let sink = Arc::clone(&queue);
/// let host = FnLoop::new(move |callback| sink.lock().push(callback));
///
/// host.post(Box::new(|| {}));
/// assert_eq!(queue.lock().len(), 1);
/// ```
pub struct FnLoop<P, D = ()> {
    post: P,
    post_delayed: D,
}

impl<P> FnLoop<P> {
    /// Host with only a post-now primitive.
    pub const fn new(post: P) -> Self {
        Self {
            post,
            post_delayed: (),
        }
    }
}

impl<P, D> FnLoop<P, D> {
    /// Attach a post-after-delay primitive taking the delay in milliseconds.
    pub fn with_delayed<D2>(self, post_delayed: D2) -> FnLoop<P, D2> {
        FnLoop {
            post: self.post,
            post_delayed,
        }
    }
}

impl<P, D> HostLoop for FnLoop<P, D>
where
    P: Fn(HostCallback) + Send + Sync + 'static,
    D: Send + Sync + 'static,
{
    fn post(&self, callback: HostCallback) {
        (self.post)(callback);
    }
}

impl<P, D, T> DelayedHostLoop for FnLoop<P, D>
where
    P: Fn(HostCallback) + Send + Sync + 'static,
    D: Fn(HostCallback, u64) -> T + Send + Sync + 'static,
    T: TimerHandle,
{
    type Timer = T;

    fn post_after(&self, callback: HostCallback, delay: Duration) -> T {
        (self.post_delayed)(callback, delay_millis(delay))
    }
}

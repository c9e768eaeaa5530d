//! Disposal handle returned by every `schedule` call.
//!
//! A [`ScheduledHandle`] is the only state shared between the caller and the
//! host loop. It combines an atomic cancellation flag with a small state
//! machine guarding the result slot:
//!
//! ```text
//!   Pending ──fire──▶ Running ──return──▶ Fired(result) ──dispose──▶ FiredAndDisposed
//!      │                 │                                               ▲
//!   dispose           dispose (result disposed as soon as it returns) ───┘
//!      ▼
//!   Cancelled
//! ```
//!
//! Disposal is total over every phase and idempotent. A cancellation racing
//! the host resolves to exactly one of "the callback saw the flag and
//! skipped" or "the action ran and its result was disposed exactly once".

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use super::disposable::{Disposable, ResultHandle};
use super::host::{HostCallback, TimerHandle};

static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

/// Observable lifecycle phase of a [`ScheduledHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Posted to the host, not yet fired.
    Pending,
    /// The action is executing right now.
    Running,
    /// The action ran and its result is held by the handle.
    Fired,
    /// Disposed before the action ran; it never will.
    Cancelled,
    /// The action ran and its result has been released.
    FiredAndDisposed,
}

enum Slot {
    Pending,
    Running,
    Fired(ResultHandle),
    Cancelled,
    FiredAndDisposed,
}

impl Slot {
    const fn phase(&self) -> Phase {
        match self {
            Self::Pending => Phase::Pending,
            Self::Running => Phase::Running,
            Self::Fired(_) => Phase::Fired,
            Self::Cancelled => Phase::Cancelled,
            Self::FiredAndDisposed => Phase::FiredAndDisposed,
        }
    }
}

struct HandleState {
    slot: Slot,
    /// Native timer owned between scheduling and firing.
    timer: Option<Box<dyn TimerHandle>>,
}

struct HandleInner {
    id: u64,
    cancelled: AtomicBool,
    state: Mutex<HandleState>,
}

/// Cancellable handle to one scheduled action.
///
/// Cloning yields another reference to the same handle. Dropping a handle
/// does not cancel anything; call [`ScheduledHandle::dispose`].
#[derive(Clone)]
pub struct ScheduledHandle {
    inner: Arc<HandleInner>,
}

impl ScheduledHandle {
    /// Create a fresh handle in the [`Phase::Pending`] phase.
    ///
    /// Pair it with [`ScheduledHandle::wrap`] to post work to a host.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(HandleInner {
                id: NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed),
                cancelled: AtomicBool::new(false),
                state: Mutex::new(HandleState {
                    slot: Slot::Pending,
                    timer: None,
                }),
            }),
        }
    }

    /// Process-unique identifier, used as a logging field.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Whether [`ScheduledHandle::dispose`] has been called.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.inner.state.lock().slot.phase()
    }

    /// Cancel the scheduled action, or release its result if it already ran.
    ///
    /// Pending work never runs after this returns, a pending native timer is
    /// cancelled at the host, and a captured result is disposed exactly once.
    /// Further calls are no-ops.
    pub fn dispose(&self) {
        if self.inner.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }

        let (timer, result) = {
            let mut state = self.inner.state.lock();
            let timer = state.timer.take();
            let result = match std::mem::replace(&mut state.slot, Slot::Cancelled) {
                Slot::Pending => None,
                Slot::Running => {
                    // The running callback sees the flag and disposes on return.
                    state.slot = Slot::Running;
                    None
                }
                Slot::Fired(result) => {
                    state.slot = Slot::FiredAndDisposed;
                    Some(result)
                }
                done @ (Slot::Cancelled | Slot::FiredAndDisposed) => {
                    state.slot = done;
                    None
                }
            };
            (timer, result)
        };

        if let Some(timer) = timer {
            timer.cancel();
        }
        if let Some(result) = result {
            result.dispose();
        }
        debug!(handle_id = self.inner.id, "Scheduled handle disposed");
    }

    /// Wrap `job` into a host callback gated by this handle.
    ///
    /// When the host runs the callback, `job` is skipped if the handle was
    /// disposed; otherwise it runs and its result is stored in the handle.
    pub fn wrap<F, R>(&self, job: F) -> HostCallback
    where
        F: FnOnce() -> R + Send + 'static,
        R: Disposable + Send + 'static,
    {
        let handle = self.clone();
        Box::new(move || handle.run(job))
    }

    /// Hand the native timer backing this handle over for cancellation.
    ///
    /// A handle disposed before the timer arrives cancels it immediately; a
    /// handle that already fired just releases it.
    pub fn attach_timer<T: TimerHandle>(&self, timer: T) {
        let mut state = self.inner.state.lock();
        match state.slot.phase() {
            Phase::Pending => state.timer = Some(Box::new(timer)),
            Phase::Cancelled => {
                drop(state);
                timer.cancel();
            }
            Phase::Running | Phase::Fired | Phase::FiredAndDisposed => {}
        }
    }

    fn run<F, R>(&self, job: F)
    where
        F: FnOnce() -> R,
        R: Disposable + Send + 'static,
    {
        if !self.begin() {
            debug!(handle_id = self.inner.id, "Skipping disposed action");
            return;
        }

        let mut guard = RunGuard {
            handle: self,
            armed: true,
        };
        let result = job();
        guard.armed = false;
        self.finish(Box::new(result));
    }

    /// Pending -> Running. Returns false if the action must not run.
    fn begin(&self) -> bool {
        if self.inner.cancelled.load(Ordering::Acquire) {
            return false;
        }

        let timer = {
            let mut state = self.inner.state.lock();
            if !matches!(state.slot, Slot::Pending) {
                return false;
            }
            state.slot = Slot::Running;
            state.timer.take()
        };
        // Fired: the host no longer needs the timer.
        drop(timer);
        true
    }

    /// Running -> Fired, or straight to FiredAndDisposed if disposal landed
    /// while the action was running.
    fn finish(&self, result: ResultHandle) {
        let mut state = self.inner.state.lock();
        if self.inner.cancelled.load(Ordering::Acquire) {
            state.slot = Slot::FiredAndDisposed;
            drop(state);
            result.dispose();
        } else {
            state.slot = Slot::Fired(result);
        }
    }
}

impl Default for ScheduledHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl Disposable for ScheduledHandle {
    fn dispose(&self) {
        Self::dispose(self);
    }
}

impl fmt::Debug for ScheduledHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledHandle")
            .field("id", &self.inner.id)
            .field("disposed", &self.is_disposed())
            .field("phase", &self.phase())
            .finish()
    }
}

/// Leaves the handle in a terminal phase if the action unwinds.
struct RunGuard<'a> {
    handle: &'a ScheduledHandle,
    armed: bool,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut state = self.handle.inner.state.lock();
            if matches!(state.slot, Slot::Running) {
                state.slot = Slot::FiredAndDisposed;
            }
        }
    }
}

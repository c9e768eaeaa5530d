//! Deterministic host loop driven by hand.
//!
//! [`ManualLoop`] queues posted callbacks until [`ManualLoop::run_queue`] is
//! called and keeps a virtual clock that only moves on
//! [`ManualLoop::advance_by`]. Wrapped in a [`TimerScheduler`] it doubles as a
//! virtual-time secondary scheduler ([`VirtualTimeScheduler`]).

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::core::{DelayedHostLoop, HostCallback, HostLoop, TimerHandle};
use crate::runtime::TimerScheduler;

/// Scheduler whose timers run on a [`ManualLoop`]'s virtual clock.
pub type VirtualTimeScheduler = TimerScheduler<ManualLoop>;

/// Timers ordered by due time, then by arming order.
type TimerKey = (Duration, u64);

struct ManualState {
    origin: Instant,
    elapsed: Duration,
    queue: VecDeque<HostCallback>,
    timers: BTreeMap<TimerKey, HostCallback>,
    next_timer_id: u64,
}

/// Host loop with a manually pumped queue and a virtual clock.
///
/// Clones share the same queue and clock. Callbacks always run on the thread
/// that pumps the loop, with no internal lock held.
#[derive(Clone)]
pub struct ManualLoop {
    state: Arc<Mutex<ManualState>>,
}

impl ManualLoop {
    /// Create an idle loop whose virtual clock starts now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ManualState {
                origin: Instant::now(),
                elapsed: Duration::ZERO,
                queue: VecDeque::new(),
                timers: BTreeMap::new(),
                next_timer_id: 0,
            })),
        }
    }

    /// Callbacks posted and not yet run.
    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Armed timers that have neither fired nor been cancelled.
    #[must_use]
    pub fn timer_count(&self) -> usize {
        self.state.lock().timers.len()
    }

    /// Virtual time elapsed since the loop was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.state.lock().elapsed
    }

    /// Run the callbacks queued at the time of the call, in posting order.
    ///
    /// Callbacks they post stay queued for the next call. Returns how many
    /// callbacks ran.
    pub fn run_queue(&self) -> usize {
        let batch: Vec<HostCallback> = self.state.lock().queue.drain(..).collect();
        let count = batch.len();
        for callback in batch {
            callback();
        }
        count
    }

    /// Run queued callbacks until the queue stays empty.
    pub fn run_until_idle(&self) -> usize {
        let mut total = 0;
        loop {
            let ran = self.run_queue();
            if ran == 0 {
                return total;
            }
            total += ran;
        }
    }

    /// Move the virtual clock forward by `delta`, firing every timer that
    /// comes due on the way, in due order. Returns how many timers fired.
    pub fn advance_by(&self, delta: Duration) -> usize {
        let target = self.elapsed().saturating_add(delta);
        let mut fired = 0;
        loop {
            let next = {
                let mut guard = self.state.lock();
                let state = &mut *guard;
                let due = state.timers.keys().next().map(|&(due, _)| due);
                match due {
                    Some(due) if due <= target => {
                        state.elapsed = state.elapsed.max(due);
                        state.timers.pop_first().map(|(_, callback)| callback)
                    }
                    _ => None,
                }
            };
            let Some(callback) = next else { break };
            callback();
            fired += 1;
        }

        let mut state = self.state.lock();
        state.elapsed = state.elapsed.max(target);
        fired
    }
}

impl Default for ManualLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ManualLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ManualLoop")
            .field("elapsed", &state.elapsed)
            .field("queued", &state.queue.len())
            .field("timers", &state.timers.len())
            .finish()
    }
}

impl HostLoop for ManualLoop {
    fn post(&self, callback: HostCallback) {
        self.state.lock().queue.push_back(callback);
    }

    fn now(&self) -> Instant {
        let state = self.state.lock();
        state.origin + state.elapsed
    }
}

/// Timer armed on a [`ManualLoop`].
pub struct ManualTimer {
    key: TimerKey,
    state: Weak<Mutex<ManualState>>,
}

impl TimerHandle for ManualTimer {
    fn cancel(&self) {
        if let Some(state) = self.state.upgrade() {
            let removed = state.lock().timers.remove(&self.key);
            drop(removed);
        }
    }
}

impl fmt::Debug for ManualTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualTimer")
            .field("due", &self.key.0)
            .field("id", &self.key.1)
            .finish()
    }
}

impl DelayedHostLoop for ManualLoop {
    type Timer = ManualTimer;

    fn post_after(&self, callback: HostCallback, delay: Duration) -> ManualTimer {
        let mut state = self.state.lock();
        let key = (state.elapsed.saturating_add(delay), state.next_timer_id);
        state.next_timer_id += 1;
        state.timers.insert(key, callback);
        ManualTimer {
            key,
            state: Arc::downgrade(&self.state),
        }
    }
}

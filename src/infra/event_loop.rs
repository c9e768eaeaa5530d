//! Dedicated OS thread acting as a host loop with native timers.
//!
//! The event loop is the default time keeper for post-only hosts: wrapped in
//! a [`TimerScheduler`] it becomes the secondary scheduler of a
//! [`DispatchScheduler`](crate::runtime::DispatchScheduler).
//!
//! # Design
//!
//! - **No polling**: the thread blocks on the command channel until the next
//!   timer deadline
//! - **Lazy disarm**: cancelled timers are dropped from the callback map and
//!   skipped when their heap entry surfaces
//! - **Panic isolation**: a panicking callback is logged and the loop keeps
//!   running

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::EventLoopConfig;
use crate::core::{DelayedHostLoop, HostCallback, HostLoop, SchedulerError, TimerHandle};
use crate::runtime::TimerScheduler;

/// Scheduler running on a dedicated [`EventLoop`] thread.
pub type EventLoopScheduler = TimerScheduler<EventLoop>;

/// Spawn an event loop and wrap it in a scheduler.
///
/// # Errors
///
/// Returns `SchedulerError::InvalidConfig` or `SchedulerError::Spawn`.
pub fn event_loop_scheduler(config: EventLoopConfig) -> Result<EventLoopScheduler, SchedulerError> {
    Ok(TimerScheduler::new(EventLoop::new(config)?))
}

enum Command {
    Post(HostCallback),
    Arm {
        id: u64,
        due: Instant,
        callback: HostCallback,
    },
    Disarm(u64),
    Shutdown,
}

/// Dead heap entries tolerated before the heap is rebuilt.
const COMPACT_SLACK: usize = 64;

#[derive(Default)]
struct TimerQueue {
    order: BinaryHeap<Reverse<(Instant, u64)>>,
    callbacks: HashMap<u64, HostCallback>,
}

impl TimerQueue {
    fn arm(&mut self, id: u64, due: Instant, callback: HostCallback) {
        self.order.push(Reverse((due, id)));
        self.callbacks.insert(id, callback);
    }

    fn disarm(&mut self, id: u64) -> Option<HostCallback> {
        let callback = self.callbacks.remove(&id);
        // Dead entries otherwise linger until their deadline surfaces.
        if self.order.len() > 2 * self.callbacks.len() + COMPACT_SLACK {
            let callbacks = &self.callbacks;
            self.order.retain(|Reverse((_, live_id))| callbacks.contains_key(live_id));
        }
        callback
    }

    /// Earliest deadline among live timers.
    fn next_due(&mut self) -> Option<Instant> {
        while let Some(&Reverse((due, id))) = self.order.peek() {
            if self.callbacks.contains_key(&id) {
                return Some(due);
            }
            self.order.pop();
        }
        None
    }

    fn pop_due(&mut self, now: Instant) -> Option<HostCallback> {
        while let Some(&Reverse((due, id))) = self.order.peek() {
            if due > now {
                return None;
            }
            self.order.pop();
            if let Some(callback) = self.callbacks.remove(&id) {
                return Some(callback);
            }
        }
        None
    }

    fn len(&self) -> usize {
        self.callbacks.len()
    }
}

/// Host loop backed by one dedicated OS thread.
///
/// Callbacks run on the event loop thread in posting order; timers fire in
/// deadline order. Call [`EventLoop::shutdown`] for a graceful stop; dropping
/// the loop only signals the thread.
///
/// Armed timers own their callbacks, and a callback may hold a scheduler
/// that shares this loop (a [`DispatchScheduler`](crate::runtime::DispatchScheduler)
/// stage does). Such a loop is not dropped while the timer is armed, so a
/// far-future timer that is never disposed keeps the thread alive until it
/// fires. Dispose the handle or call [`EventLoop::shutdown`] to release it.
pub struct EventLoop {
    config: EventLoopConfig,
    tx: Mutex<Option<Sender<Command>>>,
    shutdown: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<()>>>,
    next_timer_id: AtomicU64,
}

impl EventLoop {
    /// Spawn the event loop thread.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::InvalidConfig` if the configuration is
    /// invalid, or `SchedulerError::Spawn` if the thread cannot be created.
    pub fn new(config: EventLoopConfig) -> Result<Self, SchedulerError> {
        config.validate().map_err(SchedulerError::InvalidConfig)?;

        let (tx, rx) = unbounded::<Command>();
        let worker = thread::Builder::new()
            .name(config.thread_name.clone())
            .stack_size(config.thread_stack_size)
            .spawn(move || run_loop(&rx))?;

        info!(
            thread_name = %config.thread_name,
            stack_size = config.thread_stack_size,
            "Event loop started"
        );

        Ok(Self {
            config,
            tx: Mutex::new(Some(tx)),
            shutdown: Arc::new(AtomicBool::new(false)),
            worker: Mutex::new(Some(worker)),
            next_timer_id: AtomicU64::new(0),
        })
    }

    /// The configuration the loop was started with.
    #[must_use]
    pub const fn config(&self) -> &EventLoopConfig {
        &self.config
    }

    /// Whether the loop still accepts work.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.shutdown.load(Ordering::Acquire)
    }

    /// Stop the loop and wait for its thread to exit.
    ///
    /// Pending callbacks and timers queued behind the shutdown are dropped
    /// without running. Waits at most the configured shutdown timeout, then
    /// detaches the thread.
    pub fn shutdown(&self) {
        if self.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }

        info!("Shutting down event loop");

        if let Some(tx) = self.tx.lock().take() {
            let _ = tx.send(Command::Shutdown);
        }

        let Some(worker) = self.worker.lock().take() else {
            return;
        };
        if worker.thread().id() == thread::current().id() {
            debug!("Event loop shut down from its own thread; not joining");
            return;
        }

        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        let joiner = thread::spawn(move || {
            let _ = done_tx.send(worker.join().is_ok());
        });

        match done_rx.recv_timeout(self.config.shutdown_timeout()) {
            Ok(true) => {
                debug!("Event loop thread joined");
                let _ = joiner.join();
            }
            Ok(false) => {
                warn!("Event loop thread panicked");
                let _ = joiner.join();
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.config.shutdown_timeout_ms,
                    "Event loop did not exit within timeout - detaching"
                );
            }
        }
    }

    fn send(&self, command: Command) {
        if self.shutdown.load(Ordering::Acquire) {
            warn!("Event loop is shut down; dropping posted work");
            return;
        }
        let tx = self.tx.lock();
        let delivered = tx.as_ref().is_some_and(|tx| tx.send(command).is_ok());
        if !delivered {
            warn!("Event loop channel closed; dropping posted work");
        }
    }
}

impl HostLoop for EventLoop {
    fn post(&self, callback: HostCallback) {
        self.send(Command::Post(callback));
    }
}

/// Timer armed on an [`EventLoop`].
pub struct EventLoopTimer {
    id: u64,
    tx: Option<Sender<Command>>,
}

impl TimerHandle for EventLoopTimer {
    fn cancel(&self) {
        if let Some(tx) = &self.tx {
            // A closed loop has no timers left to disarm.
            let _ = tx.send(Command::Disarm(self.id));
        }
    }
}

impl fmt::Debug for EventLoopTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLoopTimer").field("id", &self.id).finish()
    }
}

impl DelayedHostLoop for EventLoop {
    type Timer = EventLoopTimer;

    fn post_after(&self, callback: HostCallback, delay: Duration) -> EventLoopTimer {
        let id = self.next_timer_id.fetch_add(1, Ordering::Relaxed);
        let Some(due) = Instant::now().checked_add(delay) else {
            warn!(timer_id = id, "Timer delay exceeds the clock range; it will never fire");
            return EventLoopTimer { id, tx: None };
        };

        let tx = self.tx.lock().clone();
        self.send(Command::Arm { id, due, callback });
        debug!(timer_id = id, delay_ms = %delay.as_millis(), "Event loop timer armed");
        EventLoopTimer { id, tx }
    }
}

impl fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLoop")
            .field("thread_name", &self.config.thread_name)
            .field("running", &self.is_running())
            .finish()
    }
}

impl Drop for EventLoop {
    fn drop(&mut self) {
        // Signal only; joining here could hang if a callback is stuck.
        if !self.shutdown.swap(true, Ordering::AcqRel) {
            if let Some(tx) = self.tx.lock().take() {
                let _ = tx.send(Command::Shutdown);
            }
            debug!("EventLoop dropped without explicit shutdown - thread will be detached");
        }
    }
}

/// Event loop body. Blocks on the channel until the next timer deadline.
fn run_loop(rx: &Receiver<Command>) {
    debug!("Event loop thread started");
    let mut timers = TimerQueue::default();

    loop {
        let command = match timers.next_due() {
            Some(due) => match rx.recv_deadline(due) {
                Ok(command) => Some(command),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => break,
            },
            None => match rx.recv() {
                Ok(command) => Some(command),
                Err(_) => break,
            },
        };

        match command {
            Some(Command::Post(callback)) => run_callback(callback),
            Some(Command::Arm { id, due, callback }) => timers.arm(id, due, callback),
            Some(Command::Disarm(id)) => {
                if timers.disarm(id).is_some() {
                    debug!(timer_id = id, "Event loop timer disarmed");
                }
            }
            Some(Command::Shutdown) => break,
            None => {}
        }

        let now = Instant::now();
        while let Some(callback) = timers.pop_due(now) {
            run_callback(callback);
        }
    }

    debug!(dropped_timers = timers.len(), "Event loop thread exiting");
}

fn run_callback(callback: HostCallback) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(callback)) {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_owned());
        error!(panic = %message, "Event loop callback panicked");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_loop(name: &str) -> EventLoop {
        EventLoop::new(EventLoopConfig::new().with_thread_name(name)).unwrap()
    }

    #[test]
    fn test_post_runs_on_loop_thread() {
        let host = event_loop("el-test-post");
        let (tx, rx) = crossbeam_channel::bounded(1);

        host.post(Box::new(move || {
            let name = thread::current().name().map(str::to_owned);
            tx.send(name).unwrap();
        }));

        let name = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(name.as_deref(), Some("el-test-post"));
        host.shutdown();
    }

    #[test]
    fn test_timers_fire_in_deadline_order() {
        let host = event_loop("el-test-order");
        let (tx, rx) = crossbeam_channel::unbounded();

        let late_tx = tx.clone();
        let _late = host.post_after(
            Box::new(move || late_tx.send("late").unwrap()),
            Duration::from_millis(60),
        );
        let _early = host.post_after(
            Box::new(move || tx.send("early").unwrap()),
            Duration::from_millis(20),
        );

        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), "early");
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), "late");
        host.shutdown();
    }

    #[test]
    fn test_cancelled_timer_does_not_fire() {
        let host = event_loop("el-test-cancel");
        let (tx, rx) = crossbeam_channel::unbounded();

        let cancelled_tx = tx.clone();
        let timer = host.post_after(
            Box::new(move || cancelled_tx.send("cancelled").unwrap()),
            Duration::from_millis(50),
        );
        timer.cancel();
        let _marker = host.post_after(
            Box::new(move || tx.send("marker").unwrap()),
            Duration::from_millis(100),
        );

        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), "marker");
        assert!(rx.try_recv().is_err());
        host.shutdown();
    }

    #[test]
    fn test_panicking_callback_keeps_loop_alive() {
        let host = event_loop("el-test-panic");
        let (tx, rx) = crossbeam_channel::bounded(1);

        host.post(Box::new(|| panic!("boom")));
        host.post(Box::new(move || tx.send(()).unwrap()));

        assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
        host.shutdown();
    }

    #[test]
    fn test_post_after_shutdown_is_dropped() {
        let host = event_loop("el-test-shutdown");
        host.shutdown();
        host.shutdown();
        assert!(!host.is_running());

        let (tx, rx) = crossbeam_channel::bounded::<()>(1);
        host.post(Box::new(move || tx.send(()).unwrap()));
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    }

    #[test]
    fn test_disarmed_timers_do_not_accumulate() {
        let mut timers = TimerQueue::default();
        let now = Instant::now();
        let soon = now + Duration::from_millis(1);
        let far = now + Duration::from_secs(3_600);
        timers.arm(0, soon, Box::new(|| {}));

        for id in 1..=100_000 {
            timers.arm(id, far, Box::new(|| {}));
            assert!(timers.disarm(id).is_some());
            assert_eq!(timers.next_due(), Some(soon));
        }

        assert_eq!(timers.len(), 1);
        assert!(timers.order.len() <= 2 * timers.len() + COMPACT_SLACK);
        assert!(timers.pop_due(soon).is_some());
        assert_eq!(timers.next_due(), None);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let result = EventLoop::new(EventLoopConfig::new().with_thread_stack_size(0));
        assert!(matches!(result, Err(SchedulerError::InvalidConfig(_))));
    }
}

//! # Prometheus Platform Schedulers
//!
//! Cancellation-safe schedulers that run deferred work on a specific execution
//! context: a GUI main loop, a serial dispatch queue, a run loop, or any
//! equivalent single-threaded runner.
//!
//! Every `schedule` call returns a [`ScheduledHandle`](core::ScheduledHandle)
//! that can be disposed at any point, before, during or after the host fires
//! the work, without double execution, use-after-cancel, or leaked results.
//!
//! ## Core Problem Solved
//!
//! Host loops race against callers:
//!
//! - **Cancel vs. fire**: the host may be about to invoke the callback just as
//!   the caller cancels
//! - **Cancel after run**: the action may already have returned a resource
//!   (a nested schedule, an open stream) that must be released exactly once
//! - **No native timer**: many hosts can only "post now", and their timers
//!   cannot be driven by a test clock
//!
//! ## Key Features
//!
//! - **One protocol, many hosts**: hosts supply only
//!   [`HostLoop::post`](core::HostLoop::post) and optionally
//!   [`DelayedHostLoop::post_after`](core::DelayedHostLoop::post_after)
//! - **Native timers**: [`TimerScheduler`](runtime::TimerScheduler)
//! - **Composed timers**: [`DispatchScheduler`](runtime::DispatchScheduler)
//!   measures delays on a secondary scheduler and hops to the host to run
//! - **Deterministic tests**: [`ManualLoop`](infra::ManualLoop) and
//!   [`VirtualTimeScheduler`](infra::VirtualTimeScheduler)
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use prometheus_platform_schedulers::core::{Phase, Scheduler};
//! use prometheus_platform_schedulers::infra::{ManualLoop, VirtualTimeScheduler};
//! use prometheus_platform_schedulers::runtime::DispatchScheduler;
//!
//! let clock = VirtualTimeScheduler::new(ManualLoop::new());
//! let main_loop = ManualLoop::new();
//! let scheduler = DispatchScheduler::new(main_loop.clone(), clock.clone());
//!
//! let handle = scheduler.schedule_after("foo", Duration::from_secs(1), |_, state| {
//!     assert_eq!(state, "foo");
//! });
//!
//! clock.host().advance_by(Duration::from_secs(1));
//! assert_eq!(main_loop.queue_len(), 1);
//!
//! handle.dispose();
//! main_loop.run_queue();
//! assert_eq!(handle.phase(), Phase::FiredAndDisposed);
//! ```

/// Core scheduling abstractions and the cancellation/disposal protocol.
pub mod core;
/// Configuration models for the event loop time keeper.
pub mod config;
/// Builders to construct schedulers from collaborators.
pub mod builders;
/// Host loops shipped with the crate.
pub mod infra;
/// Scheduler adapters and runtime hosts.
pub mod runtime;
/// Shared utilities.
pub mod util;

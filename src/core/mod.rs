//! Core scheduling abstractions and the cancellation/disposal protocol.

pub mod disposable;
pub mod error;
pub mod handle;
pub mod host;
pub mod scheduler;

pub use disposable::{ActionDisposable, Disposable, ResultHandle};
pub use error::{AppResult, SchedulerError};
pub use handle::{Phase, ScheduledHandle};
pub use host::{DelayedHostLoop, FnLoop, HostCallback, HostLoop, TimerHandle};
pub use scheduler::{post_after, post_now, Scheduler};

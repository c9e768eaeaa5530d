//! Scheduler adapters over host loops, and the tokio host.

pub mod dispatch_scheduler;
pub mod timer_scheduler;
#[cfg(feature = "tokio-runtime")]
pub mod tokio_loop;

pub use dispatch_scheduler::DispatchScheduler;
pub use timer_scheduler::TimerScheduler;
#[cfg(feature = "tokio-runtime")]
pub use tokio_loop::{TokioLoop, TokioTimer};

//! Host loops shipped with the crate: the event loop time keeper and the
//! manually driven virtual-time loop.

#[cfg(not(target_arch = "wasm32"))]
pub mod event_loop;
pub mod manual_loop;

#[cfg(not(target_arch = "wasm32"))]
pub use event_loop::{event_loop_scheduler, EventLoop, EventLoopScheduler, EventLoopTimer};
pub use manual_loop::{ManualLoop, ManualTimer, VirtualTimeScheduler};

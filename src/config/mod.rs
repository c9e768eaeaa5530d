//! Configuration models for the event loop time keeper.

pub mod event_loop;

pub use event_loop::{
    EventLoopConfig, ENV_SHUTDOWN_TIMEOUT_MS, ENV_THREAD_NAME, ENV_THREAD_STACK_SIZE,
};

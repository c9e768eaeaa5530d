//! Shared utilities.

pub mod telemetry;
pub mod time;

pub use telemetry::{init_tracing, DEFAULT_FILTER};
pub use time::{delay_millis, remaining_until};

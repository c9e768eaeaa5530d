//! Builders to construct schedulers from collaborators and configuration.

pub mod scheduler_builder;

#[cfg(not(target_arch = "wasm32"))]
pub use scheduler_builder::EventLoopDispatchBuilder;
pub use scheduler_builder::DispatchSchedulerBuilder;

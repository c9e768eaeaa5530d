//! Error types for scheduler construction.
//!
//! Scheduling and disposal themselves never fail: `schedule` always hands back
//! a handle and `dispose` is total. Errors only arise while wiring schedulers
//! to their collaborators.

use thiserror::Error;

/// Errors produced while building schedulers and their hosts.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A required collaborator was never supplied.
    #[error("missing collaborator: {0}")]
    MissingCollaborator(&'static str),
    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The event loop thread could not be started.
    #[error("failed to spawn event loop thread: {0}")]
    Spawn(#[from] std::io::Error),
    /// No async runtime is available in the current context.
    #[error("no runtime available: {0}")]
    NoRuntime(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;

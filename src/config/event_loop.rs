//! Event loop thread configuration.

use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::AppResult;

/// Environment variable overriding [`EventLoopConfig::thread_name`].
pub const ENV_THREAD_NAME: &str = "PLATFORM_SCHEDULERS_EVENT_LOOP_THREAD_NAME";
/// Environment variable overriding [`EventLoopConfig::thread_stack_size`].
pub const ENV_THREAD_STACK_SIZE: &str = "PLATFORM_SCHEDULERS_EVENT_LOOP_STACK_SIZE";
/// Environment variable overriding [`EventLoopConfig::shutdown_timeout_ms`].
pub const ENV_SHUTDOWN_TIMEOUT_MS: &str = "PLATFORM_SCHEDULERS_EVENT_LOOP_SHUTDOWN_TIMEOUT_MS";

const MIN_STACK_SIZE: usize = 16 * 1024;

/// Settings for the dedicated event loop thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventLoopConfig {
    /// Name given to the OS thread.
    pub thread_name: String,
    /// Stack size of the OS thread in bytes.
    pub thread_stack_size: usize,
    /// How long `shutdown` waits for the thread to exit, in milliseconds.
    pub shutdown_timeout_ms: u64,
}

impl Default for EventLoopConfig {
    fn default() -> Self {
        Self {
            thread_name: "ps-event-loop".into(),
            thread_stack_size: 2 * 1024 * 1024,
            shutdown_timeout_ms: 2_000,
        }
    }
}

impl EventLoopConfig {
    /// Default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the thread name.
    #[must_use]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Set the thread stack size in bytes.
    #[must_use]
    pub const fn with_thread_stack_size(mut self, bytes: usize) -> Self {
        self.thread_stack_size = bytes;
        self
    }

    /// Set the shutdown join timeout.
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Shutdown join timeout as a `Duration`.
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.thread_name.trim().is_empty() {
            return Err("thread_name must not be empty".into());
        }
        if self.thread_name.contains('\0') {
            return Err("thread_name must not contain NUL bytes".into());
        }
        if self.thread_stack_size < MIN_STACK_SIZE {
            return Err(format!("thread_stack_size must be at least {MIN_STACK_SIZE} bytes"));
        }
        if self.shutdown_timeout_ms == 0 {
            return Err("shutdown_timeout_ms must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a description of the parse or validation failure.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from the process environment, loading a `.env`
    /// file first if one exists. Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Fails if a variable is set but unparsable, or the result is invalid.
    pub fn from_env() -> AppResult<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Fails if a variable is set but unparsable, or the result is invalid.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(name) = lookup(ENV_THREAD_NAME) {
            cfg.thread_name = name;
        }
        if let Some(raw) = lookup(ENV_THREAD_STACK_SIZE) {
            cfg.thread_stack_size = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_THREAD_STACK_SIZE}={raw:?} is not a byte count"))?;
        }
        if let Some(raw) = lookup(ENV_SHUTDOWN_TIMEOUT_MS) {
            cfg.shutdown_timeout_ms = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_SHUTDOWN_TIMEOUT_MS}={raw:?} is not milliseconds"))?;
        }
        cfg.validate().map_err(anyhow::Error::msg)?;
        Ok(cfg)
    }
}

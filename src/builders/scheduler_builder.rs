//! Builder for [`DispatchScheduler`] with fail-fast collaborator checks.

use std::fmt;

use tracing::debug;

use crate::core::{HostLoop, Scheduler, SchedulerError};
use crate::runtime::DispatchScheduler;

#[cfg(not(target_arch = "wasm32"))]
use crate::config::EventLoopConfig;
#[cfg(not(target_arch = "wasm32"))]
use crate::infra::EventLoopScheduler;

/// Builder whose secondary scheduler defaults to a dedicated event loop.
#[cfg(not(target_arch = "wasm32"))]
pub type EventLoopDispatchBuilder<H> = DispatchSchedulerBuilder<H, EventLoopScheduler>;

/// Collects the collaborators of a [`DispatchScheduler`].
///
/// Collaborators may arrive as `Option`s from the embedding application; a
/// missing one fails the build instead of surfacing later.
///
/// ```
/// use prometheus_platform_schedulers::builders::DispatchSchedulerBuilder;
/// use prometheus_platform_schedulers::core::SchedulerError;
/// use prometheus_platform_schedulers::infra::{ManualLoop, VirtualTimeScheduler};
///
/// let missing = DispatchSchedulerBuilder::<ManualLoop, VirtualTimeScheduler>::new()
///     .secondary(VirtualTimeScheduler::new(ManualLoop::new()))
///     .build();
/// assert!(matches!(missing, Err(SchedulerError::MissingCollaborator("host loop"))));
/// ```
pub struct DispatchSchedulerBuilder<H, D> {
    host: Option<H>,
    secondary: Option<D>,
    #[cfg(not(target_arch = "wasm32"))]
    event_loop: EventLoopConfig,
}

impl<H: HostLoop, D: Scheduler> DispatchSchedulerBuilder<H, D> {
    /// Empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            host: None,
            secondary: None,
            #[cfg(not(target_arch = "wasm32"))]
            event_loop: EventLoopConfig::default(),
        }
    }

    /// Set the host loop actions run on.
    #[must_use]
    pub fn host(mut self, host: H) -> Self {
        self.host = Some(host);
        self
    }

    /// Set the host loop from an optional value.
    #[must_use]
    pub fn maybe_host(mut self, host: Option<H>) -> Self {
        self.host = host;
        self
    }

    /// Set the scheduler that measures delays.
    #[must_use]
    pub fn secondary(mut self, secondary: D) -> Self {
        self.secondary = Some(secondary);
        self
    }

    /// Set the secondary scheduler from an optional value.
    #[must_use]
    pub fn maybe_secondary(mut self, secondary: Option<D>) -> Self {
        self.secondary = secondary;
        self
    }

    /// Build the scheduler.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::MissingCollaborator` if the host loop or the
    /// secondary scheduler was not supplied.
    pub fn build(self) -> Result<DispatchScheduler<H, D>, SchedulerError> {
        let host = self.host.ok_or(SchedulerError::MissingCollaborator("host loop"))?;
        let secondary = self
            .secondary
            .ok_or(SchedulerError::MissingCollaborator("secondary scheduler"))?;
        debug!(
            host = std::any::type_name::<H>(),
            secondary = std::any::type_name::<D>(),
            "Dispatch scheduler built"
        );
        Ok(DispatchScheduler::new(host, secondary))
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl<H: HostLoop> DispatchSchedulerBuilder<H, EventLoopScheduler> {
    /// Configuration for the event loop spawned when no secondary is set.
    #[must_use]
    pub fn event_loop_config(mut self, config: EventLoopConfig) -> Self {
        self.event_loop = config;
        self
    }

    /// Build the scheduler, spawning an event loop as the secondary scheduler
    /// unless one was supplied.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::MissingCollaborator` without a host loop, and
    /// `SchedulerError::InvalidConfig` or `SchedulerError::Spawn` if the event
    /// loop cannot be started.
    pub fn build_with_event_loop(mut self) -> Result<DispatchScheduler<H, EventLoopScheduler>, SchedulerError> {
        if self.host.is_none() {
            return Err(SchedulerError::MissingCollaborator("host loop"));
        }
        if self.secondary.is_none() {
            let config = std::mem::take(&mut self.event_loop);
            self.secondary = Some(crate::infra::event_loop_scheduler(config)?);
        }
        self.build()
    }
}

impl<H: HostLoop, D: Scheduler> Default for DispatchSchedulerBuilder<H, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H, D> fmt::Debug for DispatchSchedulerBuilder<H, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchSchedulerBuilder")
            .field("host", &self.host.is_some())
            .field("secondary", &self.secondary.is_some())
            .finish_non_exhaustive()
    }
}

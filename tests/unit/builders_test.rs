//! Tests for the dispatch scheduler builder

use prometheus_platform_schedulers::builders::DispatchSchedulerBuilder;
use prometheus_platform_schedulers::core::{Scheduler, SchedulerError};
use prometheus_platform_schedulers::infra::{ManualLoop, VirtualTimeScheduler};

type Builder = DispatchSchedulerBuilder<ManualLoop, VirtualTimeScheduler>;

#[test]
fn test_build_with_all_collaborators() {
    let host = ManualLoop::new();
    let scheduler = Builder::new()
        .host(host.clone())
        .secondary(VirtualTimeScheduler::new(ManualLoop::new()))
        .build()
        .unwrap();

    let _handle = scheduler.schedule((), |_, ()| {});
    assert_eq!(host.queue_len(), 1);
}

#[test]
fn test_missing_secondary_is_reported() {
    let result = Builder::new().host(ManualLoop::new()).build();
    assert!(matches!(
        result,
        Err(SchedulerError::MissingCollaborator("secondary scheduler"))
    ));
}

#[test]
fn test_optional_collaborators() {
    let absent = Builder::default()
        .maybe_host(None)
        .maybe_secondary(Some(VirtualTimeScheduler::new(ManualLoop::new())))
        .build();
    assert!(matches!(
        absent,
        Err(SchedulerError::MissingCollaborator("host loop"))
    ));

    let present = Builder::default()
        .maybe_host(Some(ManualLoop::new()))
        .maybe_secondary(Some(VirtualTimeScheduler::new(ManualLoop::new())))
        .build();
    assert!(present.is_ok());
}

#[test]
fn test_builder_debug_hides_collaborators() {
    let builder = Builder::new().host(ManualLoop::new());
    let debug = format!("{builder:?}");
    assert!(debug.contains("host: true"));
    assert!(debug.contains("secondary: false"));
}

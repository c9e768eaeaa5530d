//! Tests for error types

use prometheus_platform_schedulers::core::{AppResult, SchedulerError};

#[test]
fn test_scheduler_error_display() {
    let err = SchedulerError::MissingCollaborator("host loop");
    assert_eq!(err.to_string(), "missing collaborator: host loop");

    let err = SchedulerError::InvalidConfig("thread_name must not be empty".into());
    assert_eq!(
        err.to_string(),
        "invalid configuration: thread_name must not be empty"
    );

    let err = SchedulerError::NoRuntime("no reactor".into());
    assert_eq!(err.to_string(), "no runtime available: no reactor");
}

#[test]
fn test_io_error_converts_to_spawn() {
    let io = std::io::Error::other("no threads left");
    let err: SchedulerError = io.into();
    assert!(matches!(err, SchedulerError::Spawn(_)));
    assert!(err.to_string().contains("no threads left"));
}

#[test]
fn test_app_result_wraps_scheduler_error() {
    fn build() -> AppResult<()> {
        Err(SchedulerError::MissingCollaborator("secondary scheduler").into())
    }

    let err = build().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SchedulerError>(),
        Some(SchedulerError::MissingCollaborator("secondary scheduler"))
    ));
}

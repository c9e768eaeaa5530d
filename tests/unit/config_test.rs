//! Tests for event loop configuration

use std::collections::HashMap;
use std::time::Duration;

use prometheus_platform_schedulers::config::{
    EventLoopConfig, ENV_SHUTDOWN_TIMEOUT_MS, ENV_THREAD_NAME, ENV_THREAD_STACK_SIZE,
};

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    move |key: &str| vars.get(key).cloned()
}

#[test]
fn test_default_config_is_valid() {
    let config = EventLoopConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.thread_name, "ps-event-loop");
    assert_eq!(config.shutdown_timeout(), Duration::from_secs(2));
}

#[test]
fn test_builder_methods() {
    let config = EventLoopConfig::new()
        .with_thread_name("ui-timers")
        .with_thread_stack_size(64 * 1024)
        .with_shutdown_timeout(Duration::from_millis(250));

    assert_eq!(config.thread_name, "ui-timers");
    assert_eq!(config.thread_stack_size, 64 * 1024);
    assert_eq!(config.shutdown_timeout_ms, 250);
    assert!(config.validate().is_ok());
}

#[test]
fn test_invalid_values_are_rejected() {
    assert!(EventLoopConfig::new().with_thread_name("  ").validate().is_err());
    assert!(EventLoopConfig::new().with_thread_name("a\0b").validate().is_err());
    assert!(EventLoopConfig::new().with_thread_stack_size(1024).validate().is_err());
    assert!(EventLoopConfig::new()
        .with_shutdown_timeout(Duration::ZERO)
        .validate()
        .is_err());
}

#[test]
fn test_from_json_fills_defaults() {
    let config = EventLoopConfig::from_json_str(r#"{"thread_name": "json-loop"}"#).unwrap();
    assert_eq!(config.thread_name, "json-loop");
    assert_eq!(config.thread_stack_size, EventLoopConfig::default().thread_stack_size);

    assert!(EventLoopConfig::from_json_str("{not json").is_err());
    assert!(EventLoopConfig::from_json_str(r#"{"shutdown_timeout_ms": 0}"#).is_err());
}

#[test]
fn test_config_round_trips_through_json() {
    let config = EventLoopConfig::new().with_thread_name("round-trip");
    let json = serde_json::to_string(&config).unwrap();
    assert_eq!(EventLoopConfig::from_json_str(&json).unwrap(), config);
}

#[test]
fn test_from_lookup_overrides_defaults() {
    let config = EventLoopConfig::from_lookup(lookup(&[
        (ENV_THREAD_NAME, "env-loop"),
        (ENV_THREAD_STACK_SIZE, " 131072 "),
        (ENV_SHUTDOWN_TIMEOUT_MS, "500"),
    ]))
    .unwrap();

    assert_eq!(config.thread_name, "env-loop");
    assert_eq!(config.thread_stack_size, 131_072);
    assert_eq!(config.shutdown_timeout(), Duration::from_millis(500));
}

#[test]
fn test_from_lookup_without_variables_uses_defaults() {
    let config = EventLoopConfig::from_lookup(|_| None).unwrap();
    assert_eq!(config, EventLoopConfig::default());
}

#[test]
fn test_from_lookup_reports_bad_values() {
    let err = EventLoopConfig::from_lookup(lookup(&[(ENV_THREAD_STACK_SIZE, "big")])).unwrap_err();
    assert!(err.to_string().contains(ENV_THREAD_STACK_SIZE));

    let err = EventLoopConfig::from_lookup(lookup(&[(ENV_THREAD_STACK_SIZE, "16")])).unwrap_err();
    assert!(err.to_string().contains("thread_stack_size"));
}

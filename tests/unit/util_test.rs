//! Tests for utility functions

use std::time::{Duration, Instant};

use prometheus_platform_schedulers::util::{delay_millis, init_tracing, remaining_until};

#[test]
fn test_delay_millis_never_fires_early() {
    assert_eq!(delay_millis(Duration::from_millis(1)), 1);
    assert_eq!(delay_millis(Duration::from_micros(999)), 1);
    assert_eq!(delay_millis(Duration::from_secs(1)), 1_000);
    assert_eq!(delay_millis(Duration::new(1, 1)), 1_001);
}

#[test]
fn test_remaining_until_past_and_future() {
    let now = Instant::now();
    assert_eq!(remaining_until(now, now + Duration::from_millis(5)), Some(Duration::from_millis(5)));
    assert_eq!(remaining_until(now + Duration::from_millis(5), now), None);
}

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
}

//! Tests for disposable results

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use prometheus_platform_schedulers::core::{ActionDisposable, Disposable, Phase, ResultHandle, ScheduledHandle};

#[test]
fn test_scheduled_handle_as_result() {
    let inner = ScheduledHandle::new();
    let outer: ResultHandle = Box::new(inner.clone());
    outer.dispose();
    assert!(inner.is_disposed());
    assert_eq!(inner.phase(), Phase::Cancelled);
}

#[test]
fn test_action_disposable_chains_to_nested_handle() {
    let count = Arc::new(AtomicUsize::new(0));
    let nested = ScheduledHandle::new();
    let callback = {
        let count = Arc::clone(&count);
        nested.wrap(move || {
            count.fetch_add(1, Ordering::SeqCst);
        })
    };

    let to_nested = nested.clone();
    let chained = ActionDisposable::new(move || to_nested.dispose());
    chained.dispose();
    callback();

    assert!(chained.is_disposed());
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

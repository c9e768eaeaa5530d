//! Disposable resources produced by scheduled actions.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

/// A resource that can be released.
///
/// Scheduled actions return a `Disposable` describing whatever they acquired
/// while running (a nested schedule, an open stream, ...). The scheduling
/// machinery owns it until the outer handle is disposed.
///
/// Implementations must be total: `dispose` never panics and calling it more
/// than once has the same effect as calling it once.
pub trait Disposable {
    /// Release the resource.
    fn dispose(&self);
}

/// Boxed result of a scheduled action, as stored in a handle's slot.
pub type ResultHandle = Box<dyn Disposable + Send>;

/// The empty result: actions with nothing to release return `()`.
impl Disposable for () {
    fn dispose(&self) {}
}

impl<T: Disposable + ?Sized> Disposable for Box<T> {
    fn dispose(&self) {
        (**self).dispose();
    }
}

impl<T: Disposable + ?Sized> Disposable for Arc<T> {
    fn dispose(&self) {
        (**self).dispose();
    }
}

impl<T: Disposable> Disposable for Option<T> {
    fn dispose(&self) {
        if let Some(inner) = self {
            inner.dispose();
        }
    }
}

type DisposeFn = Box<dyn FnOnce() + Send + 'static>;

/// Disposable that runs a closure the first time it is disposed.
///
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use prometheus_platform_schedulers::core::{ActionDisposable, Disposable};
///
/// let count = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&count);
/// let disposable = ActionDisposable::new(move || {
///     counter.fetch_add(1, Ordering::SeqCst);
/// });
///
/// disposable.dispose();
/// disposable.dispose();
/// assert_eq!(count.load(Ordering::SeqCst), 1);
/// ```
pub struct ActionDisposable {
    action: Mutex<Option<DisposeFn>>,
}

impl ActionDisposable {
    /// Wrap `action` so it runs at most once.
    pub fn new<F>(action: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            action: Mutex::new(Some(Box::new(action))),
        }
    }

    /// Whether the closure has already run.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.action.lock().is_none()
    }
}

impl Disposable for ActionDisposable {
    fn dispose(&self) {
        // Take under the lock, run outside it: the closure may dispose other
        // handles that share this one.
        let action = self.action.lock().take();
        if let Some(action) = action {
            action();
        }
    }
}

impl fmt::Debug for ActionDisposable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDisposable")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

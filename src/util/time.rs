//! Time conversions shared by the hosts and schedulers.

use std::time::{Duration, Instant};

/// Whole milliseconds for a host timer, rounded up so a timer never fires
/// before the requested delay. Saturates at `u64::MAX`.
#[must_use]
pub fn delay_millis(delay: Duration) -> u64 {
    let millis = delay.as_millis() + u128::from(delay.subsec_nanos() % 1_000_000 != 0);
    u64::try_from(millis).unwrap_or(u64::MAX)
}

/// Time left from `now` until `due`, or `None` if `due` is not in the future.
#[must_use]
pub fn remaining_until(now: Instant, due: Instant) -> Option<Duration> {
    due.checked_duration_since(now).filter(|left| !left.is_zero())
}

//! Time sources for hopping window counters.
//!
//! Counters never read the platform clock directly. They ask a [`Clock`] for the
//! current instant and for unit-aligned boundaries, so tests can drive elapsed
//! time without sleeping.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[cfg(any(test, feature = "testing"))]
use std::sync::Arc;

#[cfg(any(test, feature = "testing"))]
use parking_lot::Mutex;

use crate::common::duration_from_nanos;

/// A source of "now" for counters.
///
/// Instants are offsets from the clock's epoch. Truncation is relative to the same
/// epoch, which keeps every window boundary aligned to a multiple of the hop unit.
pub trait Clock: Send + Sync {
    /// Current instant, as an offset from the epoch.
    fn now(&self) -> Duration;

    /// Round `instant` down to a multiple of `unit`.
    ///
    /// A zero `unit` returns `instant` unchanged.
    fn truncate(&self, instant: Duration, unit: Duration) -> Duration {
        let unit_nanos = unit.as_nanos();
        if unit_nanos == 0 {
            return instant;
        }

        let nanos = instant.as_nanos();
        duration_from_nanos(nanos - nanos % unit_nanos).unwrap_or(instant)
    }
}

/// Wall clock measured from the UNIX epoch.
///
/// A system clock set before 1970 reads as [`Duration::ZERO`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same underlying time, so a registry and every counter it owns
/// observe the same `advance`.
///
/// # Examples
///
/// ```
/// # #[cfg(feature = "testing")]
/// # {
/// use std::time::Duration;
/// use hops::{HoppingWindowCounter, ManualClock};
///
/// let clock = ManualClock::new(Duration::from_secs(1_000));
/// let counter = HoppingWindowCounter::try_new_with_clock(3, Duration::from_secs(1), clock.clone()).unwrap();
///
/// counter.observe();
/// clock.advance(Duration::from_secs(3));
/// assert_eq!(counter.value(), 0);
/// # }
/// ```
#[cfg(any(test, feature = "testing"))]
#[cfg_attr(docsrs, doc(cfg(feature = "testing")))]
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Arc<Mutex<Duration>>,
}

#[cfg(any(test, feature = "testing"))]
impl ManualClock {
    /// Create a clock reading `start`.
    pub fn new(start: Duration) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Jump to `instant`. Moving backwards is allowed.
    pub fn set(&self, instant: Duration) {
        *self.now.lock() = instant;
    }

    /// Move forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now = now.saturating_add(by);
    }
}

#[cfg(any(test, feature = "testing"))]
impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock()
    }
}

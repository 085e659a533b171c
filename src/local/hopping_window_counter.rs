use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use parking_lot::RwLock;

use crate::{
    Clock, HopUnit, HoppingWindowOptions, HopsError, SystemClock, WindowUnits,
    window::{Window, left_shift_in_place},
};

/// Counts events in a trailing window that moves forward one unit at a time.
///
/// The window is `window_units` consecutive buckets of `unit` each. The newest
/// bucket is still accumulating; the other `window_units - 1` are closed. Memory is
/// fixed at construction and never grows with event volume or elapsed time.
///
/// # Algorithm
///
/// 1. Every operation first realigns the window so its last bucket covers "now"
/// 2. Realigning shifts closed buckets left, moves the current bucket into history
///    and resets it to zero
/// 3. [`observe`](Self::observe) then adds to the current bucket;
///    [`value`](Self::value) sums every bucket
///
/// # Thread Safety
///
/// - The current bucket is an [`AtomicU64`]; recording an event never takes an
///   exclusive lock unless a unit boundary was crossed
/// - Closed buckets and the window start sit behind a [`RwLock`]. Checking whether
///   the window covers "now" takes a shared hold; moving it takes an exclusive hold
///   and re-checks, so only one of several racing callers actually shifts
///
/// # Semantics & Limitations
///
/// **Approximate ordering:**
/// - Operations are not serialized. A [`value`](Self::value) racing with an
///   [`observe`](Self::observe) may or may not include it
/// - Every completed `observe` is counted exactly once until it ages out
///
/// **Hop granularity:**
/// - Events are bucketed per unit. An event ages out of the window as a whole
///   bucket, up to one unit later than a continuous sliding window would drop it
///
/// **Overflow:**
/// - Buckets are `u64` and wrap silently on overflow
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use hops::HoppingWindowCounter;
///
/// // Events in the last 5 minutes.
/// let counter = HoppingWindowCounter::try_new(5, Duration::from_secs(60)).unwrap();
///
/// counter.observe();
/// counter.observe();
/// counter.observe();
///
/// assert_eq!(counter.value(), 3);
/// ```
#[derive(Debug)]
pub struct HoppingWindowCounter<C: Clock = SystemClock> {
    current: AtomicU64,
    window: RwLock<Window>,
    window_size: Duration,
    window_units: usize,
    unit: Duration,
    clock: C,
}

impl HoppingWindowCounter<SystemClock> {
    /// Create a counter driven by the system clock.
    pub fn new(options: HoppingWindowOptions) -> Result<Self, HopsError> {
        Self::with_clock(options, SystemClock)
    }

    /// Create a counter tracking the last `window_units * unit`, driven by the
    /// system clock.
    ///
    /// Fails if `window_units` is 0, `unit` is zero, or their product overflows.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use hops::{HoppingWindowCounter, HopsError};
    ///
    /// assert!(HoppingWindowCounter::try_new(60, Duration::from_secs(1)).is_ok());
    /// assert!(matches!(
    ///     HoppingWindowCounter::try_new(0, Duration::from_secs(1)),
    ///     Err(HopsError::InvalidWindowUnits(_))
    /// ));
    /// ```
    pub fn try_new(window_units: usize, unit: Duration) -> Result<Self, HopsError> {
        Self::try_new_with_clock(window_units, unit, SystemClock)
    }
} // end of impl

impl<C: Clock> HoppingWindowCounter<C> {
    /// Create a counter reading time from `clock`.
    ///
    /// The window is placed so that its last bucket is the unit containing
    /// `clock.now()`. For a 5 minute window created at 15:21:43 the window covers
    /// 15:17:00 up to 15:21:59.
    pub fn with_clock(options: HoppingWindowOptions, clock: C) -> Result<Self, HopsError> {
        let window_size = options.window()?;
        Ok(Self::from_parts(options, window_size, clock))
    }

    /// `window_size` must be `options.window()`.
    pub(crate) fn from_parts(
        options: HoppingWindowOptions,
        window_size: Duration,
        clock: C,
    ) -> Self {
        let unit = *options.unit;
        let start = initial_window_start(&clock, unit, window_size);

        Self {
            current: AtomicU64::new(0),
            window: RwLock::new(Window::new(start, *options.window_units - 1)),
            window_size,
            window_units: *options.window_units,
            unit,
            clock,
        }
    } // end constructor

    /// Like [`try_new`](HoppingWindowCounter::try_new), reading time from `clock`.
    pub fn try_new_with_clock(
        window_units: usize,
        unit: Duration,
        clock: C,
    ) -> Result<Self, HopsError> {
        let options = HoppingWindowOptions {
            window_units: WindowUnits::try_from(window_units)?,
            unit: HopUnit::try_from(unit)?,
        };

        Self::with_clock(options, clock)
    }

    /// Record one event at the current instant.
    ///
    /// Equivalent to `observe_many(1)`.
    pub fn observe(&self) {
        self.observe_many(1);
    } // end method observe

    /// Record `count` events at the current instant.
    ///
    /// # Arguments
    ///
    /// - `count`: Number of events to add to the current bucket (e.g. a batch size)
    ///
    /// # Behavior
    ///
    /// 1. Realign the window to now, closing the current bucket if a unit boundary
    ///    was crossed
    /// 2. Atomically add `count` to the current bucket
    ///
    /// The common case takes only a shared hold to check the window, then a single
    /// atomic add.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use hops::HoppingWindowCounter;
    ///
    /// let counter = HoppingWindowCounter::try_new(10, Duration::from_secs(1)).unwrap();
    ///
    /// // A batch of 25 requests handled together
    /// counter.observe_many(25);
    /// assert_eq!(counter.value(), 25);
    /// ```
    pub fn observe_many(&self, count: u64) {
        self.refresh();
        self.current.fetch_add(count, Ordering::Relaxed);
    } // end method observe_many

    /// Number of events recorded within the window as of now.
    ///
    /// # Returns
    ///
    /// The sum of every closed bucket still in the window plus the current bucket.
    /// Events older than the window are never included. Wraps on overflow.
    ///
    /// # Concurrency
    ///
    /// Not linearizable with concurrent [`observe`](Self::observe) calls: an
    /// `observe` racing with this call may or may not be counted, but is never
    /// counted twice.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use hops::HoppingWindowCounter;
    ///
    /// let counter = HoppingWindowCounter::try_new(5, Duration::from_secs(60)).unwrap();
    /// assert_eq!(counter.value(), 0);
    ///
    /// counter.observe();
    /// assert_eq!(counter.value(), 1);
    /// ```
    pub fn value(&self) -> u64 {
        self.refresh();

        // Read the current bucket under the shared hold so a concurrent move can't
        // show the same events both in history and in the current bucket.
        let window = self.window.read();
        window.sum().wrapping_add(self.current.load(Ordering::Relaxed))
    } // end method value

    /// Per-bucket counts as of now, oldest first, current bucket last.
    ///
    /// # Returns
    ///
    /// A vector exactly `window_units` long. Index 0 is the oldest closed bucket;
    /// the last element is the bucket still accumulating.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use hops::HoppingWindowCounter;
    ///
    /// let counter = HoppingWindowCounter::try_new(3, Duration::from_secs(3_600)).unwrap();
    /// counter.observe_many(2);
    ///
    /// let buckets = counter.buckets();
    /// assert_eq!(buckets.len(), 3);
    /// assert_eq!(buckets.iter().sum::<u64>(), 2);
    /// ```
    pub fn buckets(&self) -> Vec<u64> {
        self.refresh();

        let window = self.window.read();
        let mut buckets = Vec::with_capacity(window.history.len() + 1);
        buckets.extend_from_slice(&window.history);
        buckets.push(self.current.load(Ordering::Relaxed));
        buckets
    } // end method buckets

    /// Forget every recorded event and realign the window to now.
    ///
    /// # Behavior
    ///
    /// Takes the exclusive hold, zeroes history and the current bucket, and places
    /// the window so its last bucket is the current unit, as at construction.
    /// Events recorded concurrently with the reset may survive it.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use hops::HoppingWindowCounter;
    ///
    /// let counter = HoppingWindowCounter::try_new(5, Duration::from_secs(60)).unwrap();
    /// counter.observe_many(3);
    ///
    /// counter.reset();
    /// assert_eq!(counter.value(), 0);
    /// ```
    pub fn reset(&self) {
        let mut window = self.window.write();
        window.history.fill(0);
        window.start = initial_window_start(&self.clock, self.unit, self.window_size);
        self.current.store(0, Ordering::Relaxed);
    } // end method reset

    /// Total duration covered by the window.
    pub fn window(&self) -> Duration {
        self.window_size
    }

    /// Duration of one bucket.
    pub fn unit(&self) -> Duration {
        self.unit
    }

    /// Number of buckets in the window, including the current one.
    pub fn window_units(&self) -> usize {
        self.window_units
    }

    /// Make sure the last bucket of the window covers the current unit.
    fn refresh(&self) {
        let now = self.clock.truncate(self.clock.now(), self.unit);

        let covers_now = {
            let window = self.window.read();
            self.covers(window.start, now)
        };

        if !covers_now {
            self.move_window(now);
        }
    }

    fn covers(&self, start: Duration, instant: Duration) -> bool {
        match instant.checked_sub(start) {
            Some(elapsed) => elapsed < self.window_size,
            None => {
                tracing::trace!(
                    ?start,
                    ?instant,
                    "hops.clock.behind, clock reads earlier than window start"
                );
                true
            }
        }
    }

    /// Move the window so that it ends on the unit containing `instant`, dropping
    /// buckets that fall out of it.
    pub(crate) fn move_window(&self, instant: Duration) {
        // Round up to the next boundary so the window includes `instant`.
        let target = self
            .clock
            .truncate(instant, self.unit)
            .saturating_add(self.unit);

        let mut window = self.window.write();

        // Another caller may have moved it while we waited for the lock.
        let Some(elapsed) = target.checked_sub(window.start) else {
            return;
        };
        if elapsed <= self.window_size {
            return;
        }

        let overshoot = (elapsed - self.window_size).as_nanos() / self.unit.as_nanos();
        let move_distance = usize::try_from(overshoot).unwrap_or(usize::MAX);
        left_shift_in_place(&mut window.history, move_distance);

        let closed = self.current.swap(0, Ordering::Relaxed);
        let closed_pos = window.history.len().checked_sub(move_distance);
        let dropped_current = match closed_pos.and_then(|pos| window.history.get_mut(pos)) {
            Some(slot) => {
                *slot = closed;
                false
            }
            None => true,
        };

        window.start = target - self.window_size;

        tracing::trace!(move_distance, dropped_current, "hops.window.advance");
    } // end method move_window

    #[cfg(test)]
    pub(crate) fn seed(&self, history: &[u64], current: u64) {
        let mut window = self.window.write();
        window.history.copy_from_slice(history);
        self.current.store(current, Ordering::Relaxed);
    }

    #[cfg(test)]
    pub(crate) fn snapshot(&self) -> (Duration, Vec<u64>, u64) {
        let window = self.window.read();
        (
            window.start,
            window.history.to_vec(),
            self.current.load(Ordering::Relaxed),
        )
    }
} // end of impl

fn initial_window_start<C: Clock>(clock: &C, unit: Duration, window_size: Duration) -> Duration {
    clock
        .truncate(clock.now(), unit)
        .saturating_add(unit)
        .saturating_sub(window_size)
}

use std::{ops::Deref, time::Duration};

use crate::HopsError;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Largest bucket count whose `u64` buffer stays within `isize::MAX` bytes.
const MAX_WINDOW_UNITS: usize = isize::MAX as usize / size_of::<u64>();

/// Number of buckets (hops) that make up a window.
///
/// Must be at least 1. A window of one unit keeps no closed history and only
/// counts the bucket currently accumulating.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct WindowUnits(usize);

impl Deref for WindowUnits {
    type Target = usize;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl TryFrom<usize> for WindowUnits {
    type Error = HopsError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        if value == 0 {
            Err(HopsError::InvalidWindowUnits(
                "Window units must be at least 1".to_string(),
            ))
        } else {
            Ok(Self(value))
        }
    }
}

/// Duration of a single hop, which is also the width of one bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct HopUnit(Duration);

impl HopUnit {
    /// Hop of `secs` whole seconds.
    pub fn seconds(secs: u64) -> Result<Self, HopsError> {
        Self::try_from(Duration::from_secs(secs))
    }

    /// Hop of `mins` whole minutes.
    pub fn minutes(mins: u64) -> Result<Self, HopsError> {
        let secs = mins.checked_mul(60).ok_or_else(|| {
            HopsError::InvalidHopUnit("Hop unit in minutes overflows".to_string())
        })?;
        Self::try_from(Duration::from_secs(secs))
    }

    /// Hop of `ms` milliseconds.
    pub fn millis(ms: u64) -> Result<Self, HopsError> {
        Self::try_from(Duration::from_millis(ms))
    }
}

impl Deref for HopUnit {
    type Target = Duration;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl TryFrom<Duration> for HopUnit {
    type Error = HopsError;

    fn try_from(value: Duration) -> Result<Self, Self::Error> {
        if value.is_zero() {
            Err(HopsError::InvalidHopUnit(
                "Hop unit must be greater than 0".to_string(),
            ))
        } else {
            Ok(Self(value))
        }
    }
}

/// Configuration for a [`HoppingWindowCounter`](crate::HoppingWindowCounter).
///
/// The counter tracks the last `window_units * unit` of time and moves forward
/// in steps of `unit`.
///
/// # Examples
///
/// ```
/// use hops::{HopUnit, HoppingWindowOptions, WindowUnits};
///
/// // Events in the last 5 minutes, bucketed per minute.
/// let options = HoppingWindowOptions {
///     window_units: WindowUnits::try_from(5).unwrap(),
///     unit: HopUnit::minutes(1).unwrap(),
/// };
///
/// assert_eq!(options.window().unwrap().as_secs(), 300);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HoppingWindowOptions {
    /// Number of buckets in the window.
    pub window_units: WindowUnits,
    /// Duration of one bucket.
    pub unit: HopUnit,
}

impl HoppingWindowOptions {
    /// Total window duration, `unit * window_units`.
    ///
    /// Fails with [`HopsError::WindowTooLarge`] when the product does not fit in a
    /// [`Duration`], or when `window_units` buckets cannot be allocated at all.
    pub fn window(&self) -> Result<Duration, HopsError> {
        if *self.window_units > MAX_WINDOW_UNITS {
            return Err(HopsError::WindowTooLarge {
                window_units: *self.window_units,
                unit: *self.unit,
            });
        }

        self.unit
            .as_nanos()
            .checked_mul(*self.window_units as u128)
            .and_then(duration_from_nanos)
            .ok_or(HopsError::WindowTooLarge {
                window_units: *self.window_units,
                unit: *self.unit,
            })
    }
}

pub(crate) fn duration_from_nanos(nanos: u128) -> Option<Duration> {
    let secs = u64::try_from(nanos / NANOS_PER_SEC).ok()?;
    Some(Duration::new(secs, (nanos % NANOS_PER_SEC) as u32))
}

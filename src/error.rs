use std::time::Duration;

/// Error type for this crate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HopsError {
    /// The number of buckets in a window was out of range.
    #[error("invalid window units: {0}")]
    InvalidWindowUnits(String),
    /// The hop (bucket) duration was out of range.
    #[error("invalid hop unit: {0}")]
    InvalidHopUnit(String),
    /// `unit * window_units` does not fit in a [`Duration`].
    #[error("window of {window_units} x {unit:?} overflows")]
    WindowTooLarge {
        /// Requested number of buckets.
        window_units: usize,
        /// Requested bucket duration.
        unit: Duration,
    },
}

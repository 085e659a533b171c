use std::time::Duration;

/// Closed buckets of a hopping window and the instant the oldest one starts.
///
/// `history[i]` holds the events that happened `len - i` units before the
/// current bucket, so the oldest bucket is first and the newest closed bucket is
/// last. The slice is boxed so its length is fixed for the counter's lifetime.
#[derive(Debug)]
pub(crate) struct Window {
    pub start: Duration,
    pub history: Box<[u64]>,
}

impl Window {
    pub fn new(start: Duration, closed_buckets: usize) -> Self {
        Self {
            start,
            history: vec![0; closed_buckets].into_boxed_slice(),
        }
    }

    pub fn sum(&self) -> u64 {
        self.history
            .iter()
            .fold(0u64, |acc, count| acc.wrapping_add(*count))
    }
}

/// Shift `buckets` left by `positions`, filling the vacated tail with zeroes.
///
/// ```text
/// [1, 2, 3, 4, 5] << 2  =>  [3, 4, 5, 0, 0]
/// ```
///
/// Shifting by the slice length or more zeroes every bucket.
pub(crate) fn left_shift_in_place(buckets: &mut [u64], positions: usize) {
    if positions == 0 {
        return;
    }

    if positions >= buckets.len() {
        buckets.fill(0);
        return;
    }

    buckets.copy_within(positions.., 0);
    let tail = buckets.len() - positions;
    buckets[tail..].fill(0);
}

use std::time::Duration;

use crate::{Clock, ManualClock, SystemClock};

#[test]
fn truncate_rounds_down_to_unit() {
    let clock = ManualClock::default();
    let instant = Duration::from_millis(1_234_567);

    assert_eq!(
        clock.truncate(instant, Duration::from_secs(1)),
        Duration::from_secs(1_234)
    );
    assert_eq!(
        clock.truncate(instant, Duration::from_millis(250)),
        Duration::from_millis(1_234_500)
    );
    assert_eq!(
        clock.truncate(instant, Duration::from_secs(60)),
        Duration::from_secs(1_200)
    );
}

#[test]
fn truncate_keeps_aligned_instants() {
    let clock = SystemClock;
    let instant = Duration::from_secs(600);

    assert_eq!(clock.truncate(instant, Duration::from_secs(60)), instant);
}

#[test]
fn truncate_with_zero_unit_is_identity() {
    let clock = SystemClock;
    let instant = Duration::from_nanos(123_456_789);

    assert_eq!(clock.truncate(instant, Duration::ZERO), instant);
}

#[test]
fn system_clock_reads_after_epoch() {
    // 2020-01-01T00:00:00Z
    assert!(SystemClock.now() > Duration::from_secs(1_577_836_800));
}

#[test]
fn manual_clock_clones_share_time() {
    let clock = ManualClock::new(Duration::from_secs(10));
    let other = clock.clone();

    clock.advance(Duration::from_secs(5));
    assert_eq!(other.now(), Duration::from_secs(15));

    other.set(Duration::from_secs(3));
    assert_eq!(clock.now(), Duration::from_secs(3));
}

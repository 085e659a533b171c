use std::time::Duration;

use crate::{HopUnit, HoppingWindowCounter, HoppingWindowOptions, HopsError, WindowUnits};

#[test]
fn window_units_try_from_validates_min_1() {
    let w = WindowUnits::try_from(1usize).unwrap();
    assert_eq!(*w, 1);

    assert_eq!(
        WindowUnits::try_from(0usize).unwrap_err(),
        HopsError::InvalidWindowUnits("Window units must be at least 1".to_string())
    );
}

#[test]
fn hop_unit_try_from_validates_nonzero() {
    let u = HopUnit::try_from(Duration::from_millis(1)).unwrap();
    assert_eq!(*u, Duration::from_millis(1));

    assert_eq!(
        HopUnit::try_from(Duration::ZERO).unwrap_err(),
        HopsError::InvalidHopUnit("Hop unit must be greater than 0".to_string())
    );
}

#[test]
fn hop_unit_shortcuts() {
    assert_eq!(*HopUnit::seconds(2).unwrap(), Duration::from_secs(2));
    assert_eq!(*HopUnit::minutes(5).unwrap(), Duration::from_secs(300));
    assert_eq!(*HopUnit::millis(250).unwrap(), Duration::from_millis(250));

    assert!(HopUnit::seconds(0).is_err());
    assert!(HopUnit::minutes(0).is_err());
    assert!(HopUnit::millis(0).is_err());
}

#[test]
fn options_window_is_unit_times_window_units() {
    let options = HoppingWindowOptions {
        window_units: WindowUnits::try_from(5).unwrap(),
        unit: HopUnit::millis(1_500).unwrap(),
    };

    assert_eq!(options.window().unwrap(), Duration::from_millis(7_500));
}

#[test]
fn options_window_rejects_overflow() {
    let options = HoppingWindowOptions {
        window_units: WindowUnits::try_from(usize::MAX).unwrap(),
        unit: HopUnit::try_from(Duration::MAX).unwrap(),
    };

    assert_eq!(
        options.window().unwrap_err(),
        HopsError::WindowTooLarge {
            window_units: usize::MAX,
            unit: Duration::MAX,
        }
    );
}

#[test]
fn options_window_rejects_unallocatable_bucket_count() {
    let options = HoppingWindowOptions {
        window_units: WindowUnits::try_from(usize::MAX).unwrap(),
        unit: HopUnit::try_from(Duration::from_nanos(1)).unwrap(),
    };

    assert_eq!(
        options.window().unwrap_err(),
        HopsError::WindowTooLarge {
            window_units: usize::MAX,
            unit: Duration::from_nanos(1),
        }
    );
}

#[test]
fn try_new_with_huge_window_units_returns_error() {
    let result = std::panic::catch_unwind(|| {
        HoppingWindowCounter::try_new(usize::MAX, Duration::from_nanos(1)).map(|_| ())
    });

    assert!(matches!(
        result,
        Ok(Err(HopsError::WindowTooLarge { .. }))
    ));
}

#[test]
fn hop_unit_minutes_rejects_overflow() {
    assert!(matches!(
        HopUnit::minutes(u64::MAX),
        Err(HopsError::InvalidHopUnit(_))
    ));
    assert_eq!(
        *HopUnit::minutes(u64::MAX / 60).unwrap(),
        Duration::from_secs(u64::MAX / 60 * 60)
    );
}

#[test]
fn try_new_rejects_invalid_configuration() {
    assert!(matches!(
        HoppingWindowCounter::try_new(0, Duration::from_secs(1)),
        Err(HopsError::InvalidWindowUnits(_))
    ));
    assert!(matches!(
        HoppingWindowCounter::try_new(5, Duration::ZERO),
        Err(HopsError::InvalidHopUnit(_))
    ));
    assert!(matches!(
        HoppingWindowCounter::try_new(2, Duration::MAX),
        Err(HopsError::WindowTooLarge { .. })
    ));
}

#[test]
fn error_messages_are_readable() {
    let err = WindowUnits::try_from(0usize).unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid window units: Window units must be at least 1"
    );
}

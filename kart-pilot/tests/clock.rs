use kart_pilot::drive::{Clock, ManualClock};
use std::time::Duration;

#[test]
fn manual_clock_is_shared_between_clones() {
    let clock = ManualClock::starting_at(Duration::from_secs(3));
    let view = clock.clone();

    clock.advance(Duration::from_millis(1500));
    assert_eq!(view.now(), Duration::from_millis(4500));

    view.set(Duration::ZERO);
    assert_eq!(clock.now(), Duration::ZERO);
}

#[test]
fn manual_clock_saturates_instead_of_wrapping() {
    let ceiling = Duration::from_nanos(u64::MAX);

    let clock = ManualClock::starting_at(Duration::MAX);
    assert_eq!(clock.now(), ceiling);

    let clock = ManualClock::starting_at(Duration::from_nanos(u64::MAX - 10));
    clock.advance(Duration::from_secs(1));
    assert_eq!(clock.now(), ceiling);

    clock.advance(Duration::MAX);
    assert_eq!(clock.now(), ceiling);
}

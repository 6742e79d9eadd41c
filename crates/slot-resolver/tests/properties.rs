//! Property tests for slot resolution.

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use slot_resolver::{compute_slots_on, weekday_index, AvailabilityWindow, SlotFilter};

fn arb_window() -> impl Strategy<Value = AvailabilityWindow> {
    (0u8..7, 0u32..1439, 1u32..600).prop_map(|(day, start, len)| {
        let end = (start + len).min(1439).max(start + 1);
        AvailabilityWindow::new(
            day,
            chrono::NaiveTime::from_hms_opt(start / 60, start % 60, 0).unwrap(),
            chrono::NaiveTime::from_hms_opt(end / 60, end % 60, 0).unwrap(),
        )
        .unwrap()
    })
}

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (0i64..3650).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(offset)
    })
}

fn minutes(t: chrono::NaiveTime) -> i64 {
    use chrono::Timelike;
    i64::from(t.hour() * 60 + t.minute())
}

proptest! {
    #[test]
    fn no_matching_weekday_means_no_slots(
        windows in prop::collection::vec(arb_window(), 0..8),
        date in arb_date(),
        duration in 1i64..240,
    ) {
        let day = weekday_index(date);
        let others: Vec<_> = windows.into_iter().filter(|w| w.day_of_week() != day).collect();
        let slots = compute_slots_on(&others, date, duration, &[] as &[&str], SlotFilter::All).unwrap();
        prop_assert!(slots.is_empty());
    }

    #[test]
    fn every_slot_fits_inside_a_producing_window(
        windows in prop::collection::vec(arb_window(), 0..8),
        date in arb_date(),
        duration in 1i64..240,
    ) {
        let slots = compute_slots_on(&windows, date, duration, &[] as &[&str], SlotFilter::All).unwrap();
        for slot in &slots {
            let start = minutes(slot.time);
            let fits = windows.iter().any(|w| {
                w.applies_to(date)
                    && (start - w.start_minutes()) % duration == 0
                    && start >= w.start_minutes()
                    && start + duration <= w.end_minutes()
            });
            prop_assert!(fits, "slot {} fits no window", slot.label());
        }
    }

    #[test]
    fn output_is_strictly_ascending(
        windows in prop::collection::vec(arb_window(), 0..8),
        date in arb_date(),
        duration in 1i64..240,
    ) {
        let slots = compute_slots_on(&windows, date, duration, &[] as &[&str], SlotFilter::All).unwrap();
        for pair in slots.windows(2) {
            prop_assert!(pair[0].time < pair[1].time);
        }
    }

    #[test]
    fn resolution_is_idempotent(
        windows in prop::collection::vec(arb_window(), 0..8),
        date in arb_date(),
        duration in 1i64..240,
        booked in prop::collection::vec("[0-2][0-9]:[0-5][0-9]", 0..5),
    ) {
        let first = compute_slots_on(&windows, date, duration, &booked, SlotFilter::All).unwrap();
        let second = compute_slots_on(&windows, date, duration, &booked, SlotFilter::All).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn open_only_is_the_available_subset_of_all(
        windows in prop::collection::vec(arb_window(), 0..8),
        date in arb_date(),
        duration in 1i64..240,
        booked in prop::collection::vec("[0-2][0-9]:[0-5][0-9]", 0..5),
    ) {
        let all = compute_slots_on(&windows, date, duration, &booked, SlotFilter::All).unwrap();
        let open = compute_slots_on(&windows, date, duration, &booked, SlotFilter::OpenOnly).unwrap();
        let expected: Vec<_> = all.into_iter().filter(|s| s.available).collect();
        prop_assert_eq!(open, expected);
    }

    #[test]
    fn non_positive_duration_always_fails(
        windows in prop::collection::vec(arb_window(), 0..4),
        date in arb_date(),
        duration in i64::MIN..=0,
    ) {
        let result = compute_slots_on(&windows, date, duration, &[] as &[&str], SlotFilter::All);
        prop_assert!(result.is_err());
    }
}

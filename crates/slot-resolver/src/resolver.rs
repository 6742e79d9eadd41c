//! Availability resolution: recurring weekly windows to bookable start times.
//!
//! Given a tutor's weekly windows, one calendar date, a slot length, and the
//! start times already booked on that date, produce the de-duplicated,
//! chronologically ordered list of candidate session start times.
//!
//! Everything here is a pure function of its inputs. There is no clock access
//! and no shared state, so the functions are safe to call from any number of
//! concurrent requests.
//!
//! # Slicing rule
//!
//! A window `[start, end)` yields start times `start`, `start + d`,
//! `start + 2d`, ... for as long as `candidate + d <= end`. A slot must fit
//! entirely inside the window that produced it; there is no partial trailing
//! slot.
//!
//! # Booked times
//!
//! A candidate is unavailable when its start time equals a booked start time.
//! Booked entries that cannot be parsed as a time of day are skipped, and a
//! booked time that does not sit on the slot grid (for example `09:15` with
//! hourly slots) matches nothing.

use std::collections::{BTreeSet, HashSet};

use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, trace};

use crate::error::{Result, SlotError};
use crate::window::{
    minutes_since_midnight, parse_date, parse_time_of_day, time_from_minutes,
    weekday_index, AvailabilityWindow, SlotFilter, TimeSlot,
};

/// Compute the slots for `date`, given as a string.
///
/// # Arguments
///
/// * `windows` — The tutor's weekly windows, across all weekdays
/// * `date` — `YYYY-MM-DD` (or RFC 3339); only its weekday is used
/// * `slot_duration_minutes` — Slot length, must be positive
/// * `booked_times` — Start times already taken on `date`
/// * `filter` — Whether to keep booked slots in the result
///
/// # Errors
///
/// Returns [`SlotError::InvalidDate`] if `date` is empty or unparseable, or
/// [`SlotError::InvalidDuration`] if `slot_duration_minutes <= 0`.
///
/// # Examples
///
/// ```
/// use slot_resolver::{compute_slots, AvailabilityWindow, SlotFilter};
///
/// let windows = vec![AvailabilityWindow::parse(3, "14:00", "16:00").unwrap()];
/// // 2026-03-18 is a Wednesday
/// let slots = compute_slots(&windows, "2026-03-18", 60, &[] as &[&str], SlotFilter::OpenOnly).unwrap();
/// let labels: Vec<String> = slots.iter().map(|s| s.label()).collect();
/// assert_eq!(labels, ["14:00", "15:00"]);
/// ```
pub fn compute_slots<S: AsRef<str>>(
    windows: &[AvailabilityWindow],
    date: &str,
    slot_duration_minutes: i64,
    booked_times: &[S],
    filter: SlotFilter,
) -> Result<Vec<TimeSlot>> {
    let date = parse_date(date)?;
    compute_slots_on(windows, date, slot_duration_minutes, booked_times, filter)
}

/// Compute the slots for an already-parsed `date`.
///
/// Same contract as [`compute_slots`] without the date parsing step.
pub fn compute_slots_on<S: AsRef<str>>(
    windows: &[AvailabilityWindow],
    date: NaiveDate,
    slot_duration_minutes: i64,
    booked_times: &[S],
    filter: SlotFilter,
) -> Result<Vec<TimeSlot>> {
    let step = validate_duration(slot_duration_minutes)?;
    let weekday = weekday_index(date);

    let mut starts = BTreeSet::new();
    let mut matching = 0usize;
    for window in windows.iter().filter(|w| w.day_of_week() == weekday) {
        matching += 1;
        let before = starts.len();
        let end = window.end_minutes();
        let mut candidate = window.start_minutes();
        while candidate.saturating_add(step) <= end {
            starts.insert(candidate);
            candidate += step;
        }
        trace!(%window, added = starts.len() - before, "sliced window");
    }

    let booked = booked_minutes(booked_times);
    let slots: Vec<TimeSlot> = starts
        .into_iter()
        .filter_map(|minutes| {
            time_from_minutes(minutes).map(|time| TimeSlot {
                time,
                available: !booked.contains(&minutes),
            })
        })
        .filter(|slot| filter.keeps(slot))
        .collect();

    debug!(
        %date,
        weekday,
        windows = matching,
        duration = step,
        slots = slots.len(),
        "resolved slots"
    );
    Ok(slots)
}

/// Open slots for `date` rendered as `HH:MM` strings, ready for use as option
/// values in a booking form.
pub fn open_slot_times<S: AsRef<str>>(
    windows: &[AvailabilityWindow],
    date: &str,
    slot_duration_minutes: i64,
    booked_times: &[S],
) -> Result<Vec<String>> {
    let slots = compute_slots(
        windows,
        date,
        slot_duration_minutes,
        booked_times,
        SlotFilter::OpenOnly,
    )?;
    Ok(slots.iter().map(TimeSlot::label).collect())
}

/// Check a slot length, returning it unchanged when positive.
///
/// # Errors
///
/// Returns [`SlotError::InvalidDuration`] for zero or negative lengths.
pub fn validate_duration(minutes: i64) -> Result<i64> {
    if minutes <= 0 {
        return Err(SlotError::InvalidDuration(format!(
            "slot duration must be a positive number of minutes, got {minutes}"
        )));
    }
    Ok(minutes)
}

/// Parse booked start times into minutes since midnight, skipping entries
/// that are not a time of day.
fn booked_minutes<S: AsRef<str>>(booked_times: &[S]) -> HashSet<i64> {
    booked_times
        .iter()
        .filter_map(|raw| match parse_time_of_day(raw.as_ref()) {
            Ok(time) => Some(minutes_since_midnight(time)),
            Err(e) => {
                debug!(booked = raw.as_ref(), error = %e, "ignoring malformed booked time");
                None
            }
        })
        .collect()
}

pub(crate) fn find_slot(slots: &[TimeSlot], time: NaiveTime) -> Option<&TimeSlot> {
    slots.iter().find(|slot| slot.time == time)
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const NONE: &[&str] = &[];

    fn window(day: u8, start: &str, end: &str) -> AvailabilityWindow {
        AvailabilityWindow::parse(day, start, end).unwrap()
    }

    fn labels(slots: &[TimeSlot]) -> Vec<String> {
        slots.iter().map(TimeSlot::label).collect()
    }

    // 2026-03-18 is a Wednesday (3), 2026-03-16 a Monday (1).
    const WEDNESDAY: &str = "2026-03-18";
    const MONDAY: &str = "2026-03-16";

    #[test]
    fn test_wednesday_afternoon_scenario() {
        let windows = vec![window(3, "14:00", "16:00")];
        let slots = compute_slots(&windows, WEDNESDAY, 60, NONE, SlotFilter::OpenOnly).unwrap();
        assert_eq!(labels(&slots), ["14:00", "15:00"]);
        assert!(slots.iter().all(|s| s.available));
    }

    #[test]
    fn test_no_window_on_weekday_is_empty_not_error() {
        let windows = vec![window(3, "14:00", "16:00")];
        let slots = compute_slots(&windows, MONDAY, 60, NONE, SlotFilter::All).unwrap();
        assert!(slots.is_empty());
    }

    #[test]
    fn test_empty_windows() {
        let slots = compute_slots(&[], WEDNESDAY, 60, NONE, SlotFilter::All).unwrap();
        assert!(slots.is_empty());
    }

    #[test]
    fn test_exact_fit_boundary() {
        let windows = vec![window(3, "09:00", "10:00")];
        let hourly = compute_slots(&windows, WEDNESDAY, 60, NONE, SlotFilter::All).unwrap();
        assert_eq!(labels(&hourly), ["09:00"]);

        let half_hourly = compute_slots(&windows, WEDNESDAY, 30, NONE, SlotFilter::All).unwrap();
        assert_eq!(labels(&half_hourly), ["09:00", "09:30"]);
    }

    #[test]
    fn test_no_partial_trailing_slot() {
        let windows = vec![window(3, "09:00", "11:30")];
        let slots = compute_slots(&windows, WEDNESDAY, 60, NONE, SlotFilter::All).unwrap();
        assert_eq!(labels(&slots), ["09:00", "10:00"]);
    }

    #[test]
    fn test_window_shorter_than_duration_contributes_nothing() {
        let windows = vec![window(3, "09:00", "09:45"), window(3, "13:00", "14:00")];
        let slots = compute_slots(&windows, WEDNESDAY, 60, NONE, SlotFilter::All).unwrap();
        assert_eq!(labels(&slots), ["13:00"]);
    }

    #[test]
    fn test_overlapping_windows_deduplicate_and_sort() {
        let windows = vec![
            window(3, "09:30", "10:30"),
            window(3, "09:00", "10:00"),
            window(3, "09:00", "11:00"),
        ];
        let slots = compute_slots(&windows, WEDNESDAY, 60, NONE, SlotFilter::OpenOnly).unwrap();
        assert_eq!(labels(&slots), ["09:00", "09:30", "10:00"]);
    }

    #[test]
    fn test_booked_slot_filtered_and_unfiltered() {
        let windows = vec![window(3, "09:00", "11:00")];
        let booked = ["10:00"];

        let open = compute_slots(&windows, WEDNESDAY, 60, &booked, SlotFilter::OpenOnly).unwrap();
        assert_eq!(labels(&open), ["09:00"]);

        let all = compute_slots(&windows, WEDNESDAY, 60, &booked, SlotFilter::All).unwrap();
        assert_eq!(labels(&all), ["09:00", "10:00"]);
        assert!(all[0].available);
        assert!(!all[1].available);
    }

    #[test]
    fn test_booked_with_seconds_still_matches() {
        let windows = vec![window(3, "09:00", "11:00")];
        let booked = vec!["10:00:00".to_string()];
        let open = compute_slots(&windows, WEDNESDAY, 60, &booked, SlotFilter::OpenOnly).unwrap();
        assert_eq!(labels(&open), ["09:00"]);
    }

    #[test]
    fn test_malformed_booked_entries_are_ignored() {
        let windows = vec![window(3, "09:00", "11:00")];
        let booked = ["", "ten o'clock", "99:99", "10:00"];
        let all = compute_slots(&windows, WEDNESDAY, 60, &booked, SlotFilter::All).unwrap();
        assert_eq!(labels(&all), ["09:00", "10:00"]);
        assert!(all[0].available);
        assert!(!all[1].available);
    }

    #[test]
    fn test_off_grid_booking_matches_nothing() {
        let windows = vec![window(3, "09:00", "11:00")];
        let all = compute_slots(&windows, WEDNESDAY, 60, &["09:15"], SlotFilter::All).unwrap();
        assert!(all.iter().all(|s| s.available));
    }

    #[test]
    fn test_zero_and_negative_duration_rejected() {
        let windows = vec![window(3, "09:00", "11:00")];
        for bad in [0, -30] {
            let err = compute_slots(&windows, WEDNESDAY, bad, NONE, SlotFilter::All).unwrap_err();
            assert!(matches!(err, SlotError::InvalidDuration(_)), "got: {err}");
        }
    }

    #[test]
    fn test_unparseable_date_rejected() {
        let windows = vec![window(3, "09:00", "11:00")];
        let err = compute_slots(&windows, "18/03/2026", 60, NONE, SlotFilter::All).unwrap_err();
        assert!(matches!(err, SlotError::InvalidDate(_)), "got: {err}");
        let err = compute_slots(&windows, "", 60, NONE, SlotFilter::All).unwrap_err();
        assert!(matches!(err, SlotError::InvalidDate(_)), "got: {err}");
    }

    #[test]
    fn test_huge_duration_yields_nothing() {
        let windows = vec![window(3, "00:00", "23:59")];
        let slots = compute_slots(&windows, WEDNESDAY, i64::MAX, NONE, SlotFilter::All).unwrap();
        assert!(slots.is_empty());
    }

    #[test]
    fn test_open_slot_times_strings() {
        let windows = vec![window(3, "14:00", "16:00")];
        let times = open_slot_times(&windows, WEDNESDAY, 30, &["14:30"]).unwrap();
        assert_eq!(times, ["14:00", "15:00", "15:30"]);
    }

    #[test]
    fn test_compute_slots_on_typed_date() {
        let windows = vec![window(0, "10:00", "12:00")];
        let sunday = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        let slots = compute_slots_on(&windows, sunday, 60, NONE, SlotFilter::All).unwrap();
        assert_eq!(labels(&slots), ["10:00", "11:00"]);
    }
}

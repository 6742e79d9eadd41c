//! Caller-side booking checks layered on top of the resolver.
//!
//! The resolver does not care whether a date is in the past or too far
//! ahead, and it never decides whether a particular request can be booked.
//! Those are booking-client policies; they live here as pure functions so a
//! caller can apply them before submitting anything to the backend.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SlotError};
use crate::resolver::{compute_slots_on, find_slot, validate_duration};
use crate::window::{
    format_time, hhmm, parse_date, parse_time_of_day, AvailabilityWindow, SlotFilter,
};

/// How far ahead sessions may be booked unless configured otherwise.
pub const DEFAULT_HORIZON_DAYS: u32 = 60;

// ── BookingPolicy ───────────────────────────────────────────────────────────

/// Which calendar dates a caller lets users book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingPolicy {
    /// Latest bookable date, in days after today.
    pub horizon_days: u32,
    /// Whether today itself may be booked.
    pub allow_same_day: bool,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            horizon_days: DEFAULT_HORIZON_DAYS,
            allow_same_day: true,
        }
    }
}

impl BookingPolicy {
    /// The last date this policy accepts, or `None` past the end of the calendar.
    pub fn latest_date(&self, today: NaiveDate) -> Option<NaiveDate> {
        today.checked_add_days(Days::new(u64::from(self.horizon_days)))
    }

    /// Check that `date` is bookable relative to `today`.
    ///
    /// # Errors
    ///
    /// Returns [`SlotError::OutOfRange`] for past dates, for today when
    /// same-day booking is off, and for dates beyond the horizon.
    pub fn check_date(&self, date: NaiveDate, today: NaiveDate) -> Result<()> {
        if date < today {
            return Err(SlotError::OutOfRange(format!("{date} is in the past")));
        }
        if date == today && !self.allow_same_day {
            return Err(SlotError::OutOfRange(
                "same-day bookings are not allowed".to_string(),
            ));
        }
        if let Some(latest) = self.latest_date(today) {
            if date > latest {
                return Err(SlotError::OutOfRange(format!(
                    "{date} is more than {} days ahead (latest {latest})",
                    self.horizon_days
                )));
            }
        }
        Ok(())
    }
}

/// The calendar date `now` falls on in an IANA timezone.
///
/// # Errors
///
/// Returns [`SlotError::InvalidTimezone`] if the name is not a known zone.
pub fn today_in(timezone: &str, now: DateTime<Utc>) -> Result<NaiveDate> {
    let tz = timezone
        .parse::<Tz>()
        .map_err(|_| SlotError::InvalidTimezone(format!("'{}'", timezone)))?;
    Ok(now.with_timezone(&tz).date_naive())
}

// ── BookingRequest ──────────────────────────────────────────────────────────

/// A request to book one session, shaped like the session-creation body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tutor_id: Option<u64>,
    #[serde(rename = "scheduled_date")]
    pub date: NaiveDate,
    #[serde(rename = "scheduled_time", with = "hhmm")]
    pub time: NaiveTime,
    #[serde(rename = "duration")]
    pub duration_minutes: i64,
}

impl BookingRequest {
    /// Build a request from its string parts.
    ///
    /// # Errors
    ///
    /// Returns [`SlotError::InvalidDate`], [`SlotError::InvalidTime`], or
    /// [`SlotError::InvalidDuration`] for the first part that does not parse.
    pub fn parse(date: &str, time: &str, duration_minutes: i64) -> Result<Self> {
        Ok(Self {
            tutor_id: None,
            date: parse_date(date)?,
            time: parse_time_of_day(time)?,
            duration_minutes: validate_duration(duration_minutes)?,
        })
    }

    pub fn with_tutor(mut self, tutor_id: u64) -> Self {
        self.tutor_id = Some(tutor_id);
        self
    }
}

/// Check that `request` lands on an open slot.
///
/// The request's duration doubles as the slot length: the time must be one
/// of the start times the resolver produces for that duration.
///
/// # Errors
///
/// Returns [`SlotError::Unavailable`] if the tutor has no slot at that time,
/// or [`SlotError::Conflict`] if the slot is already booked.
pub fn check_booking<S: AsRef<str>>(
    windows: &[AvailabilityWindow],
    request: &BookingRequest,
    booked_times: &[S],
) -> Result<()> {
    let slots = compute_slots_on(
        windows,
        request.date,
        request.duration_minutes,
        booked_times,
        SlotFilter::All,
    )?;
    let time = format_time(request.time);
    match find_slot(&slots, request.time) {
        None => {
            debug!(date = %request.date, %time, "no slot at requested time");
            Err(SlotError::Unavailable(format!(
                "tutor is not available at {time} on {}",
                request.date
            )))
        }
        Some(slot) if !slot.available => Err(SlotError::Conflict(format!(
            "time slot {time} on {} is already booked",
            request.date
        ))),
        Some(_) => Ok(()),
    }
}

/// Check moving the session booked as `current` to `request`.
///
/// The session's own slot does not count as a conflict when it stays on the
/// same date, but asking for exactly the slot it already has does.
///
/// # Errors
///
/// Same as [`check_booking`], plus [`SlotError::Conflict`] when `request`
/// names the current slot.
pub fn check_reschedule<S: AsRef<str>>(
    windows: &[AvailabilityWindow],
    current: &BookingRequest,
    request: &BookingRequest,
    booked_times: &[S],
) -> Result<()> {
    if current.date == request.date && current.time == request.time {
        return Err(SlotError::Conflict(format!(
            "session is already scheduled at {} on {}",
            format_time(request.time),
            request.date
        )));
    }
    if current.date != request.date {
        return check_booking(windows, request, booked_times);
    }

    let others: Vec<&str> = booked_times
        .iter()
        .map(|raw| raw.as_ref())
        .filter(|raw| parse_time_of_day(raw).map_or(true, |t| t != current.time))
        .collect();
    check_booking(windows, request, &others)
}

// ── Tests ───────────────────────────────────────────────────────────────────

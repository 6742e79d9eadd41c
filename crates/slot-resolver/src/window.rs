//! Weekly availability windows, booked sessions, and the time-of-day values
//! the resolver works with.
//!
//! Times of day are minute-granular and travel as `HH:MM` strings. Input also
//! accepts `HH:MM:SS` as long as the seconds are zero, since SQL backends
//! commonly store times that way.

use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Result, SlotError};

/// Slot length used when the caller does not configure one.
pub const DEFAULT_SLOT_MINUTES: i64 = 60;

const MINUTES_PER_DAY: i64 = 24 * 60;

const DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

// ── AvailabilityWindow ──────────────────────────────────────────────────────

/// A recurring weekly interval during which a tutor accepts bookings.
///
/// `day_of_week` uses Sunday = 0 through Saturday = 6. The window never wraps
/// past midnight: start is strictly before end. The end bound may be `24:00`
/// for a window that runs to the end of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "WindowRecord", into = "WindowRecord")]
pub struct AvailabilityWindow {
    day_of_week: u8,
    start_time: NaiveTime,
    // 1..=1440, so midnight at the end of the day is representable
    end_minutes: i64,
}

impl AvailabilityWindow {
    /// Build a window, validating the weekday and the ordering of its bounds.
    ///
    /// # Errors
    ///
    /// Returns [`SlotError::InvalidWindow`] if `day_of_week > 6` or
    /// `start_time >= end_time`.
    pub fn new(day_of_week: u8, start_time: NaiveTime, end_time: NaiveTime) -> Result<Self> {
        let end_minutes = minutes_since_midnight(truncate_to_minute(end_time));
        Self::with_end_minutes(day_of_week, truncate_to_minute(start_time), end_minutes)
    }

    /// Build a window that runs from `start_time` to the end of the day.
    pub fn until_midnight(day_of_week: u8, start_time: NaiveTime) -> Result<Self> {
        Self::with_end_minutes(day_of_week, truncate_to_minute(start_time), MINUTES_PER_DAY)
    }

    /// Parse a window from `HH:MM` bound strings. The end bound also accepts
    /// `24:00`.
    pub fn parse(day_of_week: u8, start_time: &str, end_time: &str) -> Result<Self> {
        let start = parse_time_of_day(start_time)
            .map_err(|e| SlotError::InvalidWindow(format!("start_time: {e}")))?;
        let end_minutes = parse_end_bound(end_time)
            .map_err(|e| SlotError::InvalidWindow(format!("end_time: {e}")))?;
        Self::with_end_minutes(day_of_week, start, end_minutes)
    }

    fn with_end_minutes(day_of_week: u8, start_time: NaiveTime, end_minutes: i64) -> Result<Self> {
        if day_of_week > 6 {
            return Err(SlotError::InvalidWindow(format!(
                "day_of_week must be 0-6, got {day_of_week}"
            )));
        }
        if minutes_since_midnight(start_time) >= end_minutes {
            return Err(SlotError::InvalidWindow(format!(
                "start {} is not before end {}",
                format_time(start_time),
                format_minutes(end_minutes)
            )));
        }
        Ok(Self {
            day_of_week,
            start_time,
            end_minutes,
        })
    }

    pub fn day_of_week(&self) -> u8 {
        self.day_of_week
    }

    pub fn start_time(&self) -> NaiveTime {
        self.start_time
    }

    /// The end bound as a time of day, or `None` when the window runs to
    /// midnight (`24:00`).
    pub fn end_time(&self) -> Option<NaiveTime> {
        time_from_minutes(self.end_minutes)
    }

    /// Whether the window recurs on the weekday of `date`.
    pub fn applies_to(&self, date: NaiveDate) -> bool {
        self.day_of_week == weekday_index(date)
    }

    /// Start bound in minutes since midnight.
    pub fn start_minutes(&self) -> i64 {
        minutes_since_midnight(self.start_time)
    }

    /// End bound in minutes since midnight, `1440` for `24:00`.
    pub fn end_minutes(&self) -> i64 {
        self.end_minutes
    }
}

impl fmt::Display for AvailabilityWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}-{}",
            DAY_NAMES[usize::from(self.day_of_week)],
            format_time(self.start_time),
            format_minutes(self.end_minutes)
        )
    }
}

/// Wire shape of a window as the backend returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowRecord {
    pub day_of_week: u8,
    pub start_time: String,
    pub end_time: String,
    #[serde(default = "default_true", deserialize_with = "availability_flag")]
    pub is_available: bool,
}

fn default_true() -> bool {
    true
}

/// SQLite rows carry `is_available` as `0`/`1`; JSON clients send booleans.
fn availability_flag<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(n) => n != 0,
    })
}

impl TryFrom<WindowRecord> for AvailabilityWindow {
    type Error = SlotError;

    fn try_from(record: WindowRecord) -> Result<Self> {
        if !record.is_available {
            return Err(SlotError::InvalidWindow(format!(
                "window is disabled (day {} {}-{})",
                record.day_of_week, record.start_time, record.end_time
            )));
        }
        AvailabilityWindow::parse(record.day_of_week, &record.start_time, &record.end_time)
    }
}

impl From<AvailabilityWindow> for WindowRecord {
    fn from(window: AvailabilityWindow) -> Self {
        WindowRecord {
            day_of_week: window.day_of_week,
            start_time: format_time(window.start_time),
            end_time: format_minutes(window.end_minutes),
            is_available: true,
        }
    }
}

// ── BookedSession ───────────────────────────────────────────────────────────

/// A session already reserved on the date being queried.
///
/// Booked data comes from a separate source and a malformed record must not
/// block the rest of the day: `scheduled_time` stays a raw string, and a
/// field of the wrong JSON type (`null`, a number, ...) deserializes as `None`
/// instead of failing the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookedSession {
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub scheduled_time: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration: Option<i64>,
}

impl BookedSession {
    pub fn at(scheduled_time: impl Into<String>) -> Self {
        Self {
            scheduled_time: Some(scheduled_time.into()),
            duration: None,
        }
    }
}

/// `Some(value)` when the field has the expected type, `None` for anything else.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient<T> {
        Value(T),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Lenient::<T>::deserialize(deserializer)? {
        Lenient::Value(value) => Some(value),
        Lenient::Other(_) => None,
    })
}

// ── TimeSlot ────────────────────────────────────────────────────────────────

/// One candidate session start time on a concrete date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSlot {
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    pub available: bool,
}

impl TimeSlot {
    /// The start time as `HH:MM`.
    pub fn label(&self) -> String {
        format_time(self.time)
    }
}

/// Which slots the caller wants back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotFilter {
    /// Only slots nobody has booked (primary booking form).
    OpenOnly,
    /// Every slot, booked ones marked `available = false` (detail views).
    All,
}

impl SlotFilter {
    pub fn keeps(self, slot: &TimeSlot) -> bool {
        match self {
            SlotFilter::OpenOnly => slot.available,
            SlotFilter::All => true,
        }
    }
}

// ── Parsing and formatting ──────────────────────────────────────────────────

/// Parse a calendar date: `YYYY-MM-DD`, or an RFC 3339 datetime whose local
/// calendar date is used.
///
/// # Errors
///
/// Returns [`SlotError::InvalidDate`] for empty or unparseable input.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return Err(SlotError::InvalidDate("missing date".to_string()));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.date_naive())
        .map_err(|e| SlotError::InvalidDate(format!("'{}': {}", s, e)))
}

/// Parse a 24-hour time of day: `"14:00"`, `"9:30"`, `"14:30:00"`.
///
/// # Errors
///
/// Returns [`SlotError::InvalidTime`] if the string is not a time of day or
/// carries non-zero seconds.
pub fn parse_time_of_day(s: &str) -> Result<NaiveTime> {
    let s = s.trim();
    let time = NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map_err(|_| SlotError::InvalidTime(format!("'{s}'")))?;
    if time.second() != 0 || time.nanosecond() != 0 {
        return Err(SlotError::InvalidTime(format!(
            "'{s}' is not on a minute boundary"
        )));
    }
    Ok(time)
}

/// Format a time of day as `HH:MM`.
pub fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Weekday number with Sunday = 0 through Saturday = 6.
pub fn weekday_index(date: NaiveDate) -> u8 {
    // num_days_from_sunday is always 0..=6
    date.weekday().num_days_from_sunday() as u8
}

pub(crate) fn minutes_since_midnight(time: NaiveTime) -> i64 {
    i64::from(time.hour() * 60 + time.minute())
}

/// Parse a window end bound: any time of day, or `24:00` for end of day.
fn parse_end_bound(s: &str) -> Result<i64> {
    match s.trim() {
        "24:00" | "24:00:00" => Ok(MINUTES_PER_DAY),
        other => parse_time_of_day(other).map(minutes_since_midnight),
    }
}

fn format_minutes(minutes: i64) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

pub(crate) fn time_from_minutes(minutes: i64) -> Option<NaiveTime> {
    let minutes = u32::try_from(minutes).ok()?;
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0)
}

fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
    time.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(time)
}

/// Serde adapter for `HH:MM` time-of-day fields.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_time(*time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_time_of_day(&raw).map_err(serde::de::Error::custom)
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

//! Request-scoped scheduling state and a render-agnostic slot list.
//!
//! A presentation layer owns one [`SchedulingContext`] per booking flow and
//! threads it through explicitly; nothing here is global. [`SlotListView`]
//! turns resolver output into plain data a UI framework can render however it
//! likes.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use crate::booking::BookingRequest;
use crate::error::{Result, SlotError};
use crate::resolver::{find_slot, validate_duration};
use crate::window::{format_time, TimeSlot, DEFAULT_SLOT_MINUTES};

// ── SchedulingContext ───────────────────────────────────────────────────────

/// The choices a user has made so far in one booking flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulingContext {
    tutor_id: Option<u64>,
    date: Option<NaiveDate>,
    duration_minutes: i64,
    selected_time: Option<NaiveTime>,
}

impl Default for SchedulingContext {
    fn default() -> Self {
        Self {
            tutor_id: None,
            date: None,
            duration_minutes: DEFAULT_SLOT_MINUTES,
            selected_time: None,
        }
    }
}

impl SchedulingContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tutor_id(&self) -> Option<u64> {
        self.tutor_id
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn duration_minutes(&self) -> i64 {
        self.duration_minutes
    }

    pub fn selected_time(&self) -> Option<NaiveTime> {
        self.selected_time
    }

    /// Pick a tutor. A different tutor invalidates the selected time.
    pub fn set_tutor(&mut self, tutor_id: u64) {
        if self.tutor_id != Some(tutor_id) {
            self.selected_time = None;
        }
        self.tutor_id = Some(tutor_id);
    }

    /// Pick a date. A different date invalidates the selected time.
    pub fn set_date(&mut self, date: NaiveDate) {
        if self.date != Some(date) {
            self.selected_time = None;
        }
        self.date = Some(date);
    }

    /// Change the session length. Slots are re-sliced, so the selection goes.
    pub fn set_duration(&mut self, minutes: i64) -> Result<()> {
        let minutes = validate_duration(minutes)?;
        if minutes != self.duration_minutes {
            self.selected_time = None;
        }
        self.duration_minutes = minutes;
        Ok(())
    }

    /// Both inputs the resolver needs from the user are present.
    pub fn has_query(&self) -> bool {
        self.tutor_id.is_some() && self.date.is_some()
    }

    /// Select `time` from the slots currently on screen.
    ///
    /// # Errors
    ///
    /// Returns [`SlotError::Unavailable`] if `time` is not among `slots`, or
    /// [`SlotError::Conflict`] if that slot is booked.
    pub fn select_time(&mut self, time: NaiveTime, slots: &[TimeSlot]) -> Result<()> {
        match find_slot(slots, time) {
            None => Err(SlotError::Unavailable(format!(
                "{} is not an offered slot",
                format_time(time)
            ))),
            Some(slot) if !slot.available => Err(SlotError::Conflict(format!(
                "{} is already booked",
                format_time(time)
            ))),
            Some(_) => {
                self.selected_time = Some(time);
                Ok(())
            }
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected_time = None;
    }

    pub fn ready_to_submit(&self) -> bool {
        self.has_query() && self.selected_time.is_some()
    }

    /// The booking request for the current choices, once complete.
    pub fn to_request(&self) -> Option<BookingRequest> {
        Some(BookingRequest {
            tutor_id: Some(self.tutor_id?),
            date: self.date?,
            time: self.selected_time?,
            duration_minutes: self.duration_minutes,
        })
    }
}

// ── SlotListView ────────────────────────────────────────────────────────────

/// One slot as a UI should show it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotView {
    /// Value to submit, `HH:MM`.
    pub time: String,
    /// Text to display; booked slots carry a `(Booked)` suffix.
    pub label: String,
    pub selectable: bool,
    pub selected: bool,
}

/// What the slot picker should show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "slots", rename_all = "snake_case")]
pub enum SlotListView {
    /// Tutor or date not chosen yet.
    NeedsSelection,
    /// The tutor offers nothing on that date.
    NoAvailability,
    Slots(Vec<SlotView>),
}

impl SlotListView {
    pub fn build(context: &SchedulingContext, slots: &[TimeSlot]) -> Self {
        if !context.has_query() {
            return SlotListView::NeedsSelection;
        }
        if slots.is_empty() {
            return SlotListView::NoAvailability;
        }
        SlotListView::Slots(
            slots
                .iter()
                .map(|slot| {
                    let time = slot.label();
                    let label = if slot.available {
                        time.clone()
                    } else {
                        format!("{time} (Booked)")
                    };
                    SlotView {
                        label,
                        selectable: slot.available,
                        selected: context.selected_time == Some(slot.time),
                        time,
                    }
                })
                .collect(),
        )
    }
}

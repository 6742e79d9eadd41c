//! # slot-resolver
//!
//! Deterministic session-slot computation for tutor booking.
//!
//! Tutors publish recurring weekly availability windows. Students book fixed
//! length sessions on concrete dates. This crate turns the former into the
//! latter: the ordered, de-duplicated start times a tutor can be booked at on
//! a given date, with already-booked times marked.
//!
//! ## Modules
//!
//! - [`resolver`] — Weekly windows + date + duration + booked times → slots
//! - [`window`] — Window, booked session and slot types; time parsing
//! - [`payload`] — The backend's availability JSON body and its glue to the resolver
//! - [`booking`] — Caller-side policy: booking horizon, request and reschedule checks
//! - [`view`] — Request-scoped scheduling context and a render-agnostic slot list
//! - [`error`] — Error types

pub mod booking;
pub mod error;
pub mod payload;
pub mod resolver;
pub mod view;
pub mod window;

pub use booking::{
    check_booking, check_reschedule, today_in, BookingPolicy, BookingRequest,
    DEFAULT_HORIZON_DAYS,
};
pub use error::SlotError;
pub use payload::AvailabilityPayload;
pub use resolver::{compute_slots, compute_slots_on, open_slot_times, validate_duration};
pub use view::{SchedulingContext, SlotListView, SlotView};
pub use window::{
    format_time, parse_date, parse_time_of_day, weekday_index, AvailabilityWindow,
    BookedSession, SlotFilter, TimeSlot, WindowRecord, DEFAULT_SLOT_MINUTES,
};

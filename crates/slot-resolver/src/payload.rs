//! The JSON body a tutor availability query returns, and the glue that hands
//! it to the resolver.
//!
//! The backend answers `GET /tutors/{id}/availability?date=...` with every
//! weekly window the tutor has configured plus the sessions already booked on
//! the requested date:
//!
//! ```json
//! {
//!   "availability": [{"day_of_week": 3, "start_time": "14:00", "end_time": "16:00", "is_available": 1}],
//!   "existing_sessions": [{"scheduled_time": "15:00", "duration": 60}]
//! }
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SlotError};
use crate::resolver::compute_slots;
use crate::window::{AvailabilityWindow, BookedSession, SlotFilter, TimeSlot, WindowRecord};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityPayload {
    #[serde(default)]
    pub availability: Vec<WindowRecord>,
    #[serde(default)]
    pub existing_sessions: Vec<BookedSession>,
}

impl AvailabilityPayload {
    /// Parse a payload from its JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`SlotError::InvalidPayload`] if the text is not a payload.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| SlotError::InvalidPayload(e.to_string()))
    }

    /// The windows the tutor has switched on, validated.
    ///
    /// # Errors
    ///
    /// Returns [`SlotError::InvalidWindow`] for the first enabled record
    /// whose bounds or weekday are invalid.
    pub fn windows(&self) -> Result<Vec<AvailabilityWindow>> {
        self.availability
            .iter()
            .filter(|record| record.is_available)
            .cloned()
            .map(AvailabilityWindow::try_from)
            .collect()
    }

    /// The raw booked start times. Unparseable strings are kept for the
    /// resolver to skip; records without a string `scheduled_time` are
    /// dropped here.
    pub fn booked_times(&self) -> Vec<&str> {
        self.existing_sessions
            .iter()
            .filter_map(|session| {
                let time = session.scheduled_time.as_deref();
                if time.is_none() {
                    debug!(?session, "skipping booked session without a scheduled_time");
                }
                time
            })
            .collect()
    }

    /// Resolve the slots for `date` from this payload.
    pub fn resolve(
        &self,
        date: &str,
        slot_duration_minutes: i64,
        filter: SlotFilter,
    ) -> Result<Vec<TimeSlot>> {
        let windows = self.windows()?;
        compute_slots(
            &windows,
            date,
            slot_duration_minutes,
            &self.booked_times(),
            filter,
        )
    }
}

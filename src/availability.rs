//! Derives the free/occupied state of a day's slot grid from the current set
//! of appointments. Pure over its inputs; the workflow layer validates the
//! barber and date before calling in.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use crate::catalog::{day_slots, minute_of_day, SLOT_MINUTES};
use crate::models::{Appointment, AppointmentStatus};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SlotAvailability {
    #[serde(with = "crate::models::slot_time")]
    pub time: NaiveTime,
    pub free: bool,
}

/// Half-open interval overlap over minute-of-day spans.
pub fn spans_overlap(a_start: i64, a_end: i64, b_start: i64, b_end: i64) -> bool {
    a_start < b_end && b_start < a_end
}

/// Marks every grid slot covered by a non-cancelled appointment of this
/// barber on this date as occupied. A multi-slot booking blocks each cell in
/// its span, so a 60-minute booking at 10:00 also takes 10:30.
pub fn compute_availability(
    barber_id: &str,
    date: NaiveDate,
    appointments: &[Appointment],
) -> Vec<SlotAvailability> {
    let relevant: Vec<&Appointment> = appointments
        .iter()
        .filter(|appt| {
            appt.barber_id == barber_id
                && appt.date == date
                && appt.status != AppointmentStatus::Cancelled
        })
        .collect();

    day_slots()
        .into_iter()
        .map(|time| {
            let slot_start = i64::from(minute_of_day(time));
            let slot_end = slot_start + i64::from(SLOT_MINUTES);
            let free = !relevant
                .iter()
                .any(|appt| spans_overlap(slot_start, slot_end, appt.start_min, appt.end_min));
            SlotAvailability { time, free }
        })
        .collect()
}

//! The appointment store: single source of truth for bookings. Both
//! implementations honor the same contract — the availability check and the
//! insert are one atomic unit, and mutators return post-mutation snapshots.

mod memory;
mod sqlite;

pub use memory::InMemoryAppointmentStore;
pub use sqlite::SqliteAppointmentStore;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::BookingError;
use crate::models::{Appointment, AppointmentStatus};

#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    /// Inserts the appointment if, and only if, no non-cancelled appointment
    /// of the same barber overlaps its `[start_min, end_min)` span on the
    /// same date. Returns `Conflict` otherwise, leaving state untouched.
    async fn create(&self, appointment: Appointment) -> Result<Appointment, BookingError>;

    async fn get(&self, id: &str) -> Result<Option<Appointment>, BookingError>;

    /// Sets the status only when the current status equals `from`; `None`
    /// means the record changed underneath the caller (or the status already
    /// moved on), never a partial write.
    async fn compare_and_set_status(
        &self,
        id: &str,
        from: AppointmentStatus,
        to: AppointmentStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Appointment>, BookingError>;

    /// Triage view: a barber's appointments in day/slot order, optionally
    /// windowed to a date range (either bound may be open) and filtered by
    /// status.
    async fn list_by_barber(
        &self,
        barber_id: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        status: Option<AppointmentStatus>,
    ) -> Result<Vec<Appointment>, BookingError>;

    /// A customer's booking history, newest first. Cancelled and completed
    /// appointments are retained for visit stats.
    async fn list_by_customer(&self, customer_id: &str) -> Result<Vec<Appointment>, BookingError>;

    /// The non-cancelled set feeding the availability computation for one
    /// barber-day.
    async fn list_for_day(
        &self,
        barber_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, BookingError>;
}

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;

use crate::availability::spans_overlap;
use crate::error::BookingError;
use crate::models::{Appointment, AppointmentStatus};
use crate::store::AppointmentRepository;

/// In-memory store with the same atomicity contract as the SQLite one: the
/// overlap check and the insert happen inside a single critical section, so
/// concurrent creates for the same span cannot both pass the check.
#[derive(Default)]
pub struct InMemoryAppointmentStore {
    items: Mutex<HashMap<String, Appointment>>,
}

impl InMemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AppointmentRepository for InMemoryAppointmentStore {
    async fn create(&self, appointment: Appointment) -> Result<Appointment, BookingError> {
        let mut items = self.items.lock();
        let occupied = items.values().any(|existing| {
            existing.barber_id == appointment.barber_id
                && existing.date == appointment.date
                && existing.status != AppointmentStatus::Cancelled
                && spans_overlap(
                    existing.start_min,
                    existing.end_min,
                    appointment.start_min,
                    appointment.end_min,
                )
        });
        if occupied {
            return Err(BookingError::Conflict {
                date: appointment.date,
                time: appointment.time,
            });
        }
        items.insert(appointment.id.clone(), appointment.clone());
        Ok(appointment)
    }

    async fn get(&self, id: &str) -> Result<Option<Appointment>, BookingError> {
        Ok(self.items.lock().get(id).cloned())
    }

    async fn compare_and_set_status(
        &self,
        id: &str,
        from: AppointmentStatus,
        to: AppointmentStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Appointment>, BookingError> {
        let mut items = self.items.lock();
        match items.get_mut(id) {
            Some(existing) if existing.status == from => {
                existing.status = to;
                existing.updated_at = updated_at;
                Ok(Some(existing.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn list_by_barber(
        &self,
        barber_id: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        status: Option<AppointmentStatus>,
    ) -> Result<Vec<Appointment>, BookingError> {
        let items = self.items.lock();
        let mut rows: Vec<Appointment> = items
            .values()
            .filter(|appt| appt.barber_id == barber_id)
            .filter(|appt| from.is_none_or(|from| appt.date >= from))
            .filter(|appt| to.is_none_or(|to| appt.date <= to))
            .filter(|appt| status.is_none_or(|wanted| appt.status == wanted))
            .cloned()
            .collect();
        rows.sort_by_key(|appt| (appt.date, appt.start_min));
        Ok(rows)
    }

    async fn list_by_customer(&self, customer_id: &str) -> Result<Vec<Appointment>, BookingError> {
        let items = self.items.lock();
        let mut rows: Vec<Appointment> = items
            .values()
            .filter(|appt| appt.customer_id.as_deref() == Some(customer_id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn list_for_day(
        &self,
        barber_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, BookingError> {
        let items = self.items.lock();
        let mut rows: Vec<Appointment> = items
            .values()
            .filter(|appt| {
                appt.barber_id == barber_id
                    && appt.date == date
                    && appt.status != AppointmentStatus::Cancelled
            })
            .cloned()
            .collect();
        rows.sort_by_key(|appt| appt.start_min);
        Ok(rows)
    }
}

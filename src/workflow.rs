//! Booking orchestration: validates a booking intent against the catalogs
//! and the rolling window, snapshots service data, and submits the create to
//! the store. Availability shown during selection is advisory only; the
//! store re-validates atomically at commit time.

use std::time::Duration;

use chrono::{NaiveDate, NaiveTime, Utc};
use serde::Deserialize;

use crate::auth::new_id;
use crate::availability::{compute_availability, SlotAvailability};
use crate::catalog::{date_range, minute_of_day, slot_index, span_end_minute, span_fits};
use crate::error::BookingError;
use crate::models::{Actor, Appointment, AppointmentStatus, Barber, Role, Service};
use crate::store::AppointmentRepository;

const CREATE_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct BookingPolicy {
    pub window_days: u32,
    /// Barber-entered bookings (walk-ins, WhatsApp-mediated) start life as
    /// `confirmed` when set; customer self-service always starts `pending`.
    pub barber_auto_confirm: bool,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            window_days: crate::catalog::DEFAULT_WINDOW_DAYS,
            barber_auto_confirm: true,
        }
    }
}

/// Who the appointment is for. Registered customers carry their account id;
/// barber-entered walk-ins are guests with just a name and phone.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomerDetails {
    pub id: Option<String>,
    pub name: String,
    pub phone: String,
}

#[derive(Debug, Clone)]
pub struct BookingIntent {
    pub barber_id: String,
    pub service_id: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub customer: CustomerDetails,
    pub notes: Option<String>,
}

/// Reference data and policy resolved by the caller for one request.
pub struct BookingContext<'a> {
    pub services: &'a [Service],
    pub barbers: &'a [Barber],
    pub policy: &'a BookingPolicy,
    pub today: NaiveDate,
}

impl BookingContext<'_> {
    fn barber(&self, id: &str) -> Result<&Barber, BookingError> {
        self.barbers
            .iter()
            .find(|barber| barber.id == id)
            .ok_or_else(|| BookingError::UnknownBarber(id.to_string()))
    }

    fn service(&self, id: &str) -> Result<&Service, BookingError> {
        self.services
            .iter()
            .find(|service| service.id == id && service.active)
            .ok_or_else(|| BookingError::UnknownService(id.to_string()))
    }

    fn check_date(&self, date: NaiveDate) -> Result<(), BookingError> {
        if date_range(self.today, self.policy.window_days).contains(&date) {
            Ok(())
        } else {
            Err(BookingError::InvalidDate { date })
        }
    }
}

/// Validates the intent, builds the appointment snapshot, and creates it.
/// Transient storage failures retry with doubling backoff; a `Conflict` is
/// final and tells the caller to re-query availability.
pub async fn book(
    store: &dyn AppointmentRepository,
    ctx: &BookingContext<'_>,
    actor: &Actor,
    intent: BookingIntent,
) -> Result<Appointment, BookingError> {
    let barber = ctx.barber(&intent.barber_id)?;
    let service = ctx.service(&intent.service_id)?;
    ctx.check_date(intent.date)?;
    if slot_index(intent.time).is_none() || !span_fits(intent.time, service.duration_min) {
        return Err(BookingError::InvalidTime { time: intent.time });
    }

    let status = match actor.role {
        Role::Barber if ctx.policy.barber_auto_confirm => AppointmentStatus::Confirmed,
        _ => AppointmentStatus::Pending,
    };

    let now = Utc::now();
    let appointment = Appointment {
        id: new_id(),
        customer_id: intent.customer.id,
        customer_name: intent.customer.name,
        customer_phone: intent.customer.phone,
        barber_id: barber.id.clone(),
        barber_name: barber.name.clone(),
        service_id: service.id.clone(),
        service_name: service.name.clone(),
        service_price: service.price,
        service_duration: service.duration_min,
        date: intent.date,
        time: intent.time,
        start_min: i64::from(minute_of_day(intent.time)),
        end_min: i64::from(span_end_minute(intent.time, service.duration_min)),
        status,
        notes: intent.notes,
        created_at: now,
        updated_at: now,
    };

    let mut backoff = INITIAL_BACKOFF;
    let mut attempt = 1;
    loop {
        match store.create(appointment.clone()).await {
            Err(err) if err.is_transient() && attempt < CREATE_ATTEMPTS => {
                log::warn!("create attempt {attempt} failed, retrying: {err}");
                tokio::time::sleep(backoff).await;
                backoff *= 2;
                attempt += 1;
            }
            other => return other,
        }
    }
}

/// The free/occupied grid for one barber-day, after validating the barber
/// and that the date falls inside the booking window.
pub async fn availability(
    store: &dyn AppointmentRepository,
    ctx: &BookingContext<'_>,
    barber_id: &str,
    date: NaiveDate,
) -> Result<Vec<SlotAvailability>, BookingError> {
    ctx.barber(barber_id)?;
    ctx.check_date(date)?;
    let appointments = store.list_for_day(barber_id, date).await?;
    Ok(compute_availability(barber_id, date, &appointments))
}

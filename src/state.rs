use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use sqlx::SqlitePool;
use tokio::sync::broadcast;

use crate::models::{Appointment, AppointmentStatus};
use crate::notify::WhatsappConfig;
use crate::store::AppointmentRepository;
use crate::workflow::BookingPolicy;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub store: Arc<dyn AppointmentRepository>,
    pub events: broadcast::Sender<ServerEvent>,
    pub policy: BookingPolicy,
    pub whatsapp: WhatsappConfig,
}

impl AppState {
    pub fn publish(&self, event: ServerEvent) {
        // Nobody listening is fine; SSE subscribers come and go.
        let _ = self.events.send(event);
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ServerEvent {
    pub kind: String,
    pub appointment_id: String,
    pub status: AppointmentStatus,
    pub barber_id: String,
    pub barber_name: String,
    pub customer_name: String,
    pub service_name: String,
    pub date: NaiveDate,
    #[serde(with = "crate::models::slot_time")]
    pub time: NaiveTime,
}

impl ServerEvent {
    pub fn from_appointment(kind: &str, appointment: &Appointment) -> Self {
        Self {
            kind: kind.to_string(),
            appointment_id: appointment.id.clone(),
            status: appointment.status,
            barber_id: appointment.barber_id.clone(),
            barber_name: appointment.barber_name.clone(),
            customer_name: appointment.customer_name.clone(),
            service_name: appointment.service_name.clone(),
            date: appointment.date,
            time: appointment.time,
        }
    }
}

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::error::BookingError;
use crate::models::{Appointment, AppointmentStatus};
use crate::store::AppointmentRepository;

const APPOINTMENT_COLUMNS: &str = "id, customer_id, customer_name, customer_phone, barber_id, \
     barber_name, service_id, service_name, service_price, service_duration, \
     date, time, start_min, end_min, status, notes, created_at, updated_at";

/// SQLite-backed store. The no-double-booking invariant rides on a single
/// conditional INSERT: SQLite serializes writers, so the overlap check and
/// the insert cannot interleave with another create.
#[derive(Clone)]
pub struct SqliteAppointmentStore {
    pool: SqlitePool,
}

impl SqliteAppointmentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AppointmentRepository for SqliteAppointmentStore {
    async fn create(&self, appointment: Appointment) -> Result<Appointment, BookingError> {
        let result = sqlx::query(
            r#"INSERT INTO appointments
                   (id, customer_id, customer_name, customer_phone, barber_id, barber_name,
                    service_id, service_name, service_price, service_duration,
                    date, time, start_min, end_min, status, notes, created_at, updated_at)
               SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18
               WHERE NOT EXISTS (
                   SELECT 1 FROM appointments
                   WHERE barber_id = ?5
                     AND date = ?11
                     AND status != 'cancelled'
                     AND start_min < ?14
                     AND end_min > ?13
               )"#,
        )
        .bind(&appointment.id)
        .bind(&appointment.customer_id)
        .bind(&appointment.customer_name)
        .bind(&appointment.customer_phone)
        .bind(&appointment.barber_id)
        .bind(&appointment.barber_name)
        .bind(&appointment.service_id)
        .bind(&appointment.service_name)
        .bind(appointment.service_price)
        .bind(appointment.service_duration)
        .bind(appointment.date)
        .bind(appointment.time)
        .bind(appointment.start_min)
        .bind(appointment.end_min)
        .bind(appointment.status)
        .bind(&appointment.notes)
        .bind(appointment.created_at)
        .bind(appointment.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(BookingError::Conflict {
                date: appointment.date,
                time: appointment.time,
            });
        }

        self.get(&appointment.id)
            .await?
            .ok_or(BookingError::NotFound)
    }

    async fn get(&self, id: &str) -> Result<Option<Appointment>, BookingError> {
        let row = sqlx::query_as::<_, Appointment>(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1 LIMIT 1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn compare_and_set_status(
        &self,
        id: &str,
        from: AppointmentStatus,
        to: AppointmentStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Appointment>, BookingError> {
        let result = sqlx::query(
            "UPDATE appointments SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = ?4",
        )
        .bind(to)
        .bind(updated_at)
        .bind(id)
        .bind(from)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(id).await
    }

    async fn list_by_barber(
        &self,
        barber_id: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        status: Option<AppointmentStatus>,
    ) -> Result<Vec<Appointment>, BookingError> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE barber_id = "
        ));
        builder.push_bind(barber_id);
        if let Some(from) = from {
            builder.push(" AND date >= ");
            builder.push_bind(from);
        }
        if let Some(to) = to {
            builder.push(" AND date <= ");
            builder.push_bind(to);
        }
        if let Some(status) = status {
            builder.push(" AND status = ");
            builder.push_bind(status);
        }
        builder.push(" ORDER BY date, start_min");

        let rows = builder
            .build_query_as::<Appointment>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_by_customer(&self, customer_id: &str) -> Result<Vec<Appointment>, BookingError> {
        let rows = sqlx::query_as::<_, Appointment>(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments
             WHERE customer_id = ?1
             ORDER BY created_at DESC"
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_for_day(
        &self,
        barber_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, BookingError> {
        let rows = sqlx::query_as::<_, Appointment>(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments
             WHERE barber_id = ?1 AND date = ?2 AND status != 'cancelled'
             ORDER BY start_min"
        ))
        .bind(barber_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

use actix_web::{web, HttpResponse};
use actix_web_httpauth::middleware::HttpAuthentication;
use chrono::{NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use serde_json::json;
use sqlx::{QueryBuilder, Sqlite};

use crate::auth::barber_validator;
use crate::db::{fetch_barbers, fetch_recent_activity, fetch_services, log_activity};
use crate::error::BookingError;
use crate::lifecycle;
use crate::models::{Actor, AppointmentStatus};
use crate::state::{AppState, ServerEvent};
use crate::workflow::{self, BookingContext, BookingIntent, CustomerDetails};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/barber")
            .wrap(HttpAuthentication::basic(barber_validator))
            .service(web::resource("/dashboard").route(web::get().to(dashboard)))
            .service(
                web::resource("/appointments")
                    .route(web::get().to(list_appointments))
                    .route(web::post().to(create_appointment)),
            )
            .service(
                web::resource("/appointments/{id}/status").route(web::post().to(update_status)),
            )
            .service(web::resource("/customers").route(web::get().to(list_customers))),
    );
}

/// Non-owner barbers operate on their own column only; the owner may target
/// any barber in the shop.
fn resolve_scope(actor: &Actor, requested: Option<&str>) -> Result<String, BookingError> {
    let own = actor
        .barber_id
        .as_deref()
        .ok_or_else(|| BookingError::forbidden(actor.role, "act without a barber profile"))?;
    match requested {
        None => Ok(own.to_string()),
        Some(id) if id == own || actor.is_owner => Ok(id.to_string()),
        Some(_) => Err(BookingError::forbidden(
            actor.role,
            "manage another barber's appointments",
        )),
    }
}

async fn count_status(
    state: &AppState,
    barber_id: &str,
    status: Option<AppointmentStatus>,
) -> i64 {
    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT COUNT(*) FROM appointments WHERE barber_id = ");
    builder.push_bind(barber_id);
    if let Some(status) = status {
        builder.push(" AND status = ");
        builder.push_bind(status);
    }
    builder
        .build_query_scalar::<i64>()
        .fetch_one(&state.db)
        .await
        .unwrap_or(0)
}

async fn dashboard(
    state: web::Data<AppState>,
    actor: web::ReqData<Actor>,
) -> Result<HttpResponse, BookingError> {
    let barber_id = resolve_scope(&actor, None)?;

    let total = count_status(&state, &barber_id, None).await;
    let pending = count_status(&state, &barber_id, Some(AppointmentStatus::Pending)).await;
    let confirmed = count_status(&state, &barber_id, Some(AppointmentStatus::Confirmed)).await;
    let completed = count_status(&state, &barber_id, Some(AppointmentStatus::Completed)).await;
    let activity = fetch_recent_activity(&state.db, 8).await?;

    Ok(HttpResponse::Ok().json(json!({
        "barber_id": barber_id,
        "stats": {
            "total": total,
            "pending": pending,
            "confirmed": confirmed,
            "completed": completed,
        },
        "activity": activity,
    })))
}

#[derive(Deserialize)]
struct ListQuery {
    barber_id: Option<String>,
    status: Option<AppointmentStatus>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
}

async fn list_appointments(
    state: web::Data<AppState>,
    actor: web::ReqData<Actor>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, BookingError> {
    let barber_id = resolve_scope(&actor, query.barber_id.as_deref())?;
    let appointments = state
        .store
        .list_by_barber(&barber_id, query.from, query.to, query.status)
        .await?;
    Ok(HttpResponse::Ok().json(appointments))
}

#[derive(Deserialize)]
struct WalkInForm {
    barber_id: Option<String>,
    service_id: String,
    date: NaiveDate,
    #[serde(with = "crate::models::slot_time")]
    time: NaiveTime,
    customer_name: String,
    customer_phone: String,
    notes: Option<String>,
}

/// Barber-entered booking: a walk-in or a WhatsApp-mediated request typed in
/// by the barber. Entry status follows the shop policy.
async fn create_appointment(
    state: web::Data<AppState>,
    actor: web::ReqData<Actor>,
    form: web::Json<WalkInForm>,
) -> Result<HttpResponse, BookingError> {
    let form = form.into_inner();
    let barber_id = resolve_scope(&actor, form.barber_id.as_deref())?;

    let services = fetch_services(&state.db).await?;
    let barbers = fetch_barbers(&state.db).await?;
    let ctx = BookingContext {
        services: &services,
        barbers: &barbers,
        policy: &state.policy,
        today: Utc::now().date_naive(),
    };

    let intent = BookingIntent {
        barber_id,
        service_id: form.service_id,
        date: form.date,
        time: form.time,
        customer: CustomerDetails {
            id: None,
            name: form.customer_name,
            phone: form.customer_phone,
        },
        notes: form.notes,
    };

    let appointment = workflow::book(state.store.as_ref(), &ctx, &actor, intent).await?;

    log_activity(
        &state.db,
        "appointment_created",
        &format!(
            "{} entered an appointment for {}.",
            actor.display_name, appointment.customer_name
        ),
        Some(&actor.user_id),
        Some(&appointment.id),
    )
    .await;
    state.publish(ServerEvent::from_appointment(
        "appointment_created",
        &appointment,
    ));

    Ok(HttpResponse::Created().json(appointment))
}

#[derive(Deserialize)]
struct StatusForm {
    status: AppointmentStatus,
}

async fn update_status(
    state: web::Data<AppState>,
    actor: web::ReqData<Actor>,
    path: web::Path<String>,
    form: web::Json<StatusForm>,
) -> Result<HttpResponse, BookingError> {
    let appointment_id = path.into_inner();
    let appointment = lifecycle::apply(
        state.store.as_ref(),
        &actor,
        &appointment_id,
        form.status,
    )
    .await?;

    log_activity(
        &state.db,
        "barber_status_update",
        &format!(
            "{} updated appointment {} to {}.",
            actor.display_name, appointment.id, appointment.status
        ),
        Some(&actor.user_id),
        Some(&appointment.id),
    )
    .await;
    state.publish(ServerEvent::from_appointment(
        "appointment_updated",
        &appointment,
    ));

    Ok(HttpResponse::Ok().json(appointment))
}

#[derive(Deserialize)]
struct CustomerQuery {
    barber_id: Option<String>,
    search: Option<String>,
}

#[derive(Debug, serde::Serialize, sqlx::FromRow)]
struct CustomerSummary {
    customer_name: String,
    customer_phone: String,
    total_appointments: i64,
    last_visit: Option<NaiveDate>,
}

/// The barber's customer list: visit counts over non-cancelled history and
/// the date of the last completed visit, optionally filtered by name/phone.
async fn list_customers(
    state: web::Data<AppState>,
    actor: web::ReqData<Actor>,
    query: web::Query<CustomerQuery>,
) -> Result<HttpResponse, BookingError> {
    let barber_id = resolve_scope(&actor, query.barber_id.as_deref())?;

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT customer_name, customer_phone,
                COUNT(*) AS total_appointments,
                MAX(CASE WHEN status = 'completed' THEN date END) AS last_visit
         FROM appointments
         WHERE status != 'cancelled' AND barber_id = ",
    );
    builder.push_bind(&barber_id);
    if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = format!("%{}%", search.trim());
        builder.push(" AND (customer_name LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR customer_phone LIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }
    builder.push(" GROUP BY customer_name, customer_phone ORDER BY customer_name");

    let customers = builder
        .build_query_as::<CustomerSummary>()
        .fetch_all(&state.db)
        .await?;
    Ok(HttpResponse::Ok().json(customers))
}

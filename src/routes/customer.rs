use actix_web::{web, HttpResponse};
use actix_web_httpauth::middleware::HttpAuthentication;
use chrono::{NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::auth::customer_validator;
use crate::db::{fetch_barbers, fetch_services, log_activity};
use crate::error::BookingError;
use crate::lifecycle;
use crate::models::{Actor, AppointmentStatus};
use crate::notify;
use crate::state::{AppState, ServerEvent};
use crate::workflow::{self, BookingContext, BookingIntent, CustomerDetails};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/customer")
            .wrap(HttpAuthentication::basic(customer_validator))
            .service(
                web::resource("/appointments")
                    .route(web::get().to(list_appointments))
                    .route(web::post().to(create_appointment)),
            )
            .service(
                web::resource("/appointments/{id}/cancel")
                    .route(web::post().to(cancel_appointment)),
            ),
    );
}

#[derive(Deserialize)]
struct BookingForm {
    barber_id: String,
    service_id: String,
    date: NaiveDate,
    #[serde(with = "crate::models::slot_time")]
    time: NaiveTime,
    notes: Option<String>,
}

async fn create_appointment(
    state: web::Data<AppState>,
    actor: web::ReqData<Actor>,
    form: web::Json<BookingForm>,
) -> Result<HttpResponse, BookingError> {
    let form = form.into_inner();
    let services = fetch_services(&state.db).await?;
    let barbers = fetch_barbers(&state.db).await?;
    let ctx = BookingContext {
        services: &services,
        barbers: &barbers,
        policy: &state.policy,
        today: Utc::now().date_naive(),
    };

    let intent = BookingIntent {
        barber_id: form.barber_id,
        service_id: form.service_id,
        date: form.date,
        time: form.time,
        customer: CustomerDetails {
            id: Some(actor.user_id.clone()),
            name: actor.display_name.clone(),
            phone: actor.phone.clone().unwrap_or_default(),
        },
        notes: form.notes,
    };

    let appointment = workflow::book(state.store.as_ref(), &ctx, &actor, intent).await?;

    log_activity(
        &state.db,
        "appointment_created",
        &format!(
            "New appointment requested by {} for {}.",
            appointment.customer_name, appointment.barber_name
        ),
        Some(&actor.user_id),
        Some(&appointment.id),
    )
    .await;
    state.publish(ServerEvent::from_appointment(
        "appointment_created",
        &appointment,
    ));

    let barber = barbers.iter().find(|b| b.id == appointment.barber_id);
    let whatsapp = notify::booking_payload(&state.whatsapp, barber, &appointment);

    Ok(HttpResponse::Created().json(json!({
        "appointment": appointment,
        "whatsapp": whatsapp,
    })))
}

async fn list_appointments(
    state: web::Data<AppState>,
    actor: web::ReqData<Actor>,
) -> Result<HttpResponse, BookingError> {
    let appointments = state.store.list_by_customer(&actor.user_id).await?;
    Ok(HttpResponse::Ok().json(appointments))
}

async fn cancel_appointment(
    state: web::Data<AppState>,
    actor: web::ReqData<Actor>,
    path: web::Path<String>,
) -> Result<HttpResponse, BookingError> {
    let appointment_id = path.into_inner();
    let appointment = lifecycle::apply(
        state.store.as_ref(),
        &actor,
        &appointment_id,
        AppointmentStatus::Cancelled,
    )
    .await?;

    log_activity(
        &state.db,
        "appointment_cancelled",
        &format!("{} cancelled their appointment.", appointment.customer_name),
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

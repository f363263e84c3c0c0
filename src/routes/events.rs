use actix_web::{http::header, web, HttpResponse};
use actix_web_httpauth::middleware::HttpAuthentication;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::auth::barber_validator;
use crate::state::{AppState, ServerEvent};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/events")
            .wrap(HttpAuthentication::basic(barber_validator))
            .route(web::get().to(stream_events)),
    )
    .service(
        web::resource("/api/appointments/{id}/events")
            .route(web::get().to(stream_appointment_events)),
    );
}

/// Shop-wide appointment feed for the barber screens.
async fn stream_events(state: web::Data<AppState>) -> HttpResponse {
    let rx = state.events.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(event) => Some(Ok::<web::Bytes, actix_web::Error>(event_to_bytes(&event))),
        Err(_) => None,
    });

    HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, "text/event-stream"))
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .streaming(stream)
}

fn event_to_bytes(event: &ServerEvent) -> web::Bytes {
    let payload = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());
    web::Bytes::from(format!("event: update\ndata: {}\n\n", payload))
}

#[derive(serde::Serialize)]
struct PublicStatusEvent {
    appointment_id: String,
    status: crate::models::AppointmentStatus,
    service_name: String,
    date: chrono::NaiveDate,
    #[serde(with = "crate::models::slot_time")]
    time: chrono::NaiveTime,
    barber_name: String,
}

/// Per-appointment feed a customer can watch for their own booking, reduced
/// to the fields the status screen shows.
async fn stream_appointment_events(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> HttpResponse {
    let appointment_id = path.into_inner();
    let rx = state.events.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(move |result| {
        let event = match result {
            Ok(event) => event,
            Err(_) => return None,
        };
        if event.appointment_id != appointment_id {
            return None;
        }
        let public = PublicStatusEvent {
            appointment_id: event.appointment_id,
            status: event.status,
            service_name: event.service_name,
            date: event.date,
            time: event.time,
            barber_name: event.barber_name,
        };
        let payload = serde_json::to_string(&public).unwrap_or_else(|_| "{}".to_string());
        Some(Ok::<web::Bytes, actix_web::Error>(web::Bytes::from(
            format!("event: update\ndata: {}\n\n", payload),
        )))
    });

    HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, "text/event-stream"))
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .streaming(stream)
}

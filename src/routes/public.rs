use actix_web::{web, HttpResponse};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::auth::{hash_password, new_id};
use crate::catalog::date_range;
use crate::db::{fetch_barbers, fetch_services};
use crate::error::BookingError;
use crate::models::ROLE_CUSTOMER;
use crate::state::AppState;
use crate::workflow::{self, BookingContext};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/health").route(web::get().to(health)))
        .service(web::resource("/api/services").route(web::get().to(list_services)))
        .service(web::resource("/api/barbers").route(web::get().to(list_barbers)))
        .service(web::resource("/api/booking-days").route(web::get().to(booking_days)))
        .service(web::resource("/api/availability").route(web::get().to(availability)))
        .service(web::resource("/api/register").route(web::post().to(register)));
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

async fn list_services(state: web::Data<AppState>) -> Result<HttpResponse, BookingError> {
    let services = fetch_services(&state.db).await?;
    Ok(HttpResponse::Ok().json(services))
}

async fn list_barbers(state: web::Data<AppState>) -> Result<HttpResponse, BookingError> {
    let barbers = fetch_barbers(&state.db).await?;
    Ok(HttpResponse::Ok().json(barbers))
}

async fn booking_days(state: web::Data<AppState>) -> HttpResponse {
    let days = date_range(Utc::now().date_naive(), state.policy.window_days);
    HttpResponse::Ok().json(days)
}

#[derive(Deserialize)]
struct AvailabilityQuery {
    barber_id: String,
    date: NaiveDate,
}

async fn availability(
    state: web::Data<AppState>,
    query: web::Query<AvailabilityQuery>,
) -> Result<HttpResponse, BookingError> {
    let services = fetch_services(&state.db).await?;
    let barbers = fetch_barbers(&state.db).await?;
    let ctx = BookingContext {
        services: &services,
        barbers: &barbers,
        policy: &state.policy,
        today: Utc::now().date_naive(),
    };

    let slots =
        workflow::availability(state.store.as_ref(), &ctx, &query.barber_id, query.date).await?;
    Ok(HttpResponse::Ok().json(json!({
        "barber_id": query.barber_id,
        "date": query.date,
        "slots": slots,
    })))
}

#[derive(Deserialize)]
struct RegisterForm {
    username: String,
    password: String,
    display_name: String,
    phone: String,
}

async fn register(
    state: web::Data<AppState>,
    form: web::Json<RegisterForm>,
) -> Result<HttpResponse, BookingError> {
    let form = form.into_inner();
    let mut errors = Vec::new();
    if form.username.trim().is_empty() {
        errors.push("Username is required.");
    }
    if form.password.len() < 8 {
        errors.push("Password must be at least 8 characters.");
    }
    if form.display_name.trim().is_empty() {
        errors.push("Full name is required.");
    }
    if form.phone.trim().is_empty() {
        errors.push("Phone number is required.");
    }
    if !errors.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({ "errors": errors })));
    }

    let password_hash = hash_password(&form.password)
        .map_err(|_| BookingError::Storage(sqlx::Error::Protocol("password hash failed".into())))?;
    let user_id = new_id();

    let result = sqlx::query(
        r#"INSERT INTO users (id, username, display_name, phone, role, password_hash, active, barber_id, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, NULL, ?7)"#,
    )
    .bind(&user_id)
    .bind(form.username.trim())
    .bind(form.display_name.trim())
    .bind(form.phone.trim())
    .bind(ROLE_CUSTOMER)
    .bind(password_hash)
    .bind(Utc::now().to_rfc3339())
    .execute(&state.db)
    .await;

    match result {
        Ok(_) => Ok(HttpResponse::Created().json(json!({
            "id": user_id,
            "username": form.username.trim(),
        }))),
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            Ok(HttpResponse::Conflict().json(json!({
                "error": "username already taken",
                "code": "username_taken",
            })))
        }
        Err(err) => Err(err.into()),
    }
}

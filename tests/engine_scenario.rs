//! Engine-level walkthrough of a booking day and the concurrency properties
//! of the two store implementations.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Utc};
use futures::future::join_all;
use sqlx::sqlite::SqlitePoolOptions;

use tyhair_booking::auth::new_id;
use tyhair_booking::catalog::{minute_of_day, span_end_minute};
use tyhair_booking::error::BookingError;
use tyhair_booking::lifecycle;
use tyhair_booking::models::{
    Actor, Appointment, AppointmentStatus, Barber, Role, Service,
};
use tyhair_booking::store::{
    AppointmentRepository, InMemoryAppointmentStore, SqliteAppointmentStore,
};
use tyhair_booking::workflow::{self, BookingContext, BookingIntent, BookingPolicy, CustomerDetails};

fn at(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn booking_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 20).unwrap()
}

fn services() -> Vec<Service> {
    vec![
        Service {
            id: "1".into(),
            name: "Saç Kesimi".into(),
            description: Some("Klasik saç kesimi ve yıkama".into()),
            price: 150,
            duration_min: 30,
            active: true,
            sort_order: 1,
        },
        Service {
            id: "5".into(),
            name: "Tam Bakım Paket".into(),
            description: Some("Saç, sakal ve cilt bakımı komple".into()),
            price: 280,
            duration_min: 60,
            active: true,
            sort_order: 5,
        },
    ]
}

fn barbers() -> Vec<Barber> {
    vec![
        Barber {
            id: "tarik".into(),
            name: "Tarık Bey".into(),
            is_owner: true,
            whatsapp_number: None,
        },
        Barber {
            id: "omer".into(),
            name: "ÖMER JR".into(),
            is_owner: false,
            whatsapp_number: None,
        },
    ]
}

fn customer() -> Actor {
    Actor {
        user_id: "c1".into(),
        display_name: "Ahmet Yılmaz".into(),
        phone: Some("0555 123 4567".into()),
        role: Role::Customer,
        barber_id: None,
        is_owner: false,
    }
}

fn barber_tarik() -> Actor {
    Actor {
        user_id: "u-tarik".into(),
        display_name: "Tarık Bey".into(),
        phone: None,
        role: Role::Barber,
        barber_id: Some("tarik".into()),
        is_owner: true,
    }
}

fn intent(time: NaiveTime, service_id: &str) -> BookingIntent {
    BookingIntent {
        barber_id: "tarik".into(),
        service_id: service_id.into(),
        date: booking_day(),
        time,
        customer: CustomerDetails {
            id: Some("c1".into()),
            name: "Ahmet Yılmaz".into(),
            phone: "0555 123 4567".into(),
        },
        notes: None,
    }
}

fn raw_appointment(time: NaiveTime, duration: i64) -> Appointment {
    let now = Utc::now();
    Appointment {
        id: new_id(),
        customer_id: Some("c1".into()),
        customer_name: "Ahmet Yılmaz".into(),
        customer_phone: "0555 123 4567".into(),
        barber_id: "tarik".into(),
        barber_name: "Tarık Bey".into(),
        service_id: "1".into(),
        service_name: "Saç Kesimi".into(),
        service_price: 150,
        service_duration: duration,
        date: booking_day(),
        time,
        start_min: i64::from(minute_of_day(time)),
        end_min: i64::from(span_end_minute(time, duration)),
        status: AppointmentStatus::Pending,
        notes: None,
        created_at: now,
        updated_at: now,
    }
}

async fn sqlite_store() -> SqliteAppointmentStore {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    sqlx::query("INSERT INTO barbers (id, name, is_owner) VALUES ('tarik', 'Tarık Bey', 1)")
        .execute(&pool)
        .await
        .unwrap();
    SqliteAppointmentStore::new(pool)
}

#[actix_web::test]
async fn a_booking_day_at_the_shop() {
    let store = InMemoryAppointmentStore::new();
    let services = services();
    let barbers = barbers();
    let policy = BookingPolicy::default();
    let ctx = BookingContext {
        services: &services,
        barbers: &barbers,
        policy: &policy,
        today: booking_day(),
    };

    // Ahmet books 10:00 with Tarık.
    let appointment = workflow::book(&store, &ctx, &customer(), intent(at(10, 0), "1"))
        .await
        .unwrap();
    assert_eq!(appointment.status, AppointmentStatus::Pending);

    // A second request for the identical slot loses.
    let err = workflow::book(&store, &ctx, &customer(), intent(at(10, 0), "1"))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Conflict { .. }));

    // Tarık accepts.
    let confirmed = lifecycle::apply(&store, &barber_tarik(), &appointment.id, AppointmentStatus::Confirmed)
        .await
        .unwrap();
    assert_eq!(confirmed.status, AppointmentStatus::Confirmed);

    // The customer cannot mark their own visit as done.
    let err = lifecycle::apply(&store, &customer(), &appointment.id, AppointmentStatus::Completed)
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Forbidden { .. }));

    // Tarık can, after the cut.
    let completed = lifecycle::apply(&store, &barber_tarik(), &appointment.id, AppointmentStatus::Completed)
        .await
        .unwrap();
    assert_eq!(completed.status, AppointmentStatus::Completed);
    assert!(completed.updated_at >= appointment.updated_at);

    // Completed is terminal.
    let err = lifecycle::apply(&store, &barber_tarik(), &appointment.id, AppointmentStatus::Pending)
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::InvalidTransition { .. }));
}

#[actix_web::test]
async fn hour_long_package_blocks_the_half_hour() {
    let store = InMemoryAppointmentStore::new();
    let services = services();
    let barbers = barbers();
    let policy = BookingPolicy::default();
    let ctx = BookingContext {
        services: &services,
        barbers: &barbers,
        policy: &policy,
        today: booking_day(),
    };

    workflow::book(&store, &ctx, &customer(), intent(at(10, 0), "5"))
        .await
        .unwrap();

    let err = workflow::book(&store, &ctx, &customer(), intent(at(10, 30), "1"))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Conflict { .. }));

    workflow::book(&store, &ctx, &customer(), intent(at(11, 0), "1"))
        .await
        .unwrap();
}

#[actix_web::test]
async fn cancelling_reopens_the_slot() {
    let store = InMemoryAppointmentStore::new();
    let services = services();
    let barbers = barbers();
    let policy = BookingPolicy::default();
    let ctx = BookingContext {
        services: &services,
        barbers: &barbers,
        policy: &policy,
        today: booking_day(),
    };

    let appointment = workflow::book(&store, &ctx, &customer(), intent(at(10, 0), "1"))
        .await
        .unwrap();
    lifecycle::apply(&store, &barber_tarik(), &appointment.id, AppointmentStatus::Confirmed)
        .await
        .unwrap();
    lifecycle::apply(&store, &customer(), &appointment.id, AppointmentStatus::Cancelled)
        .await
        .unwrap();

    // The identical slot books again.
    let again = workflow::book(&store, &ctx, &customer(), intent(at(10, 0), "1"))
        .await
        .unwrap();
    assert_ne!(again.id, appointment.id);
}

#[actix_web::test]
async fn concurrent_creates_admit_exactly_one_memory() {
    let store = Arc::new(InMemoryAppointmentStore::new());

    let attempts = (0..8).map(|_| {
        let store = Arc::clone(&store);
        let appointment = raw_appointment(at(10, 0), 30);
        async move { store.create(appointment).await }
    });
    let results = join_all(attempts).await;

    let successes = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(BookingError::Conflict { .. })))
        .count();
    assert_eq!(successes, 1);
    assert_eq!(conflicts, 7);
}

#[actix_web::test]
async fn concurrent_creates_admit_exactly_one_sqlite() {
    let store = Arc::new(sqlite_store().await);

    let attempts = (0..8).map(|_| {
        let store = Arc::clone(&store);
        let appointment = raw_appointment(at(10, 0), 30);
        async move { store.create(appointment).await }
    });
    let results = join_all(attempts).await;

    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    assert!(results
        .iter()
        .all(|r| r.is_ok() || matches!(r, Err(BookingError::Conflict { .. }))));
}

#[actix_web::test]
async fn racing_overlapping_spans_admit_exactly_one() {
    // A 60-minute span at 10:00 and a 30-minute span at 10:30 overlap; no
    // interleaving may admit both.
    let store = Arc::new(InMemoryAppointmentStore::new());

    let long = store.create(raw_appointment(at(10, 0), 60));
    let short = store.create(raw_appointment(at(10, 30), 30));
    let (long, short) = futures::join!(long, short);

    let successes = [&long, &short].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
}

#[actix_web::test]
async fn concurrent_confirms_apply_once() {
    let store = Arc::new(sqlite_store().await);
    let appointment = store.create(raw_appointment(at(10, 0), 30)).await.unwrap();

    let attempts = (0..4).map(|_| {
        let store = Arc::clone(&store);
        let id = appointment.id.clone();
        async move {
            store
                .compare_and_set_status(
                    &id,
                    AppointmentStatus::Pending,
                    AppointmentStatus::Confirmed,
                    Utc::now(),
                )
                .await
        }
    });
    let results = join_all(attempts).await;

    let hits = results
        .iter()
        .filter(|r| matches!(r, Ok(Some(_))))
        .count();
    assert_eq!(hits, 1);
}

use std::env;
use std::str::FromStr;
use std::sync::Arc;

use actix_web::{middleware, web, App, HttpServer};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tokio::sync::broadcast;

use tyhair_booking::catalog::DEFAULT_WINDOW_DAYS;
use tyhair_booking::db;
use tyhair_booking::notify::WhatsappConfig;
use tyhair_booking::routes;
use tyhair_booking::state::AppState;
use tyhair_booking::store::SqliteAppointmentStore;
use tyhair_booking::workflow::BookingPolicy;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(err) = run().await {
        eprintln!("Startup error: {err}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let db_url =
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://./data/tyhair.db".to_string());
    db::ensure_sqlite_dir(&db_url)?;

    let connect_options = SqliteConnectOptions::from_str(&db_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(connect_options)
        .await?;

    db::run_migrations(&pool).await?;
    db::seed_defaults(&pool).await?;

    let policy = BookingPolicy {
        window_days: env::var("BOOKING_WINDOW_DAYS")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_WINDOW_DAYS),
        barber_auto_confirm: env::var("BARBER_BOOKING_AUTO_CONFIRM")
            .map(|value| value != "false")
            .unwrap_or(true),
    };
    let whatsapp = WhatsappConfig {
        default_number: env::var("WHATSAPP_NUMBER")
            .unwrap_or_else(|_| WhatsappConfig::default().default_number),
    };

    let (events, _) = broadcast::channel(64);
    let state = AppState {
        db: pool.clone(),
        store: Arc::new(SqliteAppointmentStore::new(pool)),
        events,
        policy,
        whatsapp,
    };

    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(8080);

    let address = format!("0.0.0.0:{port}");
    log::info!("Starting TY-HAIR booking on http://{address}");

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(middleware::Logger::default())
            .configure(routes::public::configure)
            .configure(routes::customer::configure)
            .configure(routes::barber::configure)
            .configure(routes::events::configure)
    })
    .bind(address)?
    .run()
    .await?;

    Ok(())
}

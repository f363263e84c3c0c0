use std::{env, fs, path::Path};

use chrono::Utc;
use sqlx::SqlitePool;

use crate::auth::{hash_password, new_id};
use crate::models::{Barber, Service, ROLE_BARBER};

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

pub fn ensure_sqlite_dir(db_url: &str) -> std::io::Result<()> {
    let path = db_url
        .strip_prefix("sqlite://")
        .or_else(|| db_url.strip_prefix("sqlite:"));

    let Some(path) = path else {
        return Ok(());
    };

    let path = path.split('?').next().unwrap_or(path);
    if path == ":memory:" || path.is_empty() {
        return Ok(());
    }

    let path = path.strip_prefix("file:").unwrap_or(path);
    if let Some(parent) = Path::new(path).parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Shop reference data: the barber roster, the service catalog, and one
/// login per barber. Idempotent; existing rows are left alone so catalog
/// edits made at runtime survive restarts.
pub async fn seed_defaults(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    seed_barbers(pool).await?;
    seed_services(pool).await?;
    seed_barber_accounts(pool).await?;
    Ok(())
}

pub async fn log_activity(
    pool: &SqlitePool,
    kind: &str,
    message: &str,
    user_id: Option<&str>,
    appointment_id: Option<&str>,
) {
    let _ = sqlx::query(
        r#"INSERT INTO activities (id, kind, message, created_at, user_id, appointment_id)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
    )
    .bind(new_id())
    .bind(kind)
    .bind(message)
    .bind(Utc::now().to_rfc3339())
    .bind(user_id)
    .bind(appointment_id)
    .execute(pool)
    .await;
}

pub async fn fetch_services(pool: &SqlitePool) -> Result<Vec<Service>, sqlx::Error> {
    sqlx::query_as::<_, Service>(
        "SELECT id, name, description, price, duration_min, active, sort_order
         FROM services WHERE active = 1 ORDER BY sort_order",
    )
    .fetch_all(pool)
    .await
}

pub async fn fetch_barbers(pool: &SqlitePool) -> Result<Vec<Barber>, sqlx::Error> {
    sqlx::query_as::<_, Barber>(
        "SELECT id, name, is_owner, whatsapp_number FROM barbers ORDER BY is_owner DESC, name",
    )
    .fetch_all(pool)
    .await
}

#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct ActivityRow {
    pub message: String,
    pub created_at: String,
}

pub async fn fetch_recent_activity(
    pool: &SqlitePool,
    limit: i64,
) -> Result<Vec<ActivityRow>, sqlx::Error> {
    sqlx::query_as::<_, ActivityRow>(
        "SELECT message, created_at FROM activities ORDER BY created_at DESC LIMIT ?1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

async fn seed_barbers(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let roster = [
        ("tarik", "Tarık Bey", true),
        ("omer", "ÖMER JR", false),
    ];
    for (id, name, is_owner) in roster {
        sqlx::query(
            r#"INSERT INTO barbers (id, name, is_owner, whatsapp_number)
               VALUES (?1, ?2, ?3, NULL)
               ON CONFLICT(id) DO NOTHING"#,
        )
        .bind(id)
        .bind(name)
        .bind(is_owner)
        .execute(pool)
        .await?;
    }
    Ok(())
}

async fn seed_services(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let catalog = [
        ("1", "Saç Kesimi", "Klasik saç kesimi ve yıkama", 150, 30, 1),
        ("2", "Sakal Kesimi", "Sakal şekillendirme ve bakım", 80, 20, 2),
        ("3", "Saç + Sakal Paket", "Saç kesimi ve sakal kesimi bir arada", 200, 45, 3),
        ("4", "Cilt Bakımı", "Yüz maskesi ve cilt bakımı", 100, 25, 4),
        ("5", "Tam Bakım Paket", "Saç, sakal ve cilt bakımı komple", 280, 60, 5),
    ];
    for (id, name, description, price, duration_min, sort_order) in catalog {
        sqlx::query(
            r#"INSERT INTO services (id, name, description, price, duration_min, active, sort_order)
               VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)
               ON CONFLICT(id) DO NOTHING"#,
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(duration_min)
        .bind(sort_order)
        .execute(pool)
        .await?;
    }
    Ok(())
}

async fn seed_barber_accounts(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let barbers = fetch_barbers(pool).await?;
    for barber in barbers {
        let exists = sqlx::query_as::<_, (String,)>(
            "SELECT id FROM users WHERE barber_id = ?1 LIMIT 1",
        )
        .bind(&barber.id)
        .fetch_optional(pool)
        .await?;
        if exists.is_some() {
            continue;
        }

        let password_var = format!("BARBER_{}_PASSWORD", barber.id.to_uppercase());
        let password = env::var(&password_var).unwrap_or_else(|_| "change-me".to_string());
        if password == "change-me" {
            log::warn!(
                "{password_var} not set. Using default password 'change-me' for {}. Set it in production.",
                barber.id
            );
        }

        let password_hash = hash_password(&password)
            .map_err(|_| sqlx::Error::Protocol("password hash failed".into()))?;
        sqlx::query(
            r#"INSERT INTO users (id, username, display_name, phone, role, password_hash, active, barber_id, created_at)
               VALUES (?1, ?2, ?3, NULL, ?4, ?5, 1, ?6, ?7)"#,
        )
        .bind(new_id())
        .bind(&barber.id)
        .bind(&barber.name)
        .bind(ROLE_BARBER)
        .bind(password_hash)
        .bind(&barber.id)
        .bind(Utc::now().to_rfc3339())
        .execute(pool)
        .await?;
    }
    Ok(())
}

use actix_web::{
    dev::ServiceRequest, error::ErrorUnauthorized, web, Error, HttpMessage,
};
use actix_web_httpauth::extractors::basic::BasicAuth;
use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand_core::OsRng;
use uuid::Uuid;

use crate::models::{Actor, Role};
use crate::state::AppState;

pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(_) => false,
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AuthRow {
    id: String,
    display_name: String,
    phone: Option<String>,
    role: String,
    password_hash: String,
    barber_id: Option<String>,
    is_owner: bool,
}

pub async fn authenticate_credentials(
    state: &AppState,
    username: &str,
    password: &str,
) -> Option<Actor> {
    let row = sqlx::query_as::<_, AuthRow>(
        r#"SELECT u.id, u.display_name, u.phone, u.role, u.password_hash, u.barber_id,
                  COALESCE(b.is_owner, 0) AS is_owner
           FROM users u
           LEFT JOIN barbers b ON u.barber_id = b.id
           WHERE u.username = ?1 AND u.active = 1
           LIMIT 1"#,
    )
    .bind(username)
    .fetch_optional(&state.db)
    .await
    .ok()??;

    if !verify_password(password, &row.password_hash) {
        return None;
    }
    let role = Role::parse(&row.role)?;

    Some(Actor {
        user_id: row.id,
        display_name: row.display_name,
        phone: row.phone,
        role,
        barber_id: row.barber_id,
        is_owner: row.is_owner,
    })
}

async fn authenticate(req: &ServiceRequest, credentials: &BasicAuth) -> Result<Actor, Error> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| ErrorUnauthorized("Unauthorized"))?;
    let username = credentials.user_id();
    let password = credentials.password().unwrap_or_default();
    authenticate_credentials(state, username, password)
        .await
        .ok_or_else(|| ErrorUnauthorized("Unauthorized"))
}

pub async fn customer_validator(
    req: ServiceRequest,
    credentials: BasicAuth,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    match authenticate(&req, &credentials).await {
        Ok(actor) => {
            if actor.role != Role::Customer {
                return Err((ErrorUnauthorized("Customer access required"), req));
            }
            req.extensions_mut().insert(actor);
            Ok(req)
        }
        Err(err) => Err((err, req)),
    }
}

pub async fn barber_validator(
    req: ServiceRequest,
    credentials: BasicAuth,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    match authenticate(&req, &credentials).await {
        Ok(actor) => {
            if actor.role != Role::Barber {
                return Err((ErrorUnauthorized("Barber access required"), req));
            }
            req.extensions_mut().insert(actor);
            Ok(req)
        }
        Err(err) => Err((err, req)),
    }
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip() {
        let hash = hash_password("kuaför-2026").unwrap();
        assert!(verify_password("kuaför-2026", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }
}

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use thiserror::Error;

use crate::models::{AppointmentStatus, Role};

/// Every engine operation returns one of these; handlers propagate with `?`
/// and the `ResponseError` impl below picks the status code and JSON body.
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("slot {time} on {date} is no longer available")]
    Conflict { date: NaiveDate, time: NaiveTime },

    #[error("cannot move an appointment from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("appointment not found")]
    NotFound,

    #[error("a {role} may not {action}")]
    Forbidden { role: Role, action: String },

    #[error("{date} is outside the booking window")]
    InvalidDate { date: NaiveDate },

    #[error("{time} is not a bookable slot")]
    InvalidTime { time: NaiveTime },

    #[error("unknown barber {0}")]
    UnknownBarber(String),

    #[error("unknown service {0}")]
    UnknownService(String),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl BookingError {
    pub fn forbidden(role: Role, action: impl Into<String>) -> Self {
        BookingError::Forbidden {
            role,
            action: action.into(),
        }
    }

    /// Machine-readable discriminant for API clients.
    pub fn code(&self) -> &'static str {
        match self {
            BookingError::Conflict { .. } => "conflict",
            BookingError::InvalidTransition { .. } => "invalid_transition",
            BookingError::NotFound => "not_found",
            BookingError::Forbidden { .. } => "forbidden",
            BookingError::InvalidDate { .. } => "invalid_date",
            BookingError::InvalidTime { .. } => "invalid_time",
            BookingError::UnknownBarber(_) => "unknown_barber",
            BookingError::UnknownService(_) => "unknown_service",
            BookingError::Storage(_) => "storage",
        }
    }

    /// Only backend hiccups are worth an automatic retry. A `Conflict` is a
    /// definitive answer and must reach the caller untouched.
    pub fn is_transient(&self) -> bool {
        match self {
            BookingError::Storage(sqlx::Error::Io(_))
            | BookingError::Storage(sqlx::Error::PoolTimedOut) => true,
            BookingError::Storage(sqlx::Error::Database(db)) => {
                let message = db.message();
                message.contains("database is locked") || message.contains("database is busy")
            }
            _ => false,
        }
    }
}

impl ResponseError for BookingError {
    fn status_code(&self) -> StatusCode {
        match self {
            BookingError::Conflict { .. } => StatusCode::CONFLICT,
            BookingError::NotFound => StatusCode::NOT_FOUND,
            BookingError::Forbidden { .. } => StatusCode::FORBIDDEN,
            BookingError::InvalidTransition { .. }
            | BookingError::InvalidDate { .. }
            | BookingError::InvalidTime { .. }
            | BookingError::UnknownBarber(_)
            | BookingError::UnknownService(_) => StatusCode::UNPROCESSABLE_ENTITY,
            BookingError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            BookingError::Storage(err) => {
                log::error!("storage failure: {err}");
                "temporary storage failure, please try again".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({
            "error": message,
            "code": self.code(),
        }))
    }
}

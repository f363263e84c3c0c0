//! Appointment status lifecycle: the transition table, who may drive each
//! edge, and the compare-and-set application against the store.

use chrono::Utc;

use crate::error::BookingError;
use crate::models::{Actor, Appointment, AppointmentStatus, Role};
use crate::store::AppointmentRepository;

use AppointmentStatus::{Cancelled, Completed, Confirmed, Pending};

/// Allowed edges and the roles permitted to drive them. Everything absent
/// from this table is an invalid transition; terminal states have no rows.
const EDGES: &[(AppointmentStatus, AppointmentStatus, &[Role])] = &[
    (Pending, Confirmed, &[Role::Barber]),
    (Pending, Cancelled, &[Role::Barber, Role::Customer]),
    (Confirmed, Completed, &[Role::Barber]),
    (Confirmed, Cancelled, &[Role::Barber, Role::Customer]),
];

pub fn transition_allowed(from: AppointmentStatus, to: AppointmentStatus) -> bool {
    EDGES.iter().any(|(f, t, _)| *f == from && *t == to)
}

fn roles_for(from: AppointmentStatus, to: AppointmentStatus) -> Option<&'static [Role]> {
    EDGES
        .iter()
        .find(|(f, t, _)| *f == from && *t == to)
        .map(|(_, _, roles)| *roles)
}

/// Checks the edge exists and the actor's role may drive it.
pub fn validate(role: Role, from: AppointmentStatus, to: AppointmentStatus) -> Result<(), BookingError> {
    match roles_for(from, to) {
        None => Err(BookingError::InvalidTransition { from, to }),
        Some(roles) if roles.contains(&role) => Ok(()),
        Some(_) => Err(BookingError::forbidden(
            role,
            format!("move an appointment from {from} to {to}"),
        )),
    }
}

/// A customer may only touch their own appointments; a barber only their own
/// column, unless they own the shop.
fn check_ownership(actor: &Actor, appointment: &Appointment) -> Result<(), BookingError> {
    let owns = match actor.role {
        Role::Customer => appointment.customer_id.as_deref() == Some(actor.user_id.as_str()),
        Role::Barber => {
            actor.is_owner || actor.barber_id.as_deref() == Some(appointment.barber_id.as_str())
        }
    };
    if owns {
        Ok(())
    } else {
        Err(BookingError::forbidden(
            actor.role,
            "manage someone else's appointment",
        ))
    }
}

/// Applies a transition and returns the post-mutation snapshot.
///
/// The store-level compare-and-set is keyed on the status we validated
/// against, so a concurrent transition cannot be overwritten: when the CAS
/// misses we re-read and report the transition against the observed state.
pub async fn apply(
    store: &dyn AppointmentRepository,
    actor: &Actor,
    appointment_id: &str,
    to: AppointmentStatus,
) -> Result<Appointment, BookingError> {
    let current = store
        .get(appointment_id)
        .await?
        .ok_or(BookingError::NotFound)?;

    check_ownership(actor, &current)?;
    validate(actor.role, current.status, to)?;

    match store
        .compare_and_set_status(appointment_id, current.status, to, Utc::now())
        .await?
    {
        Some(updated) => Ok(updated),
        None => {
            let observed = store
                .get(appointment_id)
                .await?
                .ok_or(BookingError::NotFound)?;
            Err(BookingError::InvalidTransition {
                from: observed.status,
                to,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed_pairs() -> Vec<(AppointmentStatus, AppointmentStatus)> {
        vec![
            (Pending, Confirmed),
            (Pending, Cancelled),
            (Confirmed, Completed),
            (Confirmed, Cancelled),
        ]
    }

    #[test]
    fn table_is_complete_over_the_full_matrix() {
        let allowed = allowed_pairs();
        for from in AppointmentStatus::ALL {
            for to in AppointmentStatus::ALL {
                let expected = allowed.contains(&(from, to));
                assert_eq!(
                    transition_allowed(from, to),
                    expected,
                    "{from} -> {to} mismatch"
                );
            }
        }
    }

    #[test]
    fn terminal_states_admit_nothing() {
        for from in [Cancelled, Completed] {
            for to in AppointmentStatus::ALL {
                assert!(!transition_allowed(from, to));
            }
        }
    }

    #[test]
    fn barbers_drive_every_edge() {
        for (from, to) in allowed_pairs() {
            assert!(validate(Role::Barber, from, to).is_ok());
        }
    }

    #[test]
    fn customers_may_only_cancel() {
        assert!(validate(Role::Customer, Pending, Cancelled).is_ok());
        assert!(validate(Role::Customer, Confirmed, Cancelled).is_ok());
        assert!(matches!(
            validate(Role::Customer, Pending, Confirmed),
            Err(BookingError::Forbidden { .. })
        ));
        assert!(matches!(
            validate(Role::Customer, Confirmed, Completed),
            Err(BookingError::Forbidden { .. })
        ));
    }

    #[test]
    fn invalid_edges_beat_role_checks() {
        // completed -> pending is not an edge for anyone, so even a barber
        // gets InvalidTransition, not Forbidden.
        assert!(matches!(
            validate(Role::Barber, Completed, Pending),
            Err(BookingError::InvalidTransition { .. })
        ));
    }
}

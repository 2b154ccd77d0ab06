//! Appointment service - the scheduling and presence workflow.
//!
//! # Transitions
//!
//! - `created -> confirmed`: administrators or the security sector only
//! - `confirmed -> attended`: requires `confirmed = true` and the scheduled
//!   day to have arrived
//!
//! Each transition is a single conditional UPDATE whose WHERE clause repeats
//! the precondition, so two concurrent requests cannot both apply it.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    middleware::auth::AuthContext,
    models::appointment::{Appointment, AppointmentQuery, CreateAppointmentRequest},
};

/// Reject callers that may not confirm appointments.
pub fn ensure_can_confirm(auth: &AuthContext) -> Result<(), AppError> {
    if auth.can_confirm() {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Only administrators or the security sector may confirm appointments".to_string(),
        ))
    }
}

/// Precondition for `created -> confirmed`.
pub fn check_confirmable(appointment: &Appointment) -> Result<(), AppError> {
    if appointment.confirmed {
        return Err(AppError::Conflict(
            "Appointment is already confirmed".to_string(),
        ));
    }
    Ok(())
}

/// Precondition for `confirmed -> attended`.
pub fn check_presence(appointment: &Appointment, today: NaiveDate) -> Result<(), AppError> {
    if !appointment.confirmed {
        return Err(AppError::InvalidRequest(
            "Appointment must be confirmed before presence is registered".to_string(),
        ));
    }
    if appointment.attended {
        return Err(AppError::Conflict(
            "Presence was already registered for this appointment".to_string(),
        ));
    }
    if appointment.scheduled_at.date_naive() > today {
        return Err(AppError::InvalidRequest(
            "Appointment is scheduled for a later date".to_string(),
        ));
    }
    Ok(())
}

/// Schedule a new appointment in the `created` state.
pub async fn create_appointment(
    pool: &DbPool,
    auth: &AuthContext,
    mut request: CreateAppointmentRequest,
    now: DateTime<Utc>,
) -> Result<Appointment, AppError> {
    request.validate(now)?;

    let appointment = sqlx::query_as::<_, Appointment>(
        r#"
        INSERT INTO agendamentos (
            ong_id,
            visitor_name,
            cpf,
            sector_id,
            responsible,
            scheduled_at,
            observation
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(&auth.ong_id)
    .bind(request.visitor_name.trim())
    .bind(&request.cpf)
    .bind(request.sector_id)
    .bind(request.responsible.trim())
    .bind(request.scheduled_at)
    .bind(request.observation)
    .fetch_one(pool)
    .await?;

    tracing::info!(
        appointment_id = %appointment.id,
        ong_id = %auth.ong_id,
        scheduled_at = %appointment.scheduled_at,
        "Appointment created"
    );

    Ok(appointment)
}

/// List appointments in scheduling order, optionally filtered by day and status.
pub async fn list_appointments(
    pool: &DbPool,
    query: &AppointmentQuery,
) -> Result<Vec<Appointment>, AppError> {
    let (confirmed, attended) = match query.status {
        Some(status) => {
            let (c, a) = status.flags();
            (Some(c), Some(a))
        }
        None => (None, None),
    };

    let appointments = sqlx::query_as::<_, Appointment>(
        r#"
        SELECT * FROM agendamentos
        WHERE ($1::date IS NULL OR (scheduled_at AT TIME ZONE 'UTC')::date = $1)
          AND ($2::boolean IS NULL OR confirmed = $2)
          AND ($3::boolean IS NULL OR attended = $3)
        ORDER BY scheduled_at ASC
        "#,
    )
    .bind(query.date)
    .bind(confirmed)
    .bind(attended)
    .fetch_all(pool)
    .await?;

    Ok(appointments)
}

pub async fn get_appointment(pool: &DbPool, id: Uuid) -> Result<Appointment, AppError> {
    sqlx::query_as::<_, Appointment>("SELECT * FROM agendamentos WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Appointment"))
}

/// Confirm an appointment (`created -> confirmed`).
///
/// # Errors
///
/// - `Forbidden`: caller is neither ADM nor in the security sector
/// - `NotFound`: no appointment with this id
/// - `Conflict`: already confirmed
pub async fn confirm_appointment(
    pool: &DbPool,
    auth: &AuthContext,
    id: Uuid,
) -> Result<Appointment, AppError> {
    ensure_can_confirm(auth)?;

    let appointment = get_appointment(pool, id).await?;
    check_confirmable(&appointment)?;

    let confirmed = sqlx::query_as::<_, Appointment>(
        r#"
        UPDATE agendamentos
        SET confirmed = true,
            confirmed_by = $2,
            confirmed_at = NOW()
        WHERE id = $1 AND confirmed = false
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&auth.ong_id)
    .fetch_optional(pool)
    .await?
    // Lost a race with another confirmation
    .ok_or_else(|| AppError::Conflict("Appointment is already confirmed".to_string()))?;

    tracing::info!(appointment_id = %id, confirmed_by = %auth.ong_id, "Appointment confirmed");

    Ok(confirmed)
}

/// Register the visitor's presence (`confirmed -> attended`).
///
/// # Errors
///
/// - `NotFound`: no appointment with this id
/// - `InvalidRequest`: not confirmed yet, or scheduled for a later day
/// - `Conflict`: presence already registered
pub async fn register_presence(
    pool: &DbPool,
    auth: &AuthContext,
    id: Uuid,
    today: NaiveDate,
) -> Result<Appointment, AppError> {
    let appointment = get_appointment(pool, id).await?;
    check_presence(&appointment, today)?;

    let attended = sqlx::query_as::<_, Appointment>(
        r#"
        UPDATE agendamentos
        SET attended = true,
            attended_at = NOW()
        WHERE id = $1 AND confirmed = true AND attended = false
        RETURNING *
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| {
        AppError::Conflict("Presence was already registered for this appointment".to_string())
    })?;

    tracing::info!(appointment_id = %id, ong_id = %auth.ong_id, "Appointment attended");

    Ok(attended)
}

/// Delete an appointment. Only its creator or an administrator may do so.
pub async fn delete_appointment(pool: &DbPool, auth: &AuthContext, id: Uuid) -> Result<(), AppError> {
    let appointment = get_appointment(pool, id).await?;
    auth.require_owner(&appointment.ong_id)?;

    sqlx::query("DELETE FROM agendamentos WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    tracing::info!(appointment_id = %id, ong_id = %auth.ong_id, "Appointment deleted");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::account::{Role, SECURITY_SECTOR};
    use chrono::{Duration, TimeZone};

    fn appointment(confirmed: bool, attended: bool, scheduled_at: DateTime<Utc>) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            ong_id: "1a2b3c4d".into(),
            visitor_name: "Maria Silva".into(),
            cpf: "52998224725".into(),
            sector_id: 2,
            responsible: "João".into(),
            scheduled_at,
            observation: None,
            confirmed,
            confirmed_by: confirmed.then(|| "cafebabe".to_string()),
            confirmed_at: confirmed.then(Utc::now),
            attended,
            attended_at: attended.then(Utc::now),
            created_at: Utc::now(),
        }
    }

    fn auth(role: Role, sector_id: i32) -> AuthContext {
        AuthContext {
            ong_id: "cafebabe".into(),
            name: "Portaria".into(),
            role,
            sector_id,
        }
    }

    fn noon(day: NaiveDate) -> DateTime<Utc> {
        Utc.from_utc_datetime(&day.and_hms_opt(12, 0, 0).unwrap())
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
    }

    #[test]
    fn only_admins_and_security_sector_confirm() {
        assert!(ensure_can_confirm(&auth(Role::Admin, 1)).is_ok());
        assert!(ensure_can_confirm(&auth(Role::User, SECURITY_SECTOR)).is_ok());
        assert!(matches!(
            ensure_can_confirm(&auth(Role::User, 3)),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn confirming_twice_conflicts() {
        assert!(check_confirmable(&appointment(false, false, noon(today()))).is_ok());
        assert!(matches!(
            check_confirmable(&appointment(true, false, noon(today()))),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn presence_requires_confirmation() {
        let unconfirmed = appointment(false, false, noon(today()));
        assert!(matches!(
            check_presence(&unconfirmed, today()),
            Err(AppError::InvalidRequest(_))
        ));
    }

    #[test]
    fn presence_is_registered_once() {
        let attended = appointment(true, true, noon(today()));
        assert!(matches!(
            check_presence(&attended, today()),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn presence_waits_for_the_scheduled_day() {
        let tomorrow = appointment(true, false, noon(today()) + Duration::days(1));
        assert!(matches!(
            check_presence(&tomorrow, today()),
            Err(AppError::InvalidRequest(_))
        ));

        let later_today = appointment(true, false, noon(today()) + Duration::hours(6));
        assert!(check_presence(&later_today, today()).is_ok());

        let yesterday = appointment(true, false, noon(today()) - Duration::days(1));
        assert!(check_presence(&yesterday, today()).is_ok());
    }
}

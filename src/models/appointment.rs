//! Appointment (`agendamentos`) data models and API request/response types.
//!
//! # Lifecycle
//!
//! ```text
//! created --confirm--> confirmed --presence--> attended
//! ```
//!
//! The state is stored as two booleans, `confirmed` and `attended`; the
//! database rejects `attended` without `confirmed`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::validation::{self, ValidationError};

/// Represents a row of the `agendamentos` table.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Appointment {
    pub id: Uuid,

    /// Account that scheduled the visit
    pub ong_id: String,

    pub visitor_name: String,

    /// 11 bare digits
    pub cpf: String,

    pub sector_id: i32,

    /// Employee receiving the visitor
    pub responsible: String,

    pub scheduled_at: DateTime<Utc>,
    pub observation: Option<String>,

    pub confirmed: bool,
    pub confirmed_by: Option<String>,
    pub confirmed_at: Option<DateTime<Utc>>,

    pub attended: bool,
    pub attended_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

impl Appointment {
    pub fn status(&self) -> AppointmentStatus {
        AppointmentStatus::from_flags(self.confirmed, self.attended)
    }
}

/// Position of an appointment in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Created,
    Confirmed,
    Attended,
}

impl AppointmentStatus {
    pub fn from_flags(confirmed: bool, attended: bool) -> Self {
        match (confirmed, attended) {
            (_, true) => AppointmentStatus::Attended,
            (true, false) => AppointmentStatus::Confirmed,
            (false, false) => AppointmentStatus::Created,
        }
    }

    /// The `(confirmed, attended)` column values for this status.
    pub fn flags(self) -> (bool, bool) {
        match self {
            AppointmentStatus::Created => (false, false),
            AppointmentStatus::Confirmed => (true, false),
            AppointmentStatus::Attended => (true, true),
        }
    }
}

/// Request body for `POST /agendamentos`.
///
/// ```json
/// {
///   "visitor_name": "Maria Silva",
///   "cpf": "529.982.247-25",
///   "sector_id": 2,
///   "responsible": "João",
///   "scheduled_at": "2025-07-01T14:00:00Z",
///   "observation": "Reunião de contrato"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct CreateAppointmentRequest {
    pub visitor_name: String,
    pub cpf: String,
    pub sector_id: i32,
    pub responsible: String,
    pub scheduled_at: DateTime<Utc>,
    pub observation: Option<String>,
}

impl CreateAppointmentRequest {
    /// Validate the body and normalise the CPF to bare digits.
    ///
    /// Appointments cannot be scheduled in the past.
    pub fn validate(&mut self, now: DateTime<Utc>) -> Result<(), ValidationError> {
        validation::required("visitor_name", &self.visitor_name, 120)?;
        self.cpf = validation::cpf(&self.cpf)?;
        validation::sector(self.sector_id)?;
        validation::required("responsible", &self.responsible, 120)?;
        validation::optional("observation", self.observation.as_deref(), 500)?;

        if self.scheduled_at < now {
            return Err(ValidationError::InvalidFormat {
                field: "scheduled_at",
                reason: "cannot be in the past",
            });
        }
        Ok(())
    }
}

/// Query string for `GET /agendamentos`.
#[derive(Debug, Default, Deserialize)]
pub struct AppointmentQuery {
    /// Only appointments scheduled on this (UTC) day
    pub date: Option<NaiveDate>,

    pub status: Option<AppointmentStatus>,
}

/// Response body for appointment endpoints: the row plus its derived status.
#[derive(Debug, Serialize)]
pub struct AppointmentResponse {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub status: AppointmentStatus,
}

impl From<Appointment> for AppointmentResponse {
    fn from(appointment: Appointment) -> Self {
        let status = appointment.status();
        Self {
            appointment,
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn request(scheduled_at: DateTime<Utc>) -> CreateAppointmentRequest {
        CreateAppointmentRequest {
            visitor_name: "Maria Silva".into(),
            cpf: "52998224725".into(),
            sector_id: 2,
            responsible: "João".into(),
            scheduled_at,
            observation: None,
        }
    }

    #[test]
    fn status_follows_flags() {
        assert_eq!(AppointmentStatus::from_flags(false, false), AppointmentStatus::Created);
        assert_eq!(AppointmentStatus::from_flags(true, false), AppointmentStatus::Confirmed);
        assert_eq!(AppointmentStatus::from_flags(true, true), AppointmentStatus::Attended);

        for status in [
            AppointmentStatus::Created,
            AppointmentStatus::Confirmed,
            AppointmentStatus::Attended,
        ] {
            let (confirmed, attended) = status.flags();
            assert_eq!(AppointmentStatus::from_flags(confirmed, attended), status);
        }
    }

    #[test]
    fn past_appointments_are_rejected() {
        let now = Utc::now();
        assert!(request(now - Duration::hours(1)).validate(now).is_err());
        assert!(request(now + Duration::hours(1)).validate(now).is_ok());
    }

    #[test]
    fn invalid_cpf_is_rejected() {
        let now = Utc::now();
        let mut req = request(now + Duration::days(1));
        req.cpf = "52998224700".into();
        assert!(req.validate(now).is_err());
    }

    #[test]
    fn query_parses_date_and_status() {
        let query: AppointmentQuery =
            serde_json::from_str(r#"{"date":"2025-07-01","status":"confirmed"}"#).unwrap();
        assert_eq!(query.date, NaiveDate::from_ymd_opt(2025, 7, 1));
        assert_eq!(query.status, Some(AppointmentStatus::Confirmed));
    }
}

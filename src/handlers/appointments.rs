//! Appointment HTTP handlers.
//!
//! - GET /agendamentos - List appointments
//! - POST /agendamentos - Schedule an appointment
//! - PUT /agendamentos/{id}/confirmar - Confirm (ADM or security sector)
//! - PUT /agendamentos/{id}/presenca - Register presence (confirmed only)
//! - DELETE /agendamentos/{id} - Delete (creator or ADM)

use crate::{
    db::DbPool,
    error::AppError,
    extract::{Json, Path, Query},
    middleware::auth::AuthContext,
    models::appointment::{AppointmentQuery, AppointmentResponse, CreateAppointmentRequest},
    services::appointment_service,
};
use axum::{Extension, extract::State, http::StatusCode};
use chrono::Utc;
use uuid::Uuid;

/// List appointments ordered by scheduled time.
///
/// # Query Parameters
///
/// - `date` - `YYYY-MM-DD`, only appointments on that day
/// - `status` - `created`, `confirmed` or `attended`
pub async fn list_appointments(
    State(pool): State<DbPool>,
    Query(query): Query<AppointmentQuery>,
) -> Result<Json<Vec<AppointmentResponse>>, AppError> {
    let appointments = appointment_service::list_appointments(&pool, &query).await?;
    Ok(Json(appointments.into_iter().map(Into::into).collect()))
}

/// Schedule an appointment.
///
/// # Request Body
///
/// ```json
/// {
///   "visitor_name": "Maria Silva",
///   "cpf": "529.982.247-25",
///   "sector_id": 2,
///   "responsible": "João",
///   "scheduled_at": "2025-07-01T14:00:00Z"
/// }
/// ```
///
/// # Response
///
/// - **201 Created**: The appointment with `"status": "created"`
/// - **400**: Invalid body or `scheduled_at` in the past
pub async fn create_appointment(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<AppointmentResponse>), AppError> {
    let appointment =
        appointment_service::create_appointment(&pool, &auth, request, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(appointment.into())))
}

/// Confirm an appointment.
///
/// # Response
///
/// - **200 OK**: The appointment with `"status": "confirmed"`
/// - **403**: Caller is neither ADM nor in the security sector
/// - **404**: Appointment doesn't exist
/// - **409**: Already confirmed
pub async fn confirm_appointment(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<AppointmentResponse>, AppError> {
    let appointment =
        appointment_service::confirm_appointment(&pool, &auth, appointment_id).await?;
    Ok(Json(appointment.into()))
}

/// Register the visitor's presence.
///
/// # Response
///
/// - **200 OK**: The appointment with `"status": "attended"`
/// - **400**: Not confirmed yet, or scheduled for a later day
/// - **404**: Appointment doesn't exist
/// - **409**: Presence already registered
pub async fn register_presence(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<AppointmentResponse>, AppError> {
    let appointment = appointment_service::register_presence(
        &pool,
        &auth,
        appointment_id,
        Utc::now().date_naive(),
    )
    .await?;
    Ok(Json(appointment.into()))
}

/// Delete an appointment.
///
/// # Response
///
/// - **204 No Content**
/// - **403**: Caller neither created the appointment nor is ADM
/// - **404**: Appointment doesn't exist
pub async fn delete_appointment(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Path(appointment_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    appointment_service::delete_appointment(&pool, &auth, appointment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

//! Dashboard summary endpoint.

use crate::{db::DbPool, error::AppError};
use axum::{Json, extract::State};
use serde::Serialize;

/// Counters shown on the dashboard. "Today" is the current UTC day.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct DashboardResponse {
    pub total_visitors: i64,
    pub blocked_visitors: i64,
    /// Visitors with an open entry
    pub visitors_inside: i64,
    pub entries_today: i64,
    pub appointments_today: i64,
    /// Appointments still waiting for confirmation
    pub pending_confirmations: i64,
    /// Tickets not yet closed
    pub open_tickets: i64,
}

/// Dashboard handler.
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "total_visitors": 120,
///   "blocked_visitors": 2,
///   "visitors_inside": 7,
///   "entries_today": 31,
///   "appointments_today": 5,
///   "pending_confirmations": 3,
///   "open_tickets": 4
/// }
/// ```
pub async fn dashboard(State(pool): State<DbPool>) -> Result<Json<DashboardResponse>, AppError> {
    let summary = sqlx::query_as::<_, DashboardResponse>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM visitors) AS total_visitors,
            (SELECT COUNT(*) FROM visitors WHERE blocked) AS blocked_visitors,
            (SELECT COUNT(*) FROM history WHERE exit_at IS NULL) AS visitors_inside,
            (SELECT COUNT(*) FROM history
              WHERE (entry_at AT TIME ZONE 'UTC')::date = (NOW() AT TIME ZONE 'UTC')::date)
              AS entries_today,
            (SELECT COUNT(*) FROM agendamentos
              WHERE (scheduled_at AT TIME ZONE 'UTC')::date = (NOW() AT TIME ZONE 'UTC')::date)
              AS appointments_today,
            (SELECT COUNT(*) FROM agendamentos
              WHERE NOT confirmed AND scheduled_at >= NOW()) AS pending_confirmations,
            (SELECT COUNT(*) FROM tickets WHERE status <> 'closed') AS open_tickets
        "#,
    )
    .fetch_one(&pool)
    .await?;

    Ok(Json(summary))
}

//! Helpdesk ticket HTTP handlers.
//!
//! - POST /tickets - Open a ticket
//! - GET /tickets - Tickets visible to the caller
//! - GET /tickets/{id} - Ticket details
//! - PUT /tickets/{id}/status - Change status
//! - DELETE /tickets/{id} - Delete (creator or ADM)

use crate::{
    db::DbPool,
    error::AppError,
    extract::{Json, Path, Query},
    middleware::auth::AuthContext,
    models::ticket::{CreateTicketRequest, Ticket, TicketQuery, UpdateTicketStatusRequest},
    services::ticket_service,
};
use axum::{Extension, extract::State, http::StatusCode};
use uuid::Uuid;

/// Open a ticket addressed to a sector.
pub async fn create_ticket(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CreateTicketRequest>,
) -> Result<(StatusCode, Json<Ticket>), AppError> {
    request.validate()?;

    let ticket = sqlx::query_as::<_, Ticket>(
        r#"
        INSERT INTO tickets (ong_id, sector_id, title, description)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(&auth.ong_id)
    .bind(request.sector_id)
    .bind(request.title.trim())
    .bind(request.description.trim())
    .fetch_one(&pool)
    .await?;

    tracing::info!(ticket_id = %ticket.id, sector_id = ticket.sector_id, "Ticket opened");

    Ok((StatusCode::CREATED, Json(ticket)))
}

/// List tickets the caller opened or that are addressed to the caller's
/// sector; administrators see every ticket. Newest first.
pub async fn list_tickets(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<TicketQuery>,
) -> Result<Json<Vec<Ticket>>, AppError> {
    let tickets = sqlx::query_as::<_, Ticket>(
        r#"
        SELECT * FROM tickets
        WHERE ($1 OR ong_id = $2 OR sector_id = $3)
          AND ($4::text IS NULL OR status = $4)
        ORDER BY created_at DESC
        "#,
    )
    .bind(auth.is_admin())
    .bind(&auth.ong_id)
    .bind(auth.sector_id)
    .bind(query.status.map(|s| s.as_str()))
    .fetch_all(&pool)
    .await?;

    Ok(Json(tickets))
}

/// Get a ticket. Tickets the caller cannot see are reported as 404.
pub async fn get_ticket(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Path(ticket_id): Path<Uuid>,
) -> Result<Json<Ticket>, AppError> {
    Ok(Json(
        ticket_service::get_visible_ticket(&pool, &auth, ticket_id).await?,
    ))
}

/// Change a ticket's status.
///
/// # Response
///
/// - **200 OK**: The updated ticket
/// - **400**: Transition not allowed (e.g. reopening a closed ticket)
/// - **403**: Caller is not the creator, in the target sector or ADM
/// - **404**: Ticket doesn't exist
pub async fn update_ticket_status(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Path(ticket_id): Path<Uuid>,
    Json(request): Json<UpdateTicketStatusRequest>,
) -> Result<Json<Ticket>, AppError> {
    let ticket = ticket_service::update_status(&pool, &auth, ticket_id, request.status).await?;
    Ok(Json(ticket))
}

/// Delete a ticket. Creator or ADM only.
pub async fn delete_ticket(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Path(ticket_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    ticket_service::delete_ticket(&pool, &auth, ticket_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

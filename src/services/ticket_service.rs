//! Helpdesk ticket workflow.

use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    middleware::auth::AuthContext,
    models::ticket::{Ticket, TicketStatus},
};

/// Whether the caller can see (and work on) a ticket: its creator, members of
/// the sector it is addressed to, and administrators.
pub fn can_access(auth: &AuthContext, ticket: &Ticket) -> bool {
    auth.can_manage(&ticket.ong_id) || auth.sector_id == ticket.sector_id
}

/// Validate a status change against the ticket's current status.
pub fn check_transition(current: TicketStatus, next: TicketStatus) -> Result<(), AppError> {
    if current.can_transition_to(next) {
        Ok(())
    } else {
        Err(AppError::InvalidRequest(format!(
            "Cannot move ticket from {} to {}",
            current, next
        )))
    }
}

/// Only accounts that can see a ticket may change its status.
pub fn ensure_can_update(auth: &AuthContext, ticket: &Ticket) -> Result<(), AppError> {
    if can_access(auth, ticket) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Only the creator, the target sector or ADM can change this ticket".to_string(),
        ))
    }
}

async fn find_ticket(pool: &DbPool, id: Uuid) -> Result<Ticket, AppError> {
    sqlx::query_as::<_, Ticket>("SELECT * FROM tickets WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Ticket"))
}

/// Fetch a ticket visible to the caller. Tickets the caller cannot see are
/// reported as missing.
pub async fn get_visible_ticket(
    pool: &DbPool,
    auth: &AuthContext,
    id: Uuid,
) -> Result<Ticket, AppError> {
    let ticket = find_ticket(pool, id).await?;
    if !can_access(auth, &ticket) {
        return Err(AppError::NotFound("Ticket"));
    }
    Ok(ticket)
}

/// Delete a ticket. Creator or ADM only; anyone else gets 403.
pub async fn delete_ticket(pool: &DbPool, auth: &AuthContext, id: Uuid) -> Result<(), AppError> {
    let ticket = find_ticket(pool, id).await?;
    auth.require_owner(&ticket.ong_id)?;

    sqlx::query("DELETE FROM tickets WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    tracing::info!(ticket_id = %id, ong_id = %auth.ong_id, "Ticket deleted");

    Ok(())
}

/// Move a ticket to a new status.
///
/// The row is locked while the transition is checked so concurrent updates
/// are applied one after the other.
pub async fn update_status(
    pool: &DbPool,
    auth: &AuthContext,
    id: Uuid,
    next: TicketStatus,
) -> Result<Ticket, AppError> {
    let mut tx = pool.begin().await?;

    let ticket = sqlx::query_as::<_, Ticket>("SELECT * FROM tickets WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("Ticket"))?;

    if let Err(e) = ensure_can_update(auth, &ticket) {
        tx.rollback().await?;
        return Err(e);
    }

    let current = TicketStatus::parse(&ticket.status)?;
    if let Err(e) = check_transition(current, next) {
        tx.rollback().await?;
        return Err(e);
    }

    let updated = sqlx::query_as::<_, Ticket>(
        r#"
        UPDATE tickets
        SET status = $2,
            updated_at = NOW(),
            closed_at = CASE WHEN $2 = 'closed' THEN NOW() ELSE NULL END
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(next.as_str())
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(ticket_id = %id, from = %current, to = %next, "Ticket status changed");

    Ok(updated)
}

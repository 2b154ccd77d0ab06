//! Visitor check-in and check-out.
//!
//! A visitor may have at most one open entry. The visitor row is locked for
//! the duration of a check-in so the blocked flag and the open-entry check
//! are read consistently with the insert.

use uuid::Uuid;

use crate::{
    db::{self, DbPool},
    error::AppError,
    middleware::auth::AuthContext,
    models::history::{CheckInRequest, HistoryEntry, HistoryListItem, HistoryQuery},
};

/// Register a visitor's entry.
///
/// # Errors
///
/// - `NotFound`: visitor doesn't exist
/// - `Forbidden`: visitor is blocked
/// - `Conflict`: visitor already has an open entry
pub async fn check_in(
    pool: &DbPool,
    auth: &AuthContext,
    request: CheckInRequest,
) -> Result<HistoryEntry, AppError> {
    request.validate()?;

    let mut tx = pool.begin().await?;

    let (blocked, visitor_sector): (bool, i32) =
        sqlx::query_as("SELECT blocked, sector_id FROM visitors WHERE id = $1 FOR UPDATE")
            .bind(request.visitor_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(AppError::NotFound("Visitor"))?;

    if blocked {
        tx.rollback().await?;
        return Err(AppError::Forbidden("Visitor is blocked".to_string()));
    }

    let inside: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM history WHERE visitor_id = $1 AND exit_at IS NULL)",
    )
    .bind(request.visitor_id)
    .fetch_one(&mut *tx)
    .await?;

    if inside {
        tx.rollback().await?;
        return Err(AppError::Conflict(
            "Visitor already has an open entry".to_string(),
        ));
    }

    let entry = sqlx::query_as::<_, HistoryEntry>(
        r#"
        INSERT INTO history (visitor_id, ong_id, sector_id, observation)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(request.visitor_id)
    .bind(&auth.ong_id)
    .bind(request.sector_id.unwrap_or(visitor_sector))
    .bind(request.observation)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        // Partial unique index on open entries
        if db::is_unique_violation(&e) {
            AppError::Conflict("Visitor already has an open entry".to_string())
        } else {
            AppError::Database(e)
        }
    })?;

    tx.commit().await?;

    tracing::info!(entry_id = %entry.id, visitor_id = %entry.visitor_id, "Visitor checked in");

    Ok(entry)
}

/// Close an open entry.
///
/// # Errors
///
/// - `NotFound`: entry doesn't exist
/// - `Conflict`: entry was already closed
pub async fn check_out(pool: &DbPool, entry_id: Uuid) -> Result<HistoryEntry, AppError> {
    let closed = sqlx::query_as::<_, HistoryEntry>(
        r#"
        UPDATE history
        SET exit_at = NOW()
        WHERE id = $1 AND exit_at IS NULL
        RETURNING *
        "#,
    )
    .bind(entry_id)
    .fetch_optional(pool)
    .await?;

    if let Some(entry) = closed {
        tracing::info!(entry_id = %entry.id, visitor_id = %entry.visitor_id, "Visitor checked out");
        return Ok(entry);
    }

    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM history WHERE id = $1)")
        .bind(entry_id)
        .fetch_one(pool)
        .await?;

    if exists {
        Err(AppError::Conflict("Exit was already registered".to_string()))
    } else {
        Err(AppError::NotFound("History entry"))
    }
}

/// List entries, newest first.
pub async fn list_entries(
    pool: &DbPool,
    query: &HistoryQuery,
) -> Result<Vec<HistoryListItem>, AppError> {
    let entries = sqlx::query_as::<_, HistoryListItem>(
        r#"
        SELECT h.id, h.visitor_id, v.name AS visitor_name, h.ong_id, h.sector_id,
               h.entry_at, h.exit_at, h.observation
        FROM history h
        JOIN visitors v ON v.id = h.visitor_id
        WHERE ($1::uuid IS NULL OR h.visitor_id = $1)
          AND ($2::boolean IS NULL OR (h.exit_at IS NULL) = $2)
        ORDER BY h.entry_at DESC
        "#,
    )
    .bind(query.visitor_id)
    .bind(query.open)
    .fetch_all(pool)
    .await?;

    Ok(entries)
}

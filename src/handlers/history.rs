//! Entry/exit HTTP handlers.
//!
//! - POST /history - Check a visitor in
//! - PUT /history/{id}/exit - Check a visitor out
//! - GET /history - List entries

use crate::{
    db::DbPool,
    error::AppError,
    extract::{Json, Path, Query},
    middleware::auth::AuthContext,
    models::history::{CheckInRequest, HistoryEntry, HistoryListItem, HistoryQuery},
    services::history_service,
};
use axum::{Extension, extract::State, http::StatusCode};
use uuid::Uuid;

/// Check a visitor in.
///
/// # Response
///
/// - **201 Created**: The open entry
/// - **403**: Visitor is blocked
/// - **404**: Visitor doesn't exist
/// - **409**: Visitor is already inside
pub async fn check_in(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CheckInRequest>,
) -> Result<(StatusCode, Json<HistoryEntry>), AppError> {
    let entry = history_service::check_in(&pool, &auth, request).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// Register the exit for an open entry.
pub async fn check_out(
    State(pool): State<DbPool>,
    Path(entry_id): Path<Uuid>,
) -> Result<Json<HistoryEntry>, AppError> {
    Ok(Json(history_service::check_out(&pool, entry_id).await?))
}

/// List entries, newest first, filtered by `visitor_id` and `open`.
pub async fn list_history(
    State(pool): State<DbPool>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<HistoryListItem>>, AppError> {
    Ok(Json(history_service::list_entries(&pool, &query).await?))
}

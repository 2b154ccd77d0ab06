//! Visitor HTTP handlers.
//!
//! - POST /visitors - Register a visitor
//! - GET /visitors - Paginated list with optional search
//! - GET /visitors/{id} - Visitor details
//! - PUT /visitors/{id} - Update a visitor (creator or ADM)
//! - DELETE /visitors/{id} - Delete a visitor (creator or ADM)
//! - PUT /visitors/{id}/block - Block or unblock a visitor (ADM)
//! - GET /profile - Visitors registered by the caller

use crate::{
    db::{self, DbPool},
    error::AppError,
    extract::{Json, Path, Query},
    middleware::auth::AuthContext,
    models::visitor::{BlockVisitorRequest, PAGE_SIZE, Visitor, VisitorListQuery, VisitorRequest},
};
use axum::{
    Extension,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
};
use chrono::Utc;
use uuid::Uuid;

/// Header carrying the total number of visitors matching a list query.
const TOTAL_COUNT_HEADER: &str = "x-total-count";

fn duplicate_cpf(e: sqlx::Error) -> AppError {
    if db::is_unique_violation(&e) {
        AppError::Conflict("A visitor with this CPF is already registered".to_string())
    } else {
        AppError::Database(e)
    }
}

async fn find_visitor(pool: &DbPool, id: Uuid) -> Result<Visitor, AppError> {
    sqlx::query_as::<_, Visitor>("SELECT * FROM visitors WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Visitor"))
}

/// Register a visitor.
///
/// # Response
///
/// - **201 Created**: The stored visitor
/// - **400**: Invalid body (including an invalid CPF)
/// - **409**: CPF already registered
pub async fn create_visitor(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Json(mut request): Json<VisitorRequest>,
) -> Result<(StatusCode, Json<Visitor>), AppError> {
    request.validate(Utc::now().date_naive())?;

    let visitor = sqlx::query_as::<_, Visitor>(
        r#"
        INSERT INTO visitors (
            ong_id, name, rg, cpf, birthdate, email, cellphone,
            company, sector_id, host, observation
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING *
        "#,
    )
    .bind(&auth.ong_id)
    .bind(request.name.trim())
    .bind(request.rg.trim())
    .bind(&request.cpf)
    .bind(request.birthdate)
    .bind(request.email)
    .bind(request.cellphone.trim())
    .bind(request.company)
    .bind(request.sector_id)
    .bind(request.host.trim())
    .bind(request.observation)
    .fetch_one(&pool)
    .await
    .map_err(duplicate_cpf)?;

    tracing::info!(visitor_id = %visitor.id, ong_id = %auth.ong_id, "Visitor registered");

    Ok((StatusCode::CREATED, Json(visitor)))
}

/// List visitors, newest first, `PAGE_SIZE` per page.
///
/// The total number of matching visitors is returned in `X-Total-Count`.
pub async fn list_visitors(
    State(pool): State<DbPool>,
    Query(query): Query<VisitorListQuery>,
) -> Result<(HeaderMap, Json<Vec<Visitor>>), AppError> {
    let name_pattern = query.name_pattern();
    let cpf_pattern = query.cpf_pattern();

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM visitors WHERE $1::text IS NULL OR name ILIKE $1 OR cpf LIKE $2",
    )
    .bind(&name_pattern)
    .bind(&cpf_pattern)
    .fetch_one(&pool)
    .await?;

    let visitors = sqlx::query_as::<_, Visitor>(
        r#"
        SELECT * FROM visitors
        WHERE $1::text IS NULL OR name ILIKE $1 OR cpf LIKE $2
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(&name_pattern)
    .bind(&cpf_pattern)
    .bind(PAGE_SIZE)
    .bind(query.offset())
    .fetch_all(&pool)
    .await?;

    let mut headers = HeaderMap::new();
    headers.insert(TOTAL_COUNT_HEADER, HeaderValue::from(total));

    Ok((headers, Json(visitors)))
}

/// Get a visitor by id.
pub async fn get_visitor(
    State(pool): State<DbPool>,
    Path(visitor_id): Path<Uuid>,
) -> Result<Json<Visitor>, AppError> {
    Ok(Json(find_visitor(&pool, visitor_id).await?))
}

/// Replace a visitor's registration data. Creator or ADM only.
pub async fn update_visitor(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Path(visitor_id): Path<Uuid>,
    Json(mut request): Json<VisitorRequest>,
) -> Result<Json<Visitor>, AppError> {
    let existing = find_visitor(&pool, visitor_id).await?;
    auth.require_owner(&existing.ong_id)?;

    request.validate(Utc::now().date_naive())?;

    let visitor = sqlx::query_as::<_, Visitor>(
        r#"
        UPDATE visitors
        SET name = $2, rg = $3, cpf = $4, birthdate = $5, email = $6, cellphone = $7,
            company = $8, sector_id = $9, host = $10, observation = $11, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(visitor_id)
    .bind(request.name.trim())
    .bind(request.rg.trim())
    .bind(&request.cpf)
    .bind(request.birthdate)
    .bind(request.email)
    .bind(request.cellphone.trim())
    .bind(request.company)
    .bind(request.sector_id)
    .bind(request.host.trim())
    .bind(request.observation)
    .fetch_optional(&pool)
    .await
    .map_err(duplicate_cpf)?
    .ok_or(AppError::NotFound("Visitor"))?;

    Ok(Json(visitor))
}

/// Delete a visitor. Creator or ADM only.
///
/// # Response
///
/// - **204 No Content**
/// - **403**: Caller neither registered the visitor nor is ADM
/// - **404**: Visitor doesn't exist
pub async fn delete_visitor(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Path(visitor_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let visitor = find_visitor(&pool, visitor_id).await?;
    auth.require_owner(&visitor.ong_id)?;

    sqlx::query("DELETE FROM visitors WHERE id = $1")
        .bind(visitor_id)
        .execute(&pool)
        .await?;

    tracing::info!(visitor_id = %visitor_id, ong_id = %auth.ong_id, "Visitor deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Block or unblock a visitor. ADM only.
pub async fn block_visitor(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Path(visitor_id): Path<Uuid>,
    Json(request): Json<BlockVisitorRequest>,
) -> Result<Json<Visitor>, AppError> {
    auth.require_admin()?;
    request.validate()?;

    let reason = if request.blocked { request.reason } else { None };

    let visitor = sqlx::query_as::<_, Visitor>(
        r#"
        UPDATE visitors
        SET blocked = $2, blocked_reason = $3, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(visitor_id)
    .bind(request.blocked)
    .bind(reason)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Visitor"))?;

    tracing::info!(visitor_id = %visitor_id, blocked = visitor.blocked, "Visitor block flag changed");

    Ok(Json(visitor))
}

/// Visitors registered by the authenticated account, newest first.
pub async fn profile(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<Visitor>>, AppError> {
    let visitors = sqlx::query_as::<_, Visitor>(
        "SELECT * FROM visitors WHERE ong_id = $1 ORDER BY created_at DESC",
    )
    .bind(&auth.ong_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(visitors))
}

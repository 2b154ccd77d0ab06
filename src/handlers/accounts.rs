//! Account (ONG) and session HTTP handlers.
//!
//! - POST /ongs - Register an account (public)
//! - GET /ongs - List accounts (administrators)
//! - POST /sessions - Log in with an account id (public)

use crate::{
    db::{self, DbPool},
    error::AppError,
    extract::Json,
    middleware::auth::AuthContext,
    models::account::{
        Account, CreateAccountRequest, CreateAccountResponse, SessionRequest, SessionResponse,
        generate_account_id,
    },
};
use axum::{Extension, extract::State, http::StatusCode};

/// Attempts at drawing an unused account id before giving up.
const MAX_ID_ATTEMPTS: u32 = 5;

/// Primary key of the `ongs` table.
const ACCOUNT_ID_CONSTRAINT: &str = "ongs_pkey";

#[derive(Debug)]
enum InsertFailure {
    /// The generated id collided with an existing account.
    IdTaken,
    Fatal(AppError),
}

fn classify_insert_error(e: sqlx::Error, attempt: u32) -> InsertFailure {
    if db::is_unique_violation_on(&e, ACCOUNT_ID_CONSTRAINT) {
        if attempt < MAX_ID_ATTEMPTS {
            InsertFailure::IdTaken
        } else {
            InsertFailure::Fatal(AppError::Database(e))
        }
    } else if db::is_unique_violation(&e) {
        InsertFailure::Fatal(AppError::Conflict(
            "An account with this e-mail already exists".to_string(),
        ))
    } else {
        InsertFailure::Fatal(AppError::Database(e))
    }
}

/// Register a new account.
///
/// # Endpoint
///
/// `POST /ongs`
///
/// # Response
///
/// - **201 Created**: `{"id": "1a2b3c4d"}`; the id is the account's login token
/// - **400**: Invalid body
/// - **409**: E-mail already registered
pub async fn create_account(
    State(pool): State<DbPool>,
    Json(request): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<CreateAccountResponse>), AppError> {
    request.validate()?;

    let mut attempt = 1;
    let id = loop {
        let id = generate_account_id();

        let inserted = sqlx::query(
            r#"
            INSERT INTO ongs (id, name, email, whatsapp, city, uf, role, sector_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&id)
        .bind(request.name.trim())
        .bind(request.email.trim().to_lowercase())
        .bind(request.whatsapp.trim())
        .bind(request.city.trim())
        .bind(request.uf.trim().to_uppercase())
        .bind(request.role.as_str())
        .bind(request.sector_id)
        .execute(&pool)
        .await;

        match inserted {
            Ok(_) => break id,
            Err(e) => match classify_insert_error(e, attempt) {
                InsertFailure::IdTaken => {
                    tracing::warn!(ong_id = %id, attempt, "Generated account id already taken, retrying");
                    attempt += 1;
                }
                InsertFailure::Fatal(err) => return Err(err),
            },
        }
    };

    tracing::info!(ong_id = %id, sector_id = request.sector_id, "Account registered");

    Ok((StatusCode::CREATED, Json(CreateAccountResponse { id })))
}

/// List every account, newest first.
///
/// # Endpoint
///
/// `GET /ongs`
///
/// Administrators only; other callers receive 403.
pub async fn list_accounts(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<Account>>, AppError> {
    auth.require_admin()?;

    let accounts = sqlx::query_as::<_, Account>(
        r#"
        SELECT id, name, email, whatsapp, city, uf, role, sector_id, created_at
        FROM ongs
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(accounts))
}

/// Log in with an account id.
///
/// # Endpoint
///
/// `POST /sessions`
///
/// # Response
///
/// - **200 OK**: `{"id", "name", "role", "sector_id"}`
/// - **400**: No account with this id
pub async fn create_session(
    State(pool): State<DbPool>,
    Json(request): Json<SessionRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let account = sqlx::query_as::<_, Account>(
        r#"
        SELECT id, name, email, whatsapp, city, uf, role, sector_id, created_at
        FROM ongs
        WHERE id = $1
        "#,
    )
    .bind(request.id.trim())
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::InvalidRequest("No account found with this ID".to_string()))?;

    Ok(Json(account.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support;

    #[test]
    fn id_collision_is_retried_until_attempts_run_out() {
        let collision = || test_support::error("23505", Some("ongs_pkey"));

        assert!(matches!(
            classify_insert_error(collision(), 1),
            InsertFailure::IdTaken
        ));
        assert!(matches!(
            classify_insert_error(collision(), MAX_ID_ATTEMPTS - 1),
            InsertFailure::IdTaken
        ));
        assert!(matches!(
            classify_insert_error(collision(), MAX_ID_ATTEMPTS),
            InsertFailure::Fatal(AppError::Database(_))
        ));
    }

    #[test]
    fn duplicate_email_is_a_conflict() {
        let err = test_support::error("23505", Some("ongs_email_key"));
        assert!(matches!(
            classify_insert_error(err, 1),
            InsertFailure::Fatal(AppError::Conflict(ref m)) if m == "An account with this e-mail already exists"
        ));
    }

    #[test]
    fn other_database_errors_are_not_retried() {
        assert!(matches!(
            classify_insert_error(sqlx::Error::RowNotFound, 1),
            InsertFailure::Fatal(AppError::Database(_))
        ));
    }
}

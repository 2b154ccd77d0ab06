//! Account token authentication middleware.
//!
//! Clients authenticate by sending their account id as a bearer token:
//!
//! ```text
//! Authorization: Bearer 1a2b3c4d
//! ```
//!
//! Older clients send the bare id without the `Bearer ` prefix; both forms
//! are accepted.

use crate::{
    db::DbPool,
    error::AppError,
    models::account::{Account, Role, SECURITY_SECTOR},
};
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

/// Authentication context attached to authenticated requests.
///
/// Inserted into the request extensions; handlers extract it with
/// `Extension<AuthContext>`.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub ong_id: String,
    pub name: String,
    pub role: Role,
    pub sector_id: i32,
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Administrators and the security sector confirm appointments.
    pub fn can_confirm(&self) -> bool {
        self.is_admin() || self.sector_id == SECURITY_SECTOR
    }

    /// Owners and administrators may modify a record.
    pub fn can_manage(&self, owner_id: &str) -> bool {
        self.is_admin() || self.ong_id == owner_id
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Only administrators may perform this operation".to_string(),
            ))
        }
    }

    pub fn require_owner(&self, owner_id: &str) -> Result<(), AppError> {
        if self.can_manage(owner_id) {
            Ok(())
        } else {
            Err(AppError::Forbidden("Operation not permitted".to_string()))
        }
    }
}

impl From<Account> for AuthContext {
    fn from(account: Account) -> Self {
        Self {
            role: Role::from_column(&account.role),
            ong_id: account.id,
            name: account.name,
            sector_id: account.sector_id,
        }
    }
}

/// Extract the account id from an `Authorization` header value.
pub fn parse_token(header: &str) -> Option<&str> {
    let token = header.strip_prefix("Bearer ").unwrap_or(header).trim();
    (!token.is_empty()).then_some(token)
}

/// Authentication middleware function.
///
/// # Flow
///
/// 1. Extract the token from the `Authorization` header
/// 2. Look up the account with that id
/// 3. If found: inject `AuthContext` into the request and call the next handler
/// 4. Otherwise: return 401 Unauthorized
pub async fn auth_middleware(
    State(pool): State<DbPool>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ong_id = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(parse_token)
        .ok_or(AppError::Unauthorized)?
        .to_string();

    let account = sqlx::query_as::<_, Account>(
        "SELECT id, name, email, whatsapp, city, uf, role, sector_id, created_at
         FROM ongs
         WHERE id = $1",
    )
    .bind(&ong_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::Unauthorized)?;

    request.extensions_mut().insert(AuthContext::from(account));

    Ok(next.run(request).await)
}

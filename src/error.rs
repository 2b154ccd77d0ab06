//! Error types and HTTP error response handling.
//!
//! Every handler returns `Result<_, AppError>`; the `IntoResponse`
//! implementation turns each variant into a status code and a JSON body.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::models::validation::ValidationError;

/// Application-wide error type.
///
/// # Error Categories
///
/// - **Database Errors**: Any sqlx::Error from database operations
/// - **Authentication Errors**: Missing or unknown account token
/// - **Authorization Errors**: Authenticated account lacks the role or ownership
/// - **Resource Errors**: Requested resources not found
/// - **Workflow Errors**: Operations that conflict with the current state
/// - **Validation Errors**: Invalid request data
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, query error).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Authorization header is missing or names no account.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Authentication required")]
    Unauthorized,

    /// Caller is authenticated but may not perform the operation.
    ///
    /// Returns HTTP 403 Forbidden.
    #[error("{0}")]
    Forbidden(String),

    /// Requested resource does not exist.
    ///
    /// Returns HTTP 404 Not Found. The payload names the resource kind.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Operation conflicts with the resource's current state.
    ///
    /// Returns HTTP 409 Conflict.
    #[error("{0}")]
    Conflict(String),

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("{0}")]
    InvalidRequest(String),

    /// JSON body is missing, malformed or doesn't match the expected type.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("{}", .0.body_text())]
    JsonRejection(#[from] JsonRejection),

    /// Query string doesn't match the expected type.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("{}", .0.body_text())]
    QueryRejection(#[from] QueryRejection),

    /// Path parameter doesn't match the expected type.
    ///
    /// Returns HTTP 400 Bad Request, or 500 when the route itself is broken.
    #[error("{}", .0.body_text())]
    PathRejection(#[from] PathRejection),
}

impl From<ValidationError> for AppError {
    fn from(error: ValidationError) -> Self {
        AppError::InvalidRequest(error.to_string())
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// # Status Code Mapping
///
/// - `InvalidRequest` and extractor rejections → 400 Bad Request
/// - `Unauthorized` → 401 Unauthorized
/// - `Forbidden` → 403 Forbidden
/// - `NotFound` → 404 Not Found
/// - `Conflict` → 409 Conflict
/// - `Database` → 500 Internal Server Error (hides details from client)
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::InvalidRequest(ref msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone())
            }
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", self.to_string()),
            AppError::Forbidden(ref msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone()),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", self.to_string()),
            AppError::Conflict(ref msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            AppError::JsonRejection(_) | AppError::QueryRejection(_) => {
                (StatusCode::BAD_REQUEST, "invalid_request", self.to_string())
            }
            AppError::PathRejection(ref rejection) if rejection.status().is_server_error() => {
                tracing::error!("Path extraction failed: {}", rejection.body_text());
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::PathRejection(_) => {
                (StatusCode::BAD_REQUEST, "invalid_request", self.to_string())
            }
            AppError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_error_is_400_with_message() {
        let err: AppError = ValidationError::Empty { field: "name" }.into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "invalid_request");
        assert_eq!(body["error"]["message"], "name cannot be empty");
    }

    #[tokio::test]
    async fn unauthorized_is_401() {
        let response = AppError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn forbidden_is_403() {
        let response = AppError::Forbidden("only ADM may do this".into()).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn not_found_names_the_resource() {
        let response = AppError::NotFound("Appointment").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], "Appointment not found");
    }

    #[tokio::test]
    async fn conflict_is_409() {
        let response = AppError::Conflict("already confirmed".into()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn database_error_hides_details() {
        let response = AppError::Database(sqlx::Error::RowNotFound).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "internal_error");
        assert_eq!(body["error"]["message"], "An internal error occurred");
    }
}

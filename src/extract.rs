//! Request extractors whose rejections use the `AppError` body.
//!
//! axum's own `Json`, `Query` and `Path` reject malformed input with a
//! plain-text body (and 415/422 statuses for JSON). These wrappers route the
//! rejection through `AppError` so clients always get a 400 with the
//! `{"error": {...}}` shape.

use axum::{
    extract::{FromRequest, FromRequestParts},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::error::AppError;

/// JSON body extractor and response.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Query string extractor.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct Query<T>(pub T);

/// Path parameter extractor.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct Path<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{appointment::AppointmentQuery, ticket::TicketQuery};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };

    async fn extract_query<T>(uri: &str) -> Result<Query<T>, AppError>
    where
        T: serde::de::DeserializeOwned + Send,
    {
        let (mut parts, _) = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap()
            .into_parts();
        Query::<T>::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn unknown_status_in_query_is_400() {
        let err = extract_query::<TicketQuery>("/tickets?status=bogus")
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

        let err = extract_query::<AppointmentQuery>("/agendamentos?date=amanha")
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn valid_query_is_extracted() {
        let Query(query) = extract_query::<TicketQuery>("/tickets?status=in_progress")
            .await
            .unwrap();
        assert_eq!(
            query.status,
            Some(crate::models::ticket::TicketStatus::InProgress)
        );
    }
}

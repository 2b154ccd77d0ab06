//! HTTP router assembly.

use axum::{
    Router,
    http::{HeaderName, HeaderValue},
    middleware as axum_middleware,
    routing::{delete, get, post, put},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{db::DbPool, handlers, middleware};

/// Build the CORS layer. Any origin is allowed unless one is configured.
///
/// # Errors
///
/// Returns an error if the configured origin is not a valid header value.
pub fn cors_layer(allowed_origin: Option<&str>) -> anyhow::Result<CorsLayer> {
    let layer = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static("x-total-count")]);

    Ok(match allowed_origin {
        Some(origin) => layer.allow_origin(HeaderValue::from_str(origin)?),
        None => layer.allow_origin(Any),
    })
}

/// Build the application router.
///
/// Everything except `/health`, `POST /ongs` and `POST /sessions` sits
/// behind the account token middleware.
pub fn router(pool: DbPool, cors: CorsLayer) -> Router {
    let authenticated_routes = Router::new()
        // Accounts
        .route("/ongs", get(handlers::accounts::list_accounts))
        // Visitors
        .route(
            "/visitors",
            get(handlers::visitors::list_visitors).post(handlers::visitors::create_visitor),
        )
        .route(
            "/visitors/{id}",
            get(handlers::visitors::get_visitor)
                .put(handlers::visitors::update_visitor)
                .delete(handlers::visitors::delete_visitor),
        )
        .route("/visitors/{id}/block", put(handlers::visitors::block_visitor))
        .route("/profile", get(handlers::visitors::profile))
        // Entries and exits
        .route(
            "/history",
            get(handlers::history::list_history).post(handlers::history::check_in),
        )
        .route("/history/{id}/exit", put(handlers::history::check_out))
        // Helpdesk
        .route(
            "/tickets",
            get(handlers::tickets::list_tickets).post(handlers::tickets::create_ticket),
        )
        .route(
            "/tickets/{id}",
            get(handlers::tickets::get_ticket).delete(handlers::tickets::delete_ticket),
        )
        .route(
            "/tickets/{id}/status",
            put(handlers::tickets::update_ticket_status),
        )
        // Appointments
        .route(
            "/agendamentos",
            get(handlers::appointments::list_appointments)
                .post(handlers::appointments::create_appointment),
        )
        .route(
            "/agendamentos/{id}",
            delete(handlers::appointments::delete_appointment),
        )
        .route(
            "/agendamentos/{id}/confirmar",
            put(handlers::appointments::confirm_appointment),
        )
        .route(
            "/agendamentos/{id}/presenca",
            put(handlers::appointments::register_presence),
        )
        // Dashboard
        .route("/dashboard", get(handlers::dashboard::dashboard))
        .route_layer(axum_middleware::from_fn_with_state(
            pool.clone(),
            middleware::auth::auth_middleware,
        ));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ongs", post(handlers::accounts::create_account))
        .route("/sessions", post(handlers::accounts::create_session))
        .merge(authenticated_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(pool)
}

//! API endpoints.

mod admin;
mod auth;
mod notifications;
mod orders;
mod templates;
mod websites;

use axum::{Router, middleware, routing::get};

use crate::middleware::{AppState, admin_gate};

/// Create the API router.
///
/// `max_upload_bytes` bounds request bodies of the upload routes.
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .route("/questionnaire", get(orders::questionnaire))
        .nest("/templates", templates::router())
        .nest("/orders", orders::router())
        .nest("/websites", websites::router())
        .nest("/notifications", notifications::router())
        .nest(
            "/admin",
            admin::router(max_upload_bytes).route_layer(middleware::from_fn(admin_gate)),
        )
}

//! API middleware.

#![allow(missing_docs)]

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use sitecraft_core::{
    AccountService, DashboardService, FulfillmentService, MessagingService, NotificationService,
    OrderService, TemplateService,
};
use sitecraft_db::entities::user;

/// Where staff-only requests from other users are sent.
pub const ADMIN_FALLBACK_PATH: &str = "/dashboard";

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub account_service: AccountService,
    pub template_service: TemplateService,
    pub order_service: OrderService,
    pub messaging_service: MessagingService,
    pub notification_service: NotificationService,
    pub fulfillment_service: FulfillmentService,
    pub dashboard_service: DashboardService,
}

/// Authentication middleware.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        match state.account_service.authenticate_by_token(token).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e) if e.is_server_error() => {
                tracing::warn!(error = %e, "Token lookup failed");
            }
            Err(_) => {}
        }
    }

    next.run(req).await
}

/// Admin gate for the staff area.
///
/// Anyone who is not signed in as an administrator is redirected to the
/// customer dashboard.
pub async fn admin_gate(req: Request<Body>, next: Next) -> Response {
    let allowed = req
        .extensions()
        .get::<user::Model>()
        .is_some_and(user::Model::is_admin);

    if allowed {
        next.run(req).await
    } else {
        tracing::debug!(path = %req.uri().path(), "Non-admin request to staff area");
        Redirect::to(ADMIN_FALLBACK_PATH).into_response()
    }
}

//! Notification endpoints.

use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use serde::{Deserialize, Serialize};
use sitecraft_common::AppResult;
use sitecraft_core::{UserOverview, notification::DEFAULT_LIST_LIMIT};
use sitecraft_db::entities::notification;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// List notifications request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotificationsQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub until_id: Option<String>,
}

const fn default_limit() -> u64 {
    DEFAULT_LIST_LIMIT
}

/// Notification response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: String,
    pub message: String,
    pub is_read: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifier_id: Option<String>,
    pub created_at: String,
}

impl From<notification::Model> for NotificationResponse {
    fn from(n: notification::Model) -> Self {
        Self {
            id: n.id,
            message: n.message,
            is_read: n.is_read,
            order_id: n.order_id,
            notifier_id: n.notifier_id,
            created_at: n.created_at.to_rfc3339(),
        }
    }
}

/// Notifications for the signed-in user, newest first.
///
/// The page is returned as it was before viewing; everything is then
/// marked read.
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListNotificationsQuery>,
) -> AppResult<ApiResponse<Vec<NotificationResponse>>> {
    let limit = query.limit.clamp(1, 100);

    let notifications = state
        .notification_service
        .list(&user.id, limit, query.until_id.as_deref())
        .await?;
    state.notification_service.mark_all_read(&user.id).await?;

    Ok(ApiResponse::ok(
        notifications.into_iter().map(Into::into).collect(),
    ))
}

async fn counts(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<UserOverview>> {
    let counts = state.dashboard_service.user_overview(&user).await?;
    Ok(ApiResponse::ok(counts))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/counts", get(counts))
}

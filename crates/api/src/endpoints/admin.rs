//! Staff endpoints. Mounted behind the admin gate.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use sitecraft_common::{AppError, AppResult};
use sitecraft_core::{AdvanceOrderInput, PostMessageInput, QuestionAnswer, Transcript};
use sitecraft_db::{
    entities::order::{OrderStatus, OrderType},
    repositories::OrderFilter,
};

use super::auth::UserResponse;
use super::orders::{MessageResponse, OrderResponse};
use super::templates;
use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Extra room for multipart framing around an uploaded bundle.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Admin dashboard.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub users: u64,
    pub orders: u64,
    pub pending_orders: u64,
    pub custom_orders: u64,
    pub active_templates: u64,
    pub submitted_folders: u64,
    pub recent_template_orders: Vec<OrderResponse>,
    pub recent_custom_orders: Vec<OrderResponse>,
}

async fn dashboard(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<DashboardResponse>> {
    let overview = state.dashboard_service.admin_overview(&user).await?;

    Ok(ApiResponse::ok(DashboardResponse {
        users: overview.users,
        orders: overview.orders,
        pending_orders: overview.pending_orders,
        custom_orders: overview.custom_orders,
        active_templates: overview.active_templates,
        submitted_folders: overview.submitted_folders,
        recent_template_orders: overview
            .recent_template_orders
            .into_iter()
            .map(Into::into)
            .collect(),
        recent_custom_orders: overview
            .recent_custom_orders
            .into_iter()
            .map(Into::into)
            .collect(),
    }))
}

/// Order list filters.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOrdersQuery {
    /// Status label, e.g. `In Progress`
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub order_type: Option<OrderType>,
    pub submitted: Option<bool>,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub until_id: Option<String>,
}

const fn default_limit() -> u64 {
    50
}

async fn list_orders(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListOrdersQuery>,
) -> AppResult<ApiResponse<Vec<OrderResponse>>> {
    let status = query
        .status
        .as_deref()
        .map(|label| {
            OrderStatus::parse(label)
                .ok_or_else(|| AppError::Validation(format!("Unknown status: {label}")))
        })
        .transpose()?;

    let filter = OrderFilter {
        status,
        order_type: query.order_type,
        folder_submitted: query.submitted,
    };
    let orders = state
        .order_service
        .list_all(
            &user,
            &filter,
            query.limit.clamp(1, 100),
            query.until_id.as_deref(),
        )
        .await?;

    Ok(ApiResponse::ok(orders.into_iter().map(Into::into).collect()))
}

/// Order detail for staff.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOrderResponse {
    pub order: OrderResponse,
    pub customer: UserResponse,
    /// Questionnaire transcript of a custom order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answers: Option<Vec<QuestionAnswer>>,
    pub messages: Vec<MessageResponse>,
}

async fn show_order(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<ApiResponse<AdminOrderResponse>> {
    let order = state.order_service.get_by_code(&user, &code).await?;
    let customer = state.account_service.get(&order.user_id).await?;
    let messages = state.messaging_service.conversation(&order).await?;
    let answers = Transcript::from_order(&order).map(|t| t.answers);

    Ok(ApiResponse::ok(AdminOrderResponse {
        order: order.into(),
        customer: customer.into(),
        answers,
        messages: messages.into_iter().map(Into::into).collect(),
    }))
}

async fn advance_order(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(req): Json<AdvanceOrderInput>,
) -> AppResult<ApiResponse<OrderResponse>> {
    let order = state.order_service.advance(&user, &code, req).await?;
    Ok(ApiResponse::ok(order.into()))
}

async fn post_message(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(req): Json<PostMessageInput>,
) -> AppResult<ApiResponse<MessageResponse>> {
    let message = state
        .messaging_service
        .post_message(&user, &code, req)
        .await?;
    Ok(ApiResponse::ok(message.into()))
}

/// Upload the finished website (multipart field `file`).
async fn submit_bundle(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(code): Path<String>,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<OrderResponse>> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::BadRequest("Missing file name".to_string()))?;
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
            .to_vec();
        upload = Some((file_name, data));
    }

    let (file_name, data) =
        upload.ok_or_else(|| AppError::BadRequest("Missing file field".to_string()))?;

    let order = state
        .fulfillment_service
        .submit_bundle(&user, &code, &file_name, data)
        .await?;
    Ok(ApiResponse::ok(order.into()))
}

/// User listing request.
#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

async fn list_users(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> AppResult<ApiResponse<Vec<UserResponse>>> {
    let users = state
        .account_service
        .list_users(&user, query.limit.clamp(1, 100), query.offset)
        .await?;
    Ok(ApiResponse::ok(users.into_iter().map(Into::into).collect()))
}

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/orders", get(list_orders))
        .route("/orders/{code}", get(show_order))
        .route("/orders/{code}/progress", post(advance_order))
        .route("/orders/{code}/messages", post(post_message))
        .route(
            "/orders/{code}/bundle",
            post(submit_bundle)
                .layer(DefaultBodyLimit::max(max_upload_bytes + MULTIPART_OVERHEAD)),
        )
        .route("/users", get(list_users))
        .nest("/templates", templates::admin_router(max_upload_bytes))
}

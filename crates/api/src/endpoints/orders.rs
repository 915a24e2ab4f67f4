//! Customer order endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use sitecraft_common::AppResult;
use sitecraft_core::{PostMessageInput, TemplateOrderInput};
use sitecraft_db::entities::{order, order_message};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Order response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: String,
    pub order_code: String,
    pub order_type: order::OrderType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    pub website_type: String,
    pub website_name: String,
    pub requirements: String,
    pub budget: String,
    pub stage: String,
    pub status: String,
    pub folder_submitted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_submitted_at: Option<String>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl From<order::Model> for OrderResponse {
    fn from(order: order::Model) -> Self {
        Self {
            status: order.status.label(),
            id: order.id,
            order_code: order.order_code,
            order_type: order.order_type,
            template_id: order.template_id,
            website_type: order.website_type,
            website_name: order.website_name,
            requirements: order.requirements,
            budget: order.budget,
            stage: order.stage,
            folder_submitted: order.folder_submitted,
            folder_submitted_at: order.folder_submitted_at.map(|t| t.to_rfc3339()),
            created_at: order.created_at.to_rfc3339(),
            updated_at: order.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Conversation message response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: String,
    pub user_id: String,
    pub sender: order_message::MessageSender,
    pub text: String,
    pub created_at: String,
}

impl From<order_message::Model> for MessageResponse {
    fn from(message: order_message::Model) -> Self {
        Self {
            id: message.id,
            user_id: message.user_id,
            sender: message.sender,
            text: message.text,
            created_at: message.created_at.to_rfc3339(),
        }
    }
}

/// Order detail as the owner sees it.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetailResponse {
    pub order: OrderResponse,
    pub messages: Vec<MessageResponse>,
    /// Whether the owner may post messages right now
    pub can_message: bool,
}

/// Questionnaire shown before a custom order.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireResponse {
    pub version: u32,
    pub questions: Vec<String>,
}

pub(super) async fn questionnaire(State(state): State<AppState>) -> ApiResponse<QuestionnaireResponse> {
    let script = state.order_service.questionnaire();
    ApiResponse::ok(QuestionnaireResponse {
        version: script.version,
        questions: script.questions.clone(),
    })
}

async fn create_template_order(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<TemplateOrderInput>,
) -> AppResult<ApiResponse<OrderResponse>> {
    let order = state
        .order_service
        .create_template_order(&user, req)
        .await?;
    Ok(ApiResponse::ok(order.into()))
}

/// Custom order request. `answers[i]` answers question `i`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomOrderRequest {
    pub answers: Vec<String>,
}

async fn create_custom_order(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CustomOrderRequest>,
) -> AppResult<ApiResponse<OrderResponse>> {
    let order = state
        .order_service
        .create_custom_order(&user, req.answers)
        .await?;
    Ok(ApiResponse::ok(order.into()))
}

async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<OrderResponse>>> {
    let orders = state.order_service.list_for_user(&user).await?;
    Ok(ApiResponse::ok(orders.into_iter().map(Into::into).collect()))
}

/// Order detail with its conversation. Opening it marks the order's
/// notifications read.
async fn show(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<ApiResponse<OrderDetailResponse>> {
    let order = state.order_service.get_for_owner(&user, &code).await?;
    let messages = state.messaging_service.conversation(&order).await?;
    state
        .notification_service
        .mark_order_read(&user.id, &order.id)
        .await?;

    Ok(ApiResponse::ok(OrderDetailResponse {
        can_message: order.status.allows_customer_chat(),
        order: order.into(),
        messages: messages.into_iter().map(Into::into).collect(),
    }))
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

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/template", post(create_template_order))
        .route("/custom", post(create_custom_order))
        .route("/{code}", get(show))
        .route("/{code}/messages", post(post_message))
}

//! Delivered websites ("your web").

use axum::{
    Router,
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::get,
};
use sitecraft_common::AppResult;

use super::orders::OrderResponse;
use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Fulfilled orders, latest delivery first.
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<OrderResponse>>> {
    let orders = state.order_service.list_fulfilled(&user).await?;
    Ok(ApiResponse::ok(orders.into_iter().map(Into::into).collect()))
}

/// Download a delivered website as a zip attachment.
async fn download(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<impl IntoResponse> {
    let bundle = state
        .fulfillment_service
        .download_bundle(&user, &code)
        .await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", bundle.file_name),
            ),
        ],
        bundle.bytes,
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/{code}/download", get(download))
}

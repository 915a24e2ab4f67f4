//! Template catalog endpoints.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    response::IntoResponse,
    routing::{get, post, put},
};
use serde::Serialize;
use sitecraft_common::{AppError, AppResult};
use sitecraft_core::{CreateTemplateInput, TemplateService, UpdateTemplateInput};
use sitecraft_db::entities::template;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, no_content},
};

/// Template response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub features: Vec<String>,
    pub original_price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_price: Option<f64>,
    pub has_discount: bool,
    /// Price a customer pays today
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    pub is_active: bool,
    pub created_at: String,
}

impl TemplateResponse {
    fn new(service: &TemplateService, template: template::Model) -> Self {
        Self {
            image_url: service.image_url(&template),
            features: template.feature_list(),
            price: template.effective_price(),
            id: template.id,
            name: template.name,
            description: template.description,
            category: template.category,
            original_price: template.original_price,
            discount_price: template.discount_price,
            has_discount: template.has_discount,
            tag: template.tag,
            preview_url: template.preview_url,
            is_active: template.is_active,
            created_at: template.created_at.to_rfc3339(),
        }
    }

    fn list(service: &TemplateService, templates: Vec<template::Model>) -> Vec<Self> {
        templates
            .into_iter()
            .map(|t| Self::new(service, t))
            .collect()
    }
}

/// Active catalog.
async fn list(State(state): State<AppState>) -> AppResult<ApiResponse<Vec<TemplateResponse>>> {
    let service = &state.template_service;
    let templates = service.list_active().await?;
    Ok(ApiResponse::ok(TemplateResponse::list(service, templates)))
}

async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<TemplateResponse>> {
    let service = &state.template_service;
    let template = service.get_active(&id).await?;
    Ok(ApiResponse::ok(TemplateResponse::new(service, template)))
}

/// Every template, including inactive ones.
async fn admin_list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<TemplateResponse>>> {
    let service = &state.template_service;
    let templates = service.list_all(&user).await?;
    Ok(ApiResponse::ok(TemplateResponse::list(service, templates)))
}

async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateTemplateInput>,
) -> AppResult<ApiResponse<TemplateResponse>> {
    let service = &state.template_service;
    let template = service.create(&user, req).await?;
    Ok(ApiResponse::ok(TemplateResponse::new(service, template)))
}

async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateTemplateInput>,
) -> AppResult<ApiResponse<TemplateResponse>> {
    let service = &state.template_service;
    let template = service.update(&user, &id, req).await?;
    Ok(ApiResponse::ok(TemplateResponse::new(service, template)))
}

async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.template_service.delete(&user, &id).await?;
    Ok(no_content())
}

/// Replace a template's image (multipart field `file`).
async fn upload_image(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<TemplateResponse>> {
    let mut upload: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("image").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
            .to_vec();
        upload = Some((file_name, content_type, data));
    }

    let (file_name, content_type, data) =
        upload.ok_or_else(|| AppError::BadRequest("Missing file field".to_string()))?;

    let service = &state.template_service;
    let (template, _) = service
        .set_image(&user, &id, &file_name, &content_type, &data)
        .await?;
    Ok(ApiResponse::ok(TemplateResponse::new(service, template)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/{id}", get(show))
}

pub fn admin_router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(admin_list).post(create))
        .route("/{id}", put(update).delete(delete))
        .route(
            "/{id}/image",
            post(upload_image).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
}

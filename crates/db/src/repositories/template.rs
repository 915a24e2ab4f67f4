//! Template repository.

use std::sync::Arc;

use crate::entities::{Template, template};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder,
};
use sitecraft_common::{AppError, AppResult};

/// Template repository for database operations.
#[derive(Clone)]
pub struct TemplateRepository {
    db: Arc<DatabaseConnection>,
}

impl TemplateRepository {
    /// Create a new template repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a template by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<template::Model>> {
        Template::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a template by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<template::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::TemplateNotFound(id.to_string()))
    }

    /// List active templates in catalog order.
    pub async fn find_active(&self) -> AppResult<Vec<template::Model>> {
        Template::find()
            .filter(template::Column::IsActive.eq(true))
            .order_by_asc(template::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List all templates, including inactive ones.
    pub async fn find_all(&self) -> AppResult<Vec<template::Model>> {
        Template::find()
            .order_by_asc(template::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new template.
    pub async fn create(&self, model: template::ActiveModel) -> AppResult<template::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a template.
    pub async fn update(&self, model: template::ActiveModel) -> AppResult<template::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a template.
    pub async fn delete(&self, template: template::Model) -> AppResult<()> {
        template
            .delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Count all templates.
    pub async fn count(&self) -> AppResult<u64> {
        Template::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count active templates.
    pub async fn count_active(&self) -> AppResult<u64> {
        Template::find()
            .filter(template::Column::IsActive.eq(true))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

//! Template catalog service.

use std::sync::Arc;

use sea_orm::Set;
use serde::{Deserialize, Deserializer};
use sitecraft_common::{
    AppError, AppResult, IdGenerator, StorageBackend, UploadedFile, generate_storage_key,
};
use sitecraft_db::{
    entities::{template, user},
    repositories::TemplateRepository,
};
use validator::{Validate, ValidationError};

use super::access;

/// Input for creating a template.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_create_prices"))]
pub struct CreateTemplateInput {
    #[validate(length(min = 1, max = 256))]
    pub name: String,

    #[validate(length(max = 5000))]
    #[serde(default)]
    pub description: String,

    #[validate(length(min = 1, max = 64))]
    pub category: String,

    #[serde(default)]
    pub features: Vec<String>,

    #[validate(range(min = 0.0))]
    pub original_price: f64,

    #[validate(range(min = 0.0))]
    pub discount_price: Option<f64>,

    #[validate(length(max = 64))]
    pub tag: Option<String>,

    #[validate(url)]
    pub preview_url: Option<String>,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Input for updating a template. Absent fields are left unchanged;
/// `null` clears an optional field.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTemplateInput {
    #[validate(length(min = 1, max = 256))]
    pub name: Option<String>,

    #[validate(length(max = 5000))]
    pub description: Option<String>,

    #[validate(length(min = 1, max = 64))]
    pub category: Option<String>,

    pub features: Option<Vec<String>>,

    #[validate(range(min = 0.0))]
    pub original_price: Option<f64>,

    #[serde(default, deserialize_with = "double_option")]
    pub discount_price: Option<Option<f64>>,

    #[serde(default, deserialize_with = "double_option")]
    pub tag: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub preview_url: Option<Option<String>>,

    pub is_active: Option<bool>,
}

const fn default_true() -> bool {
    true
}

fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn validate_create_prices(input: &CreateTemplateInput) -> Result<(), ValidationError> {
    check_discount(input.original_price, input.discount_price)
}

fn check_discount(original: f64, discount: Option<f64>) -> Result<(), ValidationError> {
    match discount {
        Some(d) if d > original => Err(ValidationError::new("discount_above_price")),
        _ => Ok(()),
    }
}

fn clean_features(features: Vec<String>) -> serde_json::Value {
    serde_json::Value::from(
        features
            .into_iter()
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .collect::<Vec<_>>(),
    )
}

/// Template catalog service.
#[derive(Clone)]
pub struct TemplateService {
    template_repo: TemplateRepository,
    assets: Arc<dyn StorageBackend>,
    id_gen: IdGenerator,
}

impl TemplateService {
    /// Create a new template service.
    #[must_use]
    pub fn new(template_repo: TemplateRepository, assets: Arc<dyn StorageBackend>) -> Self {
        Self {
            template_repo,
            assets,
            id_gen: IdGenerator::new(),
        }
    }

    /// Active templates for the public catalog.
    pub async fn list_active(&self) -> AppResult<Vec<template::Model>> {
        self.template_repo.find_active().await
    }

    /// An active template. Inactive ones are reported as missing.
    pub async fn get_active(&self, id: &str) -> AppResult<template::Model> {
        self.template_repo
            .find_by_id(id)
            .await?
            .filter(|t| t.is_active)
            .ok_or_else(|| AppError::TemplateNotFound(id.to_string()))
    }

    /// All templates, including inactive ones.
    pub async fn list_all(&self, actor: &user::Model) -> AppResult<Vec<template::Model>> {
        access::require_admin(actor)?;
        self.template_repo.find_all().await
    }

    /// Public URL of a template's image.
    #[must_use]
    pub fn image_url(&self, template: &template::Model) -> Option<String> {
        template
            .image_key
            .as_deref()
            .map(|key| self.assets.public_url(key))
    }

    /// Create a template.
    pub async fn create(
        &self,
        actor: &user::Model,
        input: CreateTemplateInput,
    ) -> AppResult<template::Model> {
        access::require_admin(actor)?;
        input.validate()?;

        let model = template::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(input.name.trim().to_string()),
            description: Set(input.description),
            category: Set(input.category.trim().to_string()),
            features: Set(clean_features(input.features)),
            original_price: Set(input.original_price),
            discount_price: Set(input.discount_price),
            has_discount: Set(input.discount_price.is_some()),
            tag: Set(input.tag.filter(|t| !t.trim().is_empty())),
            image_key: Set(None),
            preview_url: Set(input.preview_url),
            is_active: Set(input.is_active),
            created_at: Set(chrono::Utc::now().into()),
            updated_at: Set(None),
        };

        let template = self.template_repo.create(model).await?;
        tracing::info!(template_id = %template.id, name = %template.name, "Template created");
        Ok(template)
    }

    /// Update a template. Existing orders keep the name and price they
    /// were placed with.
    pub async fn update(
        &self,
        actor: &user::Model,
        id: &str,
        input: UpdateTemplateInput,
    ) -> AppResult<template::Model> {
        access::require_admin(actor)?;
        input.validate()?;

        let template = self.template_repo.get_by_id(id).await?;

        let original_price = input.original_price.unwrap_or(template.original_price);
        let discount_price = input.discount_price.unwrap_or(template.discount_price);
        check_discount(original_price, discount_price).map_err(|_| {
            AppError::Validation("Discount price cannot exceed the original price".to_string())
        })?;

        let mut active: template::ActiveModel = template.into();

        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(category) = input.category {
            active.category = Set(category.trim().to_string());
        }
        if let Some(features) = input.features {
            active.features = Set(clean_features(features));
        }
        if let Some(tag) = input.tag {
            active.tag = Set(tag.filter(|t| !t.trim().is_empty()));
        }
        if let Some(preview_url) = input.preview_url {
            active.preview_url = Set(preview_url);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.original_price = Set(original_price);
        active.discount_price = Set(discount_price);
        active.has_discount = Set(discount_price.is_some());
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        let updated = self.template_repo.update(active).await?;
        tracing::info!(template_id = %updated.id, "Template updated");
        Ok(updated)
    }

    /// Delete a template and, best effort, its image.
    pub async fn delete(&self, actor: &user::Model, id: &str) -> AppResult<()> {
        access::require_admin(actor)?;

        let template = self.template_repo.get_by_id(id).await?;
        let image_key = template.image_key.clone();
        self.template_repo.delete(template).await?;

        if let Some(key) = image_key {
            self.remove_asset(&key).await;
        }

        tracing::info!(template_id = %id, "Template deleted");
        Ok(())
    }

    /// Replace a template's image.
    pub async fn set_image(
        &self,
        actor: &user::Model,
        id: &str,
        file_name: &str,
        content_type: &str,
        data: &[u8],
    ) -> AppResult<(template::Model, UploadedFile)> {
        access::require_admin(actor)?;

        if !content_type.starts_with("image/") {
            return Err(AppError::BadRequest(format!(
                "Expected an image upload, got {content_type}"
            )));
        }
        if data.is_empty() {
            return Err(AppError::BadRequest("Empty image upload".to_string()));
        }

        let template = self.template_repo.get_by_id(id).await?;
        let previous = template.image_key.clone();

        let key = generate_storage_key(&template.id, file_name);
        let uploaded = self.assets.upload(&key, data, content_type).await?;

        let mut active: template::ActiveModel = template.into();
        active.image_key = Set(Some(uploaded.key.clone()));
        active.updated_at = Set(Some(chrono::Utc::now().into()));
        let updated = self.template_repo.update(active).await?;

        if let Some(old) = previous {
            self.remove_asset(&old).await;
        }

        Ok((updated, uploaded))
    }

    /// Insert the default catalog when no templates exist yet.
    ///
    /// Returns the number of templates inserted.
    pub async fn seed_defaults(&self) -> AppResult<usize> {
        if self.template_repo.count().await? > 0 {
            return Ok(0);
        }

        for entry in DEFAULT_CATALOG {
            let model = template::ActiveModel {
                id: Set(self.id_gen.generate()),
                name: Set(entry.name.to_string()),
                description: Set(entry.description.to_string()),
                category: Set(entry.category.to_string()),
                features: Set(serde_json::Value::from(entry.features.to_vec())),
                original_price: Set(entry.original_price),
                discount_price: Set(entry.discount_price),
                has_discount: Set(entry.discount_price.is_some()),
                tag: Set(entry.tag.map(str::to_string)),
                image_key: Set(Some(entry.image.to_string())),
                preview_url: Set(Some(entry.preview_url.to_string())),
                is_active: Set(true),
                created_at: Set(chrono::Utc::now().into()),
                updated_at: Set(None),
            };
            self.template_repo.create(model).await?;
        }

        tracing::info!(count = DEFAULT_CATALOG.len(), "Seeded default templates");
        Ok(DEFAULT_CATALOG.len())
    }

    async fn remove_asset(&self, key: &str) {
        if let Err(e) = self.assets.delete(key).await {
            tracing::warn!(error = %e, key = %key, "Failed to remove template image");
        }
    }
}

struct CatalogEntry {
    name: &'static str,
    description: &'static str,
    category: &'static str,
    features: &'static [&'static str],
    original_price: f64,
    discount_price: Option<f64>,
    tag: Option<&'static str>,
    image: &'static str,
    preview_url: &'static str,
}

const DEFAULT_CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        name: "E-commerce",
        description: "Online stores for selling products. Includes shopping cart, payment processing, and inventory management.",
        category: "E-commerce",
        features: &["Product Catalog", "Shopping Cart", "Payment Gateway", "Inventory Management", "Customer Accounts"],
        original_price: 865.0,
        discount_price: Some(692.0),
        tag: Some("Popular"),
        image: "ecommerce.png",
        preview_url: "https://demo-ecommerce.webcraftpro.com",
    },
    CatalogEntry {
        name: "Business/Brand",
        description: "Professional websites that represent companies and build trust with customers.",
        category: "Business",
        features: &["About Us", "Services", "Contact Form", "Testimonials", "Responsive Design"],
        original_price: 450.0,
        discount_price: Some(405.0),
        tag: Some("Recommended"),
        image: "business.png",
        preview_url: "https://demo-business.webcraftpro.com",
    },
    CatalogEntry {
        name: "Blog",
        description: "Platforms for regular content publication, articles, and personal thoughts.",
        category: "Blog",
        features: &["Content Management", "Categories/Tags", "Comments", "Social Sharing", "SEO Tools"],
        original_price: 350.0,
        discount_price: None,
        tag: None,
        image: "blog.png",
        preview_url: "https://demo-blog.webcraftpro.com",
    },
    CatalogEntry {
        name: "Portfolio",
        description: "Showcase creative work such as art, design, photography to attract clients.",
        category: "Portfolio",
        features: &["Gallery Display", "Project Details", "Client Testimonials", "Contact Form", "Responsive Layout"],
        original_price: 400.0,
        discount_price: Some(360.0),
        tag: None,
        image: "portfolio.png",
        preview_url: "https://demo-portfolio.webcraftpro.com",
    },
    CatalogEntry {
        name: "Educational",
        description: "Websites for courses, tutorials, and learning resources.",
        category: "Educational",
        features: &["Course Management", "Student Accounts", "Progress Tracking", "Certificates", "Payment Integration"],
        original_price: 950.0,
        discount_price: Some(760.0),
        tag: Some("Best Value"),
        image: "education.png",
        preview_url: "https://demo-education.webcraftpro.com",
    },
    CatalogEntry {
        name: "Social Media",
        description: "Platforms to connect users, share content, and build communities.",
        category: "Social Media",
        features: &["User Profiles", "Content Feed", "Messaging", "Notifications", "Community Features"],
        original_price: 1200.0,
        discount_price: Some(960.0),
        tag: None,
        image: "social.png",
        preview_url: "https://demo-social.webcraftpro.com",
    },
    CatalogEntry {
        name: "News/Media",
        description: "Sites for publishing articles, news, and timely content.",
        category: "News",
        features: &["Article Management", "Categories", "Search Function", "Subscription", "Advertising"],
        original_price: 750.0,
        discount_price: Some(675.0),
        tag: None,
        image: "news.png",
        preview_url: "https://demo-news.webcraftpro.com",
    },
    CatalogEntry {
        name: "Event",
        description: "Platforms to promote events, sell tickets, and manage registrations.",
        category: "Event",
        features: &["Event Calendar", "Ticket Sales", "Registration", "Payment Processing", "Reminders"],
        original_price: 550.0,
        discount_price: Some(495.0),
        tag: None,
        image: "event.png",
        preview_url: "https://demo-event.webcraftpro.com",
    },
    CatalogEntry {
        name: "Forum/Community",
        description: "Discussion-based sites where users can create topics and reply to threads.",
        category: "Forum",
        features: &["User Registration", "Discussion Threads", "Moderation Tools", "Private Messaging", "User Groups"],
        original_price: 600.0,
        discount_price: Some(540.0),
        tag: None,
        image: "forum.png",
        preview_url: "https://demo-forum.webcraftpro.com",
    },
];

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_update_input_distinguishes_null_from_absent() {
        let input: UpdateTemplateInput =
            serde_json::from_str(r#"{"discountPrice": null, "name": "Shop"}"#).unwrap();
        assert_eq!(input.discount_price, Some(None));
        assert_eq!(input.tag, None);
        assert_eq!(input.name.as_deref(), Some("Shop"));
    }

    #[test]
    fn test_create_input_rejects_discount_above_price() {
        let input: CreateTemplateInput = serde_json::from_str(
            r#"{"name": "Shop", "category": "E-commerce", "originalPrice": 100, "discountPrice": 150}"#,
        )
        .unwrap();
        assert!(input.validate().is_err());
        assert!(input.is_active);
    }

    #[test]
    fn test_clean_features() {
        let features = clean_features(vec![" Cart ".to_string(), String::new()]);
        assert_eq!(features, serde_json::json!(["Cart"]));
    }

    #[test]
    fn test_default_catalog_prices() {
        assert_eq!(DEFAULT_CATALOG.len(), 9);
        for entry in DEFAULT_CATALOG {
            assert!(check_discount(entry.original_price, entry.discount_price).is_ok());
        }
    }
}

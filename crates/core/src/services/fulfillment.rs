//! Fulfillment: uploading finished websites and serving them as zip files.

use std::sync::Arc;

use sea_orm::Set;
use sitecraft_common::{
    AppError, AppResult, ArtifactStore, BundleFile, StorageConfig,
    archive::{self, is_zip_name, sanitize_file_name},
};
use sitecraft_db::{
    entities::{order, user},
    repositories::OrderRepository,
};

use super::access;
use super::notification::{NotificationService, bundle_ready_text};

/// Size limits applied to uploaded bundles.
#[derive(Debug, Clone, Copy)]
pub struct BundleLimits {
    /// Largest accepted upload, in bytes.
    pub max_upload_bytes: u64,
    /// Largest total an archive may expand to, in bytes.
    pub max_extracted_bytes: u64,
}

impl From<&StorageConfig> for BundleLimits {
    fn from(config: &StorageConfig) -> Self {
        Self {
            max_upload_bytes: config.max_upload_bytes,
            max_extracted_bytes: config.max_extracted_bytes,
        }
    }
}

/// A packed bundle ready to be sent to the customer.
#[derive(Debug, Clone)]
pub struct DownloadedBundle {
    /// Attachment file name, `{code}_website.zip`.
    pub file_name: String,
    /// Zip archive bytes.
    pub bytes: Vec<u8>,
}

/// Fulfillment service.
#[derive(Clone)]
pub struct FulfillmentService {
    order_repo: OrderRepository,
    store: Arc<dyn ArtifactStore>,
    notification_service: NotificationService,
    limits: BundleLimits,
}

impl FulfillmentService {
    /// Create a new fulfillment service.
    #[must_use]
    pub fn new(
        order_repo: OrderRepository,
        store: Arc<dyn ArtifactStore>,
        notification_service: NotificationService,
        limits: BundleLimits,
    ) -> Self {
        Self {
            order_repo,
            store,
            notification_service,
            limits,
        }
    }

    /// Store the finished website for an order and tell the owner.
    ///
    /// A `.zip` upload is unpacked in memory first; a broken or unsafe
    /// archive leaves the previously stored bundle untouched. Any other file
    /// becomes a single-file bundle. The new bundle replaces the old one.
    pub async fn submit_bundle(
        &self,
        actor: &user::Model,
        order_code: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> AppResult<order::Model> {
        access::require_admin(actor)?;

        let order = self.order_repo.get_by_code(order_code).await?;

        let size = bytes.len() as u64;
        if size > self.limits.max_upload_bytes {
            return Err(AppError::PayloadTooLarge {
                size,
                limit: self.limits.max_upload_bytes,
            });
        }

        let files = if is_zip_name(file_name) {
            let max_extracted = self.limits.max_extracted_bytes;
            let files =
                tokio::task::spawn_blocking(move || archive::unpack(&bytes, max_extracted))
                    .await
                    .map_err(|e| AppError::Internal(format!("Archive task failed: {e}")))??;
            if files.is_empty() {
                return Err(AppError::InvalidArchive(
                    "archive contains no files".to_string(),
                ));
            }
            files
        } else {
            let name = sanitize_file_name(file_name)
                .ok_or_else(|| AppError::Validation(format!("Invalid file name: {file_name}")))?;
            vec![BundleFile::new(name, bytes)]
        };
        let file_count = files.len();

        self.store.replace(&order.id, files).await?;

        let owner_id = order.user_id.clone();
        let order_id = order.id.clone();
        let notification = self.notification_service.draft(
            &owner_id,
            bundle_ready_text(&order.order_code),
            Some(&actor.id),
            Some(&order_id),
        );

        let now = chrono::Utc::now();
        let mut active: order::ActiveModel = order.into();
        active.folder_submitted = Set(true);
        active.folder_submitted_at = Set(Some(now.into()));
        active.updated_at = Set(Some(now.into()));

        let updated = self
            .order_repo
            .update_with_notification(active, notification)
            .await?;

        tracing::info!(
            order_code = %order_code,
            files = file_count,
            bytes = size,
            "Website bundle submitted"
        );
        Ok(updated)
    }

    /// Pack the stored website of a fulfilled order for its owner.
    ///
    /// Orders that are missing, foreign or not yet fulfilled are all
    /// reported as not found.
    pub async fn download_bundle(
        &self,
        customer: &user::Model,
        order_code: &str,
    ) -> AppResult<DownloadedBundle> {
        let order = self
            .order_repo
            .find_by_code(order_code)
            .await?
            .filter(|o| o.user_id == customer.id && o.folder_submitted)
            .ok_or_else(|| AppError::OrderNotFound(order_code.to_string()))?;

        let mut files = self.store.load(&order.id).await?;
        if files.is_empty() {
            tracing::warn!(order_code = %order_code, "Bundle missing on disk, serving placeholder");
            let placeholder = BundleFile::new("index.html", placeholder_page(&order));
            self.store.put_file(&order.id, placeholder.clone()).await?;
            files.push(placeholder);
        }

        let bytes = tokio::task::spawn_blocking(move || archive::pack(&files))
            .await
            .map_err(|e| AppError::Internal(format!("Archive task failed: {e}")))??;

        let file_name = order.archive_name();
        self.store.store_archive(&file_name, &bytes).await?;

        tracing::debug!(order_code = %order_code, bytes = bytes.len(), "Website bundle packed");
        Ok(DownloadedBundle { file_name, bytes })
    }
}

fn placeholder_page(order: &order::Model) -> String {
    let title = if order.website_name.is_empty() {
        "Your Website"
    } else {
        order.website_name.as_str()
    };
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n<title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n<p><strong>Order ID:</strong> {code}</p>\n<p>This is your completed website folder. Upload these files to your hosting provider.</p>\n</body>\n</html>\n",
        title = html_escape(title),
        code = order.order_code,
    )
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("<b>A&B</b>"), "&lt;b&gt;A&amp;B&lt;/b&gt;");
    }

    #[test]
    fn test_limits_from_storage_config() {
        let limits = BundleLimits::from(&StorageConfig::default());
        assert_eq!(limits.max_upload_bytes, 16 * 1024 * 1024);
        assert_eq!(limits.max_extracted_bytes, 64 * 1024 * 1024);
    }
}

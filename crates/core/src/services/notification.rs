//! Notification service.

use sea_orm::Set;
use sitecraft_common::{AppResult, IdGenerator};
use sitecraft_db::{entities::notification, repositories::NotificationRepository};

/// Default page size for notification lists.
pub const DEFAULT_LIST_LIMIT: u64 = 50;

/// Text sent to an owner when staff move an order forward.
#[must_use]
pub fn order_progress_text(order_code: &str, stage: &str, status: &str) -> String {
    format!("Your order {order_code} status has been updated: Stage - {stage}, Status - {status}")
}

/// Text sent to an owner when staff write on the order conversation.
#[must_use]
pub fn admin_message_text(order_code: &str, text: &str) -> String {
    format!("New message from admin regarding order {order_code}: {text}")
}

/// Text sent to an owner when the finished website is uploaded.
#[must_use]
pub fn bundle_ready_text(order_code: &str) -> String {
    format!(
        "Your website folder for order {order_code} has been submitted and is ready for download!"
    )
}

/// Notification service for business logic.
#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
    id_gen: IdGenerator,
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub const fn new(notification_repo: NotificationRepository) -> Self {
        Self {
            notification_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Build an unsaved notification, for callers that insert it inside
    /// their own transaction.
    #[must_use]
    pub fn draft(
        &self,
        notifiee_id: &str,
        message: String,
        notifier_id: Option<&str>,
        order_id: Option<&str>,
    ) -> notification::ActiveModel {
        notification::ActiveModel {
            id: Set(self.id_gen.generate()),
            notifiee_id: Set(notifiee_id.to_string()),
            notifier_id: Set(notifier_id.map(str::to_string)),
            order_id: Set(order_id.map(str::to_string)),
            message: Set(message),
            is_read: Set(false),
            created_at: Set(chrono::Utc::now().into()),
        }
    }

    /// Append a notification for a user.
    pub async fn notify(
        &self,
        notifiee_id: &str,
        message: String,
        notifier_id: Option<&str>,
        order_id: Option<&str>,
    ) -> AppResult<notification::Model> {
        let model = self.draft(notifiee_id, message, notifier_id, order_id);
        let created = self.notification_repo.create(model).await?;
        tracing::debug!(
            notification_id = %created.id,
            notifiee_id = %notifiee_id,
            "Notification created"
        );
        Ok(created)
    }

    /// Get notifications for a user, newest first.
    pub async fn list(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<notification::Model>> {
        self.notification_repo
            .find_by_user(user_id, limit, until_id, false)
            .await
    }

    /// Count unread notifications for a user.
    pub async fn unread_count(&self, user_id: &str) -> AppResult<u64> {
        self.notification_repo.count_unread(user_id).await
    }

    /// Count the user's orders that have unread notifications.
    pub async fn unread_order_count(&self, user_id: &str) -> AppResult<u64> {
        self.notification_repo.count_unread_orders(user_id).await
    }

    /// Mark the user's notifications about one order as read.
    pub async fn mark_order_read(&self, user_id: &str, order_id: &str) -> AppResult<u64> {
        self.notification_repo
            .mark_order_as_read(user_id, order_id)
            .await
    }

    /// Mark all notifications as read.
    pub async fn mark_all_read(&self, user_id: &str) -> AppResult<u64> {
        self.notification_repo.mark_all_as_read(user_id).await
    }
}

//! Order conversation service.

use sea_orm::Set;
use serde::Deserialize;
use sitecraft_common::{AppError, AppResult, IdGenerator};
use sitecraft_db::{
    entities::{
        order,
        order_message::{self, MessageSender},
        user,
    },
    repositories::{OrderMessageRepository, OrderRepository},
};
use validator::Validate;

use super::notification::{NotificationService, admin_message_text};

/// Input for posting a message.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PostMessageInput {
    #[validate(length(max = 5000))]
    pub text: String,
}

/// Order conversation service.
#[derive(Clone)]
pub struct MessagingService {
    order_repo: OrderRepository,
    message_repo: OrderMessageRepository,
    notification_service: NotificationService,
    id_gen: IdGenerator,
}

impl MessagingService {
    /// Create a new messaging service.
    #[must_use]
    pub const fn new(
        order_repo: OrderRepository,
        message_repo: OrderMessageRepository,
        notification_service: NotificationService,
    ) -> Self {
        Self {
            order_repo,
            message_repo,
            notification_service,
            id_gen: IdGenerator::new(),
        }
    }

    /// Post a message on an order's conversation.
    ///
    /// Customers may only write on their own orders once staff have granted
    /// the order. Staff may always write, and the owner is notified.
    pub async fn post_message(
        &self,
        author: &user::Model,
        order_code: &str,
        input: PostMessageInput,
    ) -> AppResult<order_message::Model> {
        input.validate()?;
        let text = input.text.trim();
        if text.is_empty() {
            return Err(AppError::Validation("Message must not be empty".to_string()));
        }

        let order = self
            .order_repo
            .find_by_code(order_code)
            .await?
            .filter(|o| author.is_admin() || o.user_id == author.id)
            .ok_or_else(|| AppError::OrderNotFound(order_code.to_string()))?;

        let sender = if author.is_admin() {
            MessageSender::Admin
        } else {
            if !order.status.allows_customer_chat() {
                return Err(AppError::Forbidden(format!(
                    "Messaging opens once the order is Granted (currently {})",
                    order.status
                )));
            }
            MessageSender::User
        };

        let model = order_message::ActiveModel {
            id: Set(self.id_gen.generate()),
            order_id: Set(order.id.clone()),
            user_id: Set(author.id.clone()),
            text: Set(text.to_string()),
            sender: Set(sender),
            created_at: Set(chrono::Utc::now().into()),
        };
        let message = if sender == MessageSender::Admin {
            let notification = self.notification_service.draft(
                &order.user_id,
                admin_message_text(&order.order_code, text),
                Some(&author.id),
                Some(&order.id),
            );
            self.message_repo
                .create_with_notification(model, notification)
                .await?
        } else {
            self.message_repo.create(model).await?
        };

        tracing::info!(
            order_code = %order.order_code,
            message_id = %message.id,
            sender = ?sender,
            "Order message posted"
        );
        Ok(message)
    }

    /// Messages of an order in creation order.
    pub async fn conversation(&self, order: &order::Model) -> AppResult<Vec<order_message::Model>> {
        self.message_repo.find_by_order(&order.id).await
    }
}

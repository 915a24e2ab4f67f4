//! Order conversation repository.

use std::sync::Arc;

use crate::entities::{OrderMessage, notification, order_message};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};
use sitecraft_common::{AppError, AppResult};

/// Order message repository for database operations.
#[derive(Clone)]
pub struct OrderMessageRepository {
    db: Arc<DatabaseConnection>,
}

impl OrderMessageRepository {
    /// Create a new order message repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Append a message.
    pub async fn create(
        &self,
        model: order_message::ActiveModel,
    ) -> AppResult<order_message::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Append a message and record a notification in one transaction.
    pub async fn create_with_notification(
        &self,
        model: order_message::ActiveModel,
        notification: notification::ActiveModel,
    ) -> AppResult<order_message::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let message = model
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        notification
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(message)
    }

    /// All messages of an order in creation order.
    pub async fn find_by_order(&self, order_id: &str) -> AppResult<Vec<order_message::Model>> {
        OrderMessage::find()
            .filter(order_message::Column::OrderId.eq(order_id))
            .order_by_asc(order_message::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

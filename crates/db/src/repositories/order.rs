//! Order repository.

use std::sync::Arc;

use crate::entities::{Order, notification, order};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
};
use sitecraft_common::{AppError, AppResult};

/// Filters for the staff order list.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    /// Only orders with this status.
    pub status: Option<order::OrderStatus>,
    /// Only orders of this kind.
    pub order_type: Option<order::OrderType>,
    /// Only fulfilled (or only unfulfilled) orders.
    pub folder_submitted: Option<bool>,
}

/// Order repository for database operations.
#[derive(Clone)]
pub struct OrderRepository {
    db: Arc<DatabaseConnection>,
}

impl OrderRepository {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an order by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<order::Model>> {
        Order::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an order by its public code.
    pub async fn find_by_code(&self, code: &str) -> AppResult<Option<order::Model>> {
        Order::find()
            .filter(order::Column::OrderCode.eq(code))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an order by its public code, returning an error if not found.
    pub async fn get_by_code(&self, code: &str) -> AppResult<order::Model> {
        self.find_by_code(code)
            .await?
            .ok_or_else(|| AppError::OrderNotFound(code.to_string()))
    }

    /// Check whether an order code is already taken.
    pub async fn code_exists(&self, code: &str) -> AppResult<bool> {
        let count = Order::find()
            .filter(order::Column::OrderCode.eq(code))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// Create a new order.
    pub async fn create(&self, model: order::ActiveModel) -> AppResult<order::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update an order and record a notification in one transaction.
    pub async fn update_with_notification(
        &self,
        model: order::ActiveModel,
        notification: notification::ActiveModel,
    ) -> AppResult<order::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let updated = model
            .update(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        notification
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(updated)
    }

    /// Orders owned by a user, newest first.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<order::Model>> {
        Order::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Fulfilled orders owned by a user, most recent submission first.
    pub async fn find_fulfilled_by_user(&self, user_id: &str) -> AppResult<Vec<order::Model>> {
        Order::find()
            .filter(order::Column::UserId.eq(user_id))
            .filter(order::Column::FolderSubmitted.eq(true))
            .order_by_desc(order::Column::FolderSubmittedAt)
            .order_by_desc(order::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All orders matching a filter, newest first (paginated).
    pub async fn find_all(
        &self,
        filter: &OrderFilter,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<order::Model>> {
        let mut query = Order::find().order_by_desc(order::Column::Id);

        if let Some(status) = filter.status {
            query = query.filter(order::Column::Status.eq(status));
        }
        if let Some(order_type) = filter.order_type {
            query = query.filter(order::Column::OrderType.eq(order_type));
        }
        if let Some(submitted) = filter.folder_submitted {
            query = query.filter(order::Column::FolderSubmitted.eq(submitted));
        }
        if let Some(id) = until_id {
            query = query.filter(order::Column::Id.lt(id));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count orders matching a filter.
    pub async fn count(&self, filter: &OrderFilter) -> AppResult<u64> {
        let mut query = Order::find();

        if let Some(status) = filter.status {
            query = query.filter(order::Column::Status.eq(status));
        }
        if let Some(order_type) = filter.order_type {
            query = query.filter(order::Column::OrderType.eq(order_type));
        }
        if let Some(submitted) = filter.folder_submitted {
            query = query.filter(order::Column::FolderSubmitted.eq(submitted));
        }

        query
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count a user's orders whose website bundle has been delivered.
    pub async fn count_fulfilled_by_user(&self, user_id: &str) -> AppResult<u64> {
        Order::find()
            .filter(order::Column::UserId.eq(user_id))
            .filter(order::Column::FolderSubmitted.eq(true))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::order::{OrderStatus, OrderType};
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_order(id: &str, code: &str) -> order::Model {
        order::Model {
            id: id.to_string(),
            order_code: code.to_string(),
            user_id: "user1".to_string(),
            template_id: Some("t1".to_string()),
            website_type: "Portfolio Website".to_string(),
            answers: None,
            budget: "360".to_string(),
            stage: "Template Selected".to_string(),
            status: OrderStatus::Pending,
            order_type: OrderType::Template,
            website_name: "Jane Doe Studio".to_string(),
            requirements: "Dark theme".to_string(),
            folder_submitted: false,
            folder_submitted_at: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_get_by_code_found() {
        let order = create_test_order("o1", "TMP-ab12cd34");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[order]])
                .into_connection(),
        );

        let repo = OrderRepository::new(db);
        let found = repo.get_by_code("TMP-ab12cd34").await.unwrap();
        assert_eq!(found.id, "o1");
        assert_eq!(found.archive_name(), "TMP-ab12cd34_website.zip");
    }

    #[tokio::test]
    async fn test_get_by_code_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<order::Model>::new()])
                .into_connection(),
        );

        let repo = OrderRepository::new(db);
        let result = repo.get_by_code("TMP-00000000").await;
        assert!(matches!(result, Err(AppError::OrderNotFound(_))));
    }

    #[tokio::test]
    async fn test_code_exists() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(0))
                }]])
                .into_connection(),
        );

        let repo = OrderRepository::new(db);
        assert!(!repo.code_exists("CUST-12345678").await.unwrap());
    }

    #[tokio::test]
    async fn test_find_by_user() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_test_order("o2", "TMP-22222222"),
                    create_test_order("o1", "TMP-11111111"),
                ]])
                .into_connection(),
        );

        let repo = OrderRepository::new(db);
        let orders = repo.find_by_user("user1").await.unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].id, "o2");
    }
}

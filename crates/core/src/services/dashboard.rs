//! Dashboard counters for customers and staff.

use serde::Serialize;
use sitecraft_common::AppResult;
use sitecraft_db::{
    entities::{
        order::{self, OrderStatus, OrderType},
        user,
    },
    repositories::{OrderFilter, OrderRepository, TemplateRepository, UserRepository},
};

use super::access;
use super::notification::NotificationService;

/// Number of recent orders of each kind shown on the admin dashboard.
pub const RECENT_ORDERS: u64 = 10;

/// Staff overview of the storefront.
#[derive(Debug, Clone)]
pub struct AdminOverview {
    pub users: u64,
    pub orders: u64,
    pub pending_orders: u64,
    pub custom_orders: u64,
    pub active_templates: u64,
    pub submitted_folders: u64,
    pub recent_template_orders: Vec<order::Model>,
    pub recent_custom_orders: Vec<order::Model>,
}

/// Counters shown on a customer's dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOverview {
    pub unread_notifications: u64,
    pub unread_orders: u64,
    pub completed_websites: u64,
}

#[derive(Clone)]
pub struct DashboardService {
    user_repo: UserRepository,
    order_repo: OrderRepository,
    template_repo: TemplateRepository,
    notification_service: NotificationService,
}

impl DashboardService {
    #[must_use]
    pub const fn new(
        user_repo: UserRepository,
        order_repo: OrderRepository,
        template_repo: TemplateRepository,
        notification_service: NotificationService,
    ) -> Self {
        Self {
            user_repo,
            order_repo,
            template_repo,
            notification_service,
        }
    }

    /// Storefront-wide counts plus the latest orders of each kind.
    pub async fn admin_overview(&self, actor: &user::Model) -> AppResult<AdminOverview> {
        access::require_admin(actor)?;

        let template_filter = OrderFilter {
            order_type: Some(OrderType::Template),
            ..OrderFilter::default()
        };
        let custom_filter = OrderFilter {
            order_type: Some(OrderType::Custom),
            ..OrderFilter::default()
        };

        Ok(AdminOverview {
            users: self.user_repo.count().await?,
            orders: self.order_repo.count(&OrderFilter::default()).await?,
            pending_orders: self
                .order_repo
                .count(&OrderFilter {
                    status: Some(OrderStatus::Pending),
                    ..OrderFilter::default()
                })
                .await?,
            custom_orders: self.order_repo.count(&custom_filter).await?,
            active_templates: self.template_repo.count_active().await?,
            submitted_folders: self
                .order_repo
                .count(&OrderFilter {
                    folder_submitted: Some(true),
                    ..OrderFilter::default()
                })
                .await?,
            recent_template_orders: self
                .order_repo
                .find_all(&template_filter, RECENT_ORDERS, None)
                .await?,
            recent_custom_orders: self
                .order_repo
                .find_all(&custom_filter, RECENT_ORDERS, None)
                .await?,
        })
    }

    /// Counters for a customer's dashboard.
    pub async fn user_overview(&self, customer: &user::Model) -> AppResult<UserOverview> {
        Ok(UserOverview {
            unread_notifications: self.notification_service.unread_count(&customer.id).await?,
            unread_orders: self
                .notification_service
                .unread_order_count(&customer.id)
                .await?,
            completed_websites: self.order_repo.count_fulfilled_by_user(&customer.id).await?,
        })
    }
}

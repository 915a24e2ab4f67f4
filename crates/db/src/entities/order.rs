//! Order entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order status. Staff may move an order between any two statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum OrderStatus {
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "In Progress")]
    #[serde(rename = "In Progress")]
    InProgress,
    #[sea_orm(string_value = "Completed")]
    Completed,
    /// Unlocks the customer side of the order conversation
    #[sea_orm(string_value = "Granted")]
    Granted,
    #[sea_orm(string_value = "Cancelled")]
    Cancelled,
}

impl OrderStatus {
    /// Parse a status from its display label.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        Self::try_from_value(&label.trim().to_string()).ok()
    }

    /// Display label, identical to the stored value.
    #[must_use]
    pub fn label(self) -> String {
        self.to_value()
    }

    /// Whether the owner may post messages on the order.
    #[must_use]
    pub const fn allows_customer_chat(self) -> bool {
        matches!(self, Self::Granted)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_value())
    }
}

/// How the order was placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    #[sea_orm(string_value = "template")]
    Template,
    #[sea_orm(string_value = "custom")]
    Custom,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Public order code (`TMP-xxxxxxxx` / `CUST-xxxxxxxx`), immutable
    #[sea_orm(unique)]
    pub order_code: String,

    /// Owner
    pub user_id: String,

    /// Template the order was placed from (weak reference)
    #[sea_orm(nullable)]
    pub template_id: Option<String>,

    pub website_type: String,

    /// Questionnaire transcript (custom orders only)
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub answers: Option<Json>,

    pub budget: String,

    /// Free-text production stage
    pub stage: String,

    pub status: OrderStatus,

    pub order_type: OrderType,

    pub website_name: String,

    #[sea_orm(column_type = "Text")]
    pub requirements: String,

    /// Set once a bundle has been uploaded; never reset
    #[sea_orm(default_value = false)]
    pub folder_submitted: bool,

    #[sea_orm(nullable)]
    pub folder_submitted_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// File name of the downloadable archive.
    #[must_use]
    pub fn archive_name(&self) -> String {
        format!("{}_website.zip", self.order_code)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,

    #[sea_orm(has_many = "super::order_message::Entity")]
    Messages,

    #[sea_orm(has_many = "super::notification::Entity")]
    Notifications,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::order_message::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Messages.def()
    }
}

impl Related<super::notification::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notifications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

//! Template entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "template")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub name: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    pub category: String,

    /// Ordered list of short feature strings (JSON array)
    #[sea_orm(column_type = "JsonBinary")]
    pub features: Json,

    pub original_price: f64,

    #[sea_orm(nullable)]
    pub discount_price: Option<f64>,

    #[sea_orm(default_value = false)]
    pub has_discount: bool,

    /// Promotional tag such as "Popular"
    #[sea_orm(nullable)]
    pub tag: Option<String>,

    /// Asset storage key of the preview image
    #[sea_orm(nullable)]
    pub image_key: Option<String>,

    #[sea_orm(nullable)]
    pub preview_url: Option<String>,

    #[sea_orm(default_value = true)]
    pub is_active: bool,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// Price a new order is charged: the discount price when one applies.
    #[must_use]
    pub fn effective_price(&self) -> f64 {
        match (self.has_discount, self.discount_price) {
            (true, Some(price)) => price,
            _ => self.original_price,
        }
    }

    /// Features as plain strings. Non-string entries are skipped.
    #[must_use]
    pub fn feature_list(&self) -> Vec<String> {
        self.features
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn template(has_discount: bool, discount_price: Option<f64>) -> Model {
        Model {
            id: "t1".to_string(),
            name: "Portfolio Website".to_string(),
            description: String::new(),
            category: "portfolio".to_string(),
            features: serde_json::json!(["Gallery", 3, "Contact Form"]),
            original_price: 400.0,
            discount_price,
            has_discount,
            tag: None,
            image_key: None,
            preview_url: None,
            is_active: true,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[test]
    fn test_effective_price() {
        assert_eq!(template(true, Some(360.0)).effective_price(), 360.0);
        assert_eq!(template(false, Some(360.0)).effective_price(), 400.0);
        assert_eq!(template(true, None).effective_price(), 400.0);
    }

    #[test]
    fn test_feature_list_skips_non_strings() {
        assert_eq!(
            template(false, None).feature_list(),
            vec!["Gallery".to_string(), "Contact Form".to_string()]
        );
    }
}

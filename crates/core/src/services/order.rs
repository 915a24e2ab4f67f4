//! Order lifecycle service.
//!
//! The only writer of order rows besides bundle fulfillment: it creates
//! orders from templates or questionnaire answers and applies staff
//! progress updates.

use std::sync::Arc;

use sea_orm::Set;
use serde::{Deserialize, Serialize};
use sitecraft_common::{AppError, AppResult, IdGenerator, OrderCodePrefix, QuestionnaireConfig};
use sitecraft_db::{
    entities::{
        order::{self, OrderStatus, OrderType},
        user,
    },
    repositories::{OrderFilter, OrderRepository, TemplateRepository},
};
use validator::Validate;

use super::access;
use super::notification::{NotificationService, order_progress_text};

/// Attempts at drawing an unused order code before giving up.
const ORDER_CODE_ATTEMPTS: usize = 5;

/// Stage of a freshly placed template order.
pub const TEMPLATE_ORDER_STAGE: &str = "Template Selected";
/// Stage of a freshly placed custom order.
pub const CUSTOM_ORDER_STAGE: &str = "Requirement Analysis";
/// Website type recorded on custom orders.
pub const CUSTOM_WEBSITE_TYPE: &str = "Custom Website";
/// Requirements text recorded on custom orders.
pub const CUSTOM_REQUIREMENTS: &str = "Custom website requirements collected through consultation.";
/// Budget recorded when the questionnaire budget answer is missing.
pub const BUDGET_NOT_SPECIFIED: &str = "Not specified";

/// Input for ordering a catalog template.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TemplateOrderInput {
    #[validate(length(min = 1, max = 32))]
    pub template_id: String,

    #[validate(length(min = 1, max = 256))]
    pub website_name: String,

    #[validate(length(max = 10000))]
    #[serde(default)]
    pub requirements: String,
}

/// Input for a staff progress update.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceOrderInput {
    #[validate(length(min = 1, max = 256))]
    pub stage: String,

    /// Status label, e.g. `"In Progress"`.
    pub status: String,
}

/// One question of the questionnaire with the customer's answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionAnswer {
    pub question: String,
    pub answer: String,
}

/// Stored questionnaire transcript of a custom order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    /// Version of the script the answers respond to.
    pub version: u32,
    pub answers: Vec<QuestionAnswer>,
}

impl Transcript {
    /// Decode the transcript stored on an order, if any.
    #[must_use]
    pub fn from_order(order: &order::Model) -> Option<Self> {
        order
            .answers
            .as_ref()
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}

/// Order lifecycle service.
#[derive(Clone)]
pub struct OrderService {
    order_repo: OrderRepository,
    template_repo: TemplateRepository,
    notification_service: NotificationService,
    questionnaire: Arc<QuestionnaireConfig>,
    id_gen: IdGenerator,
}

impl OrderService {
    /// Create a new order service.
    #[must_use]
    pub const fn new(
        order_repo: OrderRepository,
        template_repo: TemplateRepository,
        notification_service: NotificationService,
        questionnaire: Arc<QuestionnaireConfig>,
    ) -> Self {
        Self {
            order_repo,
            template_repo,
            notification_service,
            questionnaire,
            id_gen: IdGenerator::new(),
        }
    }

    /// The questionnaire customers answer for custom orders.
    #[must_use]
    pub fn questionnaire(&self) -> &QuestionnaireConfig {
        &self.questionnaire
    }

    /// Place an order for a catalog template.
    ///
    /// The template's name and current effective price are copied onto the
    /// order; later template edits do not affect it.
    pub async fn create_template_order(
        &self,
        customer: &user::Model,
        input: TemplateOrderInput,
    ) -> AppResult<order::Model> {
        input.validate()?;

        let template = self
            .template_repo
            .find_by_id(&input.template_id)
            .await?
            .filter(|t| t.is_active)
            .ok_or_else(|| AppError::TemplateNotFound(input.template_id.clone()))?;

        let order_code = self.unused_code(OrderCodePrefix::Template).await?;

        let model = order::ActiveModel {
            id: Set(self.id_gen.generate()),
            order_code: Set(order_code),
            user_id: Set(customer.id.clone()),
            template_id: Set(Some(template.id.clone())),
            website_type: Set(template.name.clone()),
            answers: Set(None),
            budget: Set(format_price(template.effective_price())),
            stage: Set(TEMPLATE_ORDER_STAGE.to_string()),
            status: Set(OrderStatus::Pending),
            order_type: Set(OrderType::Template),
            website_name: Set(input.website_name.trim().to_string()),
            requirements: Set(input.requirements.trim().to_string()),
            folder_submitted: Set(false),
            folder_submitted_at: Set(None),
            created_at: Set(chrono::Utc::now().into()),
            updated_at: Set(None),
        };

        let order = self.order_repo.create(model).await?;
        tracing::info!(
            order_code = %order.order_code,
            user_id = %customer.id,
            template_id = %template.id,
            "Template order placed"
        );
        Ok(order)
    }

    /// Place a custom order from questionnaire answers.
    ///
    /// Answer `i` responds to question `i` of the configured script.
    pub async fn create_custom_order(
        &self,
        customer: &user::Model,
        answers: Vec<String>,
    ) -> AppResult<order::Model> {
        let questions = &self.questionnaire.questions;

        if answers.iter().all(|a| a.trim().is_empty()) {
            return Err(AppError::Validation(
                "At least one questionnaire answer is required".to_string(),
            ));
        }
        if answers.len() > questions.len() {
            return Err(AppError::Validation(format!(
                "Received {} answers for a questionnaire of {} questions",
                answers.len(),
                questions.len()
            )));
        }

        let answer_at = |index: usize| {
            answers
                .get(index)
                .map(|a| a.trim())
                .filter(|a| !a.is_empty())
        };
        let budget = answer_at(self.questionnaire.budget_index)
            .unwrap_or(BUDGET_NOT_SPECIFIED)
            .to_string();
        let website_name = answer_at(self.questionnaire.website_name_index)
            .unwrap_or_default()
            .to_string();

        let transcript = Transcript {
            version: self.questionnaire.version,
            answers: questions
                .iter()
                .zip(answers)
                .map(|(question, answer)| QuestionAnswer {
                    question: question.clone(),
                    answer,
                })
                .collect(),
        };
        let transcript = serde_json::to_value(&transcript)
            .map_err(|e| AppError::Internal(format!("Failed to encode answers: {e}")))?;

        let order_code = self.unused_code(OrderCodePrefix::Custom).await?;

        let model = order::ActiveModel {
            id: Set(self.id_gen.generate()),
            order_code: Set(order_code),
            user_id: Set(customer.id.clone()),
            template_id: Set(None),
            website_type: Set(CUSTOM_WEBSITE_TYPE.to_string()),
            answers: Set(Some(transcript)),
            budget: Set(budget),
            stage: Set(CUSTOM_ORDER_STAGE.to_string()),
            status: Set(OrderStatus::Pending),
            order_type: Set(OrderType::Custom),
            website_name: Set(website_name),
            requirements: Set(CUSTOM_REQUIREMENTS.to_string()),
            folder_submitted: Set(false),
            folder_submitted_at: Set(None),
            created_at: Set(chrono::Utc::now().into()),
            updated_at: Set(None),
        };

        let order = self.order_repo.create(model).await?;
        tracing::info!(
            order_code = %order.order_code,
            user_id = %customer.id,
            budget = %order.budget,
            "Custom order placed"
        );
        Ok(order)
    }

    /// Apply a staff progress update and notify the owner.
    ///
    /// The order update and the notification commit together.
    pub async fn advance(
        &self,
        actor: &user::Model,
        order_code: &str,
        input: AdvanceOrderInput,
    ) -> AppResult<order::Model> {
        access::require_admin(actor)?;
        input.validate()?;

        let stage = input.stage.trim().to_string();
        if stage.is_empty() {
            return Err(AppError::Validation("Stage must not be blank".to_string()));
        }
        let status = OrderStatus::parse(&input.status)
            .ok_or_else(|| AppError::Validation(format!("Unknown status: {}", input.status)))?;

        let order = self.order_repo.get_by_code(order_code).await?;
        let previous = order.status;
        let owner_id = order.user_id.clone();
        let order_id = order.id.clone();

        let notification = self.notification_service.draft(
            &owner_id,
            order_progress_text(order_code, &stage, &status.label()),
            Some(&actor.id),
            Some(&order_id),
        );

        let mut active: order::ActiveModel = order.into();
        active.stage = Set(stage);
        active.status = Set(status);
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        let updated = self
            .order_repo
            .update_with_notification(active, notification)
            .await?;

        tracing::info!(
            order_code = %order_code,
            from = %previous,
            to = %status,
            stage = %updated.stage,
            "Order advanced"
        );
        Ok(updated)
    }

    /// Orders owned by a customer, newest first.
    pub async fn list_for_user(&self, customer: &user::Model) -> AppResult<Vec<order::Model>> {
        self.order_repo.find_by_user(&customer.id).await
    }

    /// An order the caller owns. Foreign orders look like missing ones.
    pub async fn get_for_owner(
        &self,
        customer: &user::Model,
        order_code: &str,
    ) -> AppResult<order::Model> {
        self.order_repo
            .find_by_code(order_code)
            .await?
            .filter(|o| o.user_id == customer.id)
            .ok_or_else(|| AppError::OrderNotFound(order_code.to_string()))
    }

    /// Fulfilled orders of a customer, latest submission first.
    pub async fn list_fulfilled(&self, customer: &user::Model) -> AppResult<Vec<order::Model>> {
        self.order_repo.find_fulfilled_by_user(&customer.id).await
    }

    /// All orders for staff, newest first.
    pub async fn list_all(
        &self,
        actor: &user::Model,
        filter: &OrderFilter,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<order::Model>> {
        access::require_admin(actor)?;
        self.order_repo.find_all(filter, limit, until_id).await
    }

    /// Any order by code, for staff.
    pub async fn get_by_code(&self, actor: &user::Model, order_code: &str) -> AppResult<order::Model> {
        access::require_admin(actor)?;
        self.order_repo.get_by_code(order_code).await
    }

    async fn unused_code(&self, prefix: OrderCodePrefix) -> AppResult<String> {
        for _ in 0..ORDER_CODE_ATTEMPTS {
            let code = self.id_gen.generate_order_code(prefix);
            if !self.order_repo.code_exists(&code).await? {
                return Ok(code);
            }
            tracing::warn!(order_code = %code, "Order code collision, retrying");
        }
        Err(AppError::Internal(
            "Could not allocate a unique order code".to_string(),
        ))
    }
}

/// Render a price the way it is shown to customers (`692`, `692.5`).
#[must_use]
pub fn format_price(price: f64) -> String {
    format!("{price}")
}

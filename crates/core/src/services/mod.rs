//! Business logic services.

#![allow(missing_docs)]

pub mod access;
pub mod account;
pub mod dashboard;
pub mod fulfillment;
pub mod messaging;
pub mod notification;
pub mod order;
pub mod template;

pub use account::{AccountService, SignupInput};
pub use dashboard::{AdminOverview, DashboardService, UserOverview};
pub use fulfillment::{BundleLimits, DownloadedBundle, FulfillmentService};
pub use messaging::{MessagingService, PostMessageInput};
pub use notification::NotificationService;
pub use order::{
    AdvanceOrderInput, OrderService, QuestionAnswer, TemplateOrderInput, Transcript,
};
pub use template::{CreateTemplateInput, TemplateService, UpdateTemplateInput};

//! Database repositories.

mod notification;
mod order;
mod order_message;
mod template;
mod user;

pub use notification::NotificationRepository;
pub use order::{OrderFilter, OrderRepository};
pub use order_message::OrderMessageRepository;
pub use template::TemplateRepository;
pub use user::UserRepository;

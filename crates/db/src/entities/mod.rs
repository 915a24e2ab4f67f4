//! Database entities.

pub mod notification;
pub mod order;
pub mod order_message;
pub mod template;
pub mod user;

pub use notification::Entity as Notification;
pub use order::Entity as Order;
pub use order_message::Entity as OrderMessage;
pub use template::Entity as Template;
pub use user::Entity as User;

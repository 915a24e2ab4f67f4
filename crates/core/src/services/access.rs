//! Capability checks for privileged operations.

use sitecraft_common::{AppError, AppResult};
use sitecraft_db::entities::user;

/// Fail with [`AppError::Forbidden`] unless the actor may administer the shop.
pub fn require_admin(actor: &user::Model) -> AppResult<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Administrator access required".to_string(),
        ))
    }
}

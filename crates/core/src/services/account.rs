//! Account service: sign-up, sign-in, sessions and the bootstrap admin.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::NaiveDate;
use sea_orm::Set;
use serde::Deserialize;
use sitecraft_common::{AdminBootstrapConfig, AppError, AppResult, IdGenerator};
use sitecraft_db::{
    entities::user::{self, UserRole},
    repositories::UserRepository,
};
use validator::Validate;

use super::access;

/// Attempts at drawing an unused public uid before giving up.
const UID_ATTEMPTS: usize = 5;

/// Public uid given to the bootstrap administrator when it is free.
const BOOTSTRAP_ADMIN_UID: &str = "ADMIN001";

/// Account service for business logic.
#[derive(Clone)]
pub struct AccountService {
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

/// Input for creating a new account.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupInput {
    #[validate(length(min = 1, max = 256))]
    pub fullname: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(max = 32))]
    pub whatsapp: Option<String>,

    #[validate(length(max = 32))]
    pub gender: Option<String>,

    pub dob: Option<NaiveDate>,

    #[validate(length(max = 128))]
    pub profession: Option<String>,

    #[validate(length(min = 6, max = 128))]
    pub password: String,
}

impl AccountService {
    /// Create a new account service.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self {
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new customer account.
    pub async fn signup(&self, input: SignupInput) -> AppResult<user::Model> {
        input.validate()?;

        let email = input.email.trim().to_lowercase();
        if self.user_repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let password_hash = hash_password(&input.password)?;
        let uid = self.unused_uid().await?;

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            uid: Set(uid),
            fullname: Set(input.fullname.trim().to_string()),
            email: Set(email),
            whatsapp: Set(non_blank(input.whatsapp)),
            gender: Set(non_blank(input.gender)),
            dob: Set(input.dob),
            profession: Set(non_blank(input.profession)),
            role: Set(UserRole::User),
            password_hash: Set(password_hash),
            token: Set(self.id_gen.generate_token()),
            created_at: Set(chrono::Utc::now().into()),
        };

        let user = self.user_repo.create(model).await?;
        tracing::info!(user_id = %user.id, uid = %user.uid, "Account created");
        Ok(user)
    }

    /// Authenticate with email and password.
    pub async fn signin(&self, email: &str, password: &str) -> AppResult<user::Model> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        Ok(user)
    }

    /// End the session by rotating the user's token.
    pub async fn signout(&self, user: user::Model) -> AppResult<()> {
        let user_id = user.id.clone();
        self.user_repo
            .set_token(user, self.id_gen.generate_token())
            .await?;
        tracing::debug!(user_id = %user_id, "Session token rotated");
        Ok(())
    }

    /// Authenticate a user by session token.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Get a user by ID.
    pub async fn get(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// List accounts for staff, newest first.
    pub async fn list_users(
        &self,
        actor: &user::Model,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<user::Model>> {
        access::require_admin(actor)?;
        self.user_repo.find_all(limit, offset).await
    }

    /// Make sure the configured administrator account exists.
    ///
    /// An existing account with the configured email is returned unchanged.
    pub async fn ensure_admin(&self, config: &AdminBootstrapConfig) -> AppResult<user::Model> {
        if let Some(existing) = self.user_repo.find_by_email(&config.email).await? {
            if !existing.is_admin() {
                tracing::warn!(
                    email = %existing.email,
                    "Bootstrap admin email belongs to a non-admin account"
                );
            }
            return Ok(existing);
        }

        let uid = if self.user_repo.uid_exists(BOOTSTRAP_ADMIN_UID).await? {
            self.unused_uid().await?
        } else {
            BOOTSTRAP_ADMIN_UID.to_string()
        };

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            uid: Set(uid),
            fullname: Set(config.name.clone()),
            email: Set(config.email.trim().to_lowercase()),
            whatsapp: Set(None),
            gender: Set(None),
            dob: Set(None),
            profession: Set(None),
            role: Set(UserRole::Admin),
            password_hash: Set(hash_password(&config.password)?),
            token: Set(self.id_gen.generate_token()),
            created_at: Set(chrono::Utc::now().into()),
        };

        let admin = self.user_repo.create(model).await?;
        tracing::info!(user_id = %admin.id, email = %admin.email, "Bootstrap admin created");
        Ok(admin)
    }

    async fn unused_uid(&self) -> AppResult<String> {
        for _ in 0..UID_ATTEMPTS {
            let uid = self.id_gen.generate_uid();
            if !self.user_repo.uid_exists(&uid).await? {
                return Ok(uid);
            }
        }
        Err(AppError::Internal(
            "Could not allocate a unique user id".to_string(),
        ))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_user(password: &str) -> user::Model {
        user::Model {
            id: "user1".to_string(),
            uid: "AB12CD34".to_string(),
            fullname: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            whatsapp: None,
            gender: None,
            dob: None,
            profession: None,
            role: UserRole::User,
            password_hash: hash_password(password).unwrap(),
            token: "test_token".to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn signup_input(email: &str) -> SignupInput {
        SignupInput {
            fullname: "Jane Doe".to_string(),
            email: email.to_string(),
            whatsapp: Some("+8801700000000".to_string()),
            gender: None,
            dob: None,
            profession: Some("  ".to_string()),
            password: "secret123".to_string(),
        }
    }

    #[test]
    fn test_hash_password() {
        let hash = hash_password("test_password_123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("test_password_123", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  ".to_string())), None);
        assert_eq!(non_blank(Some(" x ".to_string())), Some("x".to_string()));
    }

    #[tokio::test]
    async fn test_signup_rejects_invalid_email() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = AccountService::new(UserRepository::new(db));

        let result = service.signup(signup_input("not-an-email")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_signup_duplicate_email_conflicts() {
        let existing = create_test_user("secret123");
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .into_connection(),
        );
        let service = AccountService::new(UserRepository::new(db));

        let result = service.signup(signup_input("JANE@example.com")).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_signin_wrong_password() {
        let existing = create_test_user("secret123");
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .into_connection(),
        );
        let service = AccountService::new(UserRepository::new(db));

        let result = service.signin("jane@example.com", "nope").await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_signin_unknown_email() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );
        let service = AccountService::new(UserRepository::new(db));

        let result = service.signin("ghost@example.com", "secret123").await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }
}

//! User service.

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use once_cell::sync::Lazy;
use pantry_common::{
    decode_image_payload, generate_storage_key, AppError, AppResult, IdGenerator, StorageBackend,
};
use pantry_db::{
    entities::user,
    repositories::{SubscriptionRepository, UserRepository},
};
use regex::Regex;
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use crate::views::UserView;

/// Characters allowed in a username: word characters plus `.`, `@`, `+`, `-`.
static USERNAME_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^[\w.@+-]+$").unwrap()
});

/// Reserved username that collides with the current-user route.
const RESERVED_USERNAME: &str = "me";

/// User service for registration, authentication and profile management.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    subscription_repo: SubscriptionRepository,
    storage: Arc<dyn StorageBackend>,
    id_gen: IdGenerator,
}

/// Input for registering a new user.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserInput {
    #[validate(email, length(max = 254))]
    pub email: String,

    #[validate(length(min = 1, max = 150))]
    pub username: String,

    #[validate(length(min = 1, max = 150))]
    pub first_name: String,

    #[validate(length(min = 1, max = 150))]
    pub last_name: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// Input for changing the current password.
#[derive(Debug, Deserialize, Validate)]
pub struct SetPasswordInput {
    pub current_password: String,

    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub fn new(
        user_repo: UserRepository,
        subscription_repo: SubscriptionRepository,
        storage: Arc<dyn StorageBackend>,
    ) -> Self {
        Self {
            user_repo,
            subscription_repo,
            storage,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new user.
    pub async fn register(&self, input: CreateUserInput) -> AppResult<user::Model> {
        input.validate()?;

        if !USERNAME_RE.is_match(&input.username) {
            return Err(AppError::Validation(
                "Username may only contain letters, digits and .@+- characters".to_string(),
            ));
        }

        if input.username.eq_ignore_ascii_case(RESERVED_USERNAME) {
            return Err(AppError::Validation(
                "This username is reserved".to_string(),
            ));
        }

        if self.user_repo.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::BadRequest("Email already registered".to_string()));
        }

        if self
            .user_repo
            .find_by_username(&input.username)
            .await?
            .is_some()
        {
            return Err(AppError::BadRequest("Username already taken".to_string()));
        }

        let password_hash = hash_password(&input.password)?;

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            email: Set(input.email),
            username: Set(input.username.clone()),
            username_lower: Set(input.username.to_lowercase()),
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            avatar_url: Set(None),
            password_hash: Set(password_hash),
            token: Set(None),
            created_at: Set(chrono::Utc::now().into()),
            updated_at: Set(None),
        };

        self.user_repo.create(model).await
    }

    /// Get a user by ID.
    pub async fn get(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// List users ordered by email, with the total count.
    pub async fn list(&self, limit: u64, offset: u64) -> AppResult<(Vec<user::Model>, u64)> {
        let users = self.user_repo.list(limit, offset).await?;
        let total = self.user_repo.count().await?;
        Ok((users, total))
    }

    /// Exchange email and password for an API token. A fresh token replaces
    /// any previous one, so a new login invalidates old sessions.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<String> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or_else(invalid_credentials)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(invalid_credentials());
        }

        let token = self.id_gen.generate_token();
        let model = user::ActiveModel {
            id: Set(user.id),
            token: Set(Some(token.clone())),
            updated_at: Set(Some(chrono::Utc::now().into())),
            ..Default::default()
        };
        self.user_repo.update(model).await?;

        Ok(token)
    }

    /// Invalidate the user's current token.
    pub async fn logout(&self, user_id: &str) -> AppResult<()> {
        let model = user::ActiveModel {
            id: Set(user_id.to_string()),
            token: Set(None),
            updated_at: Set(Some(chrono::Utc::now().into())),
            ..Default::default()
        };
        self.user_repo.update(model).await?;
        Ok(())
    }

    /// Resolve an API token to its user.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Change the current password, verifying the old one first.
    pub async fn set_password(&self, user_id: &str, input: SetPasswordInput) -> AppResult<()> {
        input.validate()?;

        let user = self.user_repo.get_by_id(user_id).await?;

        if !verify_password(&input.current_password, &user.password_hash)? {
            return Err(AppError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }

        if input.new_password == input.current_password {
            return Err(AppError::Validation(
                "New password must differ from the current one".to_string(),
            ));
        }

        let model = user::ActiveModel {
            id: Set(user.id),
            password_hash: Set(hash_password(&input.new_password)?),
            updated_at: Set(Some(chrono::Utc::now().into())),
            ..Default::default()
        };
        self.user_repo.update(model).await?;

        Ok(())
    }

    /// Decode a base64 avatar payload, store it, and record its URL.
    /// Returns the public URL of the stored avatar.
    pub async fn set_avatar(&self, user_id: &str, data_url: &str) -> AppResult<String> {
        let user = self.user_repo.get_by_id(user_id).await?;

        let payload = decode_image_payload(data_url).map_err(|e| {
            tracing::warn!(error = %e, user_id = %user.id, "Rejected avatar payload");
            AppError::Internal("Failed to update avatar".to_string())
        })?;
        let key = generate_storage_key("avatars", &payload.extension);
        let stored = self
            .storage
            .store(&key, &payload.data, &payload.content_type)
            .await?;
        let url = self.storage.public_url(&stored.key);

        let model = user::ActiveModel {
            id: Set(user.id),
            avatar_url: Set(Some(url.clone())),
            updated_at: Set(Some(chrono::Utc::now().into())),
            ..Default::default()
        };
        self.user_repo.update(model).await?;

        Ok(url)
    }

    /// Remove the user's avatar. Having no avatar set is an error.
    pub async fn delete_avatar(&self, user_id: &str) -> AppResult<()> {
        let user = self.user_repo.get_by_id(user_id).await?;

        let Some(ref url) = user.avatar_url else {
            return Err(AppError::Validation("No avatar is set".to_string()));
        };

        if let Some(key) = self.storage.key_from_url(url) {
            self.storage.delete(&key).await?;
        }

        let model = user::ActiveModel {
            id: Set(user.id),
            avatar_url: Set(None),
            updated_at: Set(Some(chrono::Utc::now().into())),
            ..Default::default()
        };
        self.user_repo.update(model).await?;

        Ok(())
    }

    /// Project a user for a viewer, resolving the subscription flag.
    pub async fn view(&self, model: &user::Model, viewer_id: Option<&str>) -> AppResult<UserView> {
        let is_subscribed = match viewer_id {
            Some(viewer) if viewer != model.id => {
                self.subscription_repo.exists(viewer, &model.id).await?
            }
            _ => false,
        };

        Ok(UserView::from_model(model, is_subscribed))
    }

    /// Batch variant of [`Self::view`] that resolves subscription flags with
    /// one query.
    pub async fn views(
        &self,
        models: &[user::Model],
        viewer_id: Option<&str>,
    ) -> AppResult<Vec<UserView>> {
        let followed = match viewer_id {
            Some(viewer) => {
                let ids = models.iter().map(|m| m.id.clone()).collect::<Vec<_>>();
                self.subscription_repo.followed_ids(viewer, &ids).await?
            }
            None => vec![],
        };

        Ok(models
            .iter()
            .map(|m| UserView::from_model(m, followed.contains(&m.id)))
            .collect())
    }
}

const fn invalid_credentials() -> AppError {
    AppError::Unauthorized
}

/// Hash a password with Argon2.
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against an Argon2 hash.
pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pantry_common::LocalStorage;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn test_storage() -> Arc<dyn StorageBackend> {
        Arc::new(LocalStorage::new(
            std::env::temp_dir().join("pantry-user-tests"),
            "/media".to_string(),
        ))
    }

    fn create_test_user(id: &str, email: &str, username: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            email: email.to_string(),
            username: username.to_string(),
            username_lower: username.to_lowercase(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            avatar_url: None,
            password_hash: hash_password("correct horse").unwrap(),
            token: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn service_with(user_db: MockDatabase, sub_db: MockDatabase) -> UserService {
        let user_repo = UserRepository::new(Arc::new(user_db.into_connection()));
        let sub_repo = SubscriptionRepository::new(Arc::new(sub_db.into_connection()));
        UserService::new(user_repo, sub_repo, test_storage())
    }

    fn valid_input() -> CreateUserInput {
        CreateUserInput {
            email: "cook@example.com".to_string(),
            username: "cook".to_string(),
            first_name: "Test".to_string(),
            last_name: "Cook".to_string(),
            password: "long-enough-password".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_rejects_reserved_username() {
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let mut input = valid_input();
        input.username = "Me".to_string();

        let result = service.register(input).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_register_rejects_bad_username_characters() {
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let mut input = valid_input();
        input.username = "has spaces".to_string();

        let result = service.register(input).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_register_rejects_taken_email() {
        let existing = create_test_user("u1", "cook@example.com", "other");

        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[existing]]),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let result = service.register(valid_input()).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_register_rejects_username_taken_case_insensitively() {
        let existing = create_test_user("u1", "other@example.com", "Cook");

        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .append_query_results([[existing]]),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let result = service.register(valid_input()).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_login_rejects_wrong_password() {
        let user = create_test_user("u1", "cook@example.com", "cook");

        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[user]]),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let result = service.login("cook@example.com", "wrong").await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_view_never_marks_self_as_subscribed() {
        let user = create_test_user("u1", "cook@example.com", "cook");

        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let view = service.view(&user, Some("u1")).await.unwrap();
        assert!(!view.is_subscribed);
    }

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("secret-password").unwrap();
        assert!(verify_password("secret-password", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }
}

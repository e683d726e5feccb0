//! Subscription service.

use pantry_common::{AppError, AppResult, IdGenerator};
use pantry_db::{
    entities::user,
    repositories::{RecipeRepository, SubscriptionRepository, UserRepository},
};

use crate::views::{AuthorView, RecipeSummary, UserView};

/// Subscription service for the user-to-user follow graph.
#[derive(Clone)]
pub struct SubscriptionService {
    subscription_repo: SubscriptionRepository,
    user_repo: UserRepository,
    recipe_repo: RecipeRepository,
    id_gen: IdGenerator,
}

impl SubscriptionService {
    /// Create a new subscription service.
    #[must_use]
    pub const fn new(
        subscription_repo: SubscriptionRepository,
        user_repo: UserRepository,
        recipe_repo: RecipeRepository,
    ) -> Self {
        Self {
            subscription_repo,
            user_repo,
            recipe_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Subscribe to an author. Self-subscription and duplicates are
    /// rejected. Returns the author projection with a recipe preview.
    pub async fn subscribe(
        &self,
        follower_id: &str,
        followee_id: &str,
        recipes_limit: Option<u64>,
    ) -> AppResult<AuthorView> {
        let followee = self.user_repo.get_by_id(followee_id).await?;

        if follower_id == followee_id {
            return Err(AppError::Validation(
                "Cannot subscribe to yourself".to_string(),
            ));
        }

        if self.subscription_repo.exists(follower_id, followee_id).await? {
            return Err(AppError::Validation(
                "Already subscribed to this user".to_string(),
            ));
        }

        self.subscription_repo
            .create(self.id_gen.generate(), follower_id, followee_id)
            .await?;

        self.author_view(&followee, recipes_limit).await
    }

    /// Unsubscribe from an author. Removing an absent subscription is an
    /// error, mirroring the duplicate-subscribe rule.
    pub async fn unsubscribe(&self, follower_id: &str, followee_id: &str) -> AppResult<()> {
        self.user_repo.get_by_id(followee_id).await?;

        let removed = self
            .subscription_repo
            .delete_by_pair(follower_id, followee_id)
            .await?;
        if removed == 0 {
            return Err(AppError::Validation(
                "Not subscribed to this user".to_string(),
            ));
        }

        Ok(())
    }

    /// The authors a user subscribes to, each with a recipe preview, plus
    /// the total count.
    pub async fn subscriptions(
        &self,
        follower_id: &str,
        limit: u64,
        offset: u64,
        recipes_limit: Option<u64>,
    ) -> AppResult<(Vec<AuthorView>, u64)> {
        let authors = self
            .subscription_repo
            .find_followed_users(follower_id, limit, offset)
            .await?;
        let total = self.subscription_repo.count_by_follower(follower_id).await?;

        let mut views = Vec::with_capacity(authors.len());
        for author in &authors {
            views.push(self.author_view(author, recipes_limit).await?);
        }

        Ok((views, total))
    }

    /// Project an author with a truncated recipe preview. Callers only reach
    /// this for authors the viewer subscribes to, so the flag is fixed.
    async fn author_view(
        &self,
        author: &user::Model,
        recipes_limit: Option<u64>,
    ) -> AppResult<AuthorView> {
        let recipes = self
            .recipe_repo
            .find_by_author(&author.id, recipes_limit)
            .await?;
        let recipes_count = self.recipe_repo.count_by_author(&author.id).await?;

        Ok(AuthorView {
            user: UserView::from_model(author, true),
            recipes: recipes.iter().map(RecipeSummary::from_model).collect(),
            recipes_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn create_test_user(id: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            email: format!("{id}@example.com"),
            username: id.to_string(),
            username_lower: id.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            avatar_url: None,
            password_hash: "hash".to_string(),
            token: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn count_row(n: i64) -> BTreeMap<&'static str, sea_orm::Value> {
        let mut row = BTreeMap::new();
        row.insert("num_items", sea_orm::Value::BigInt(Some(n)));
        row
    }

    fn service(
        subscription: MockDatabase,
        user: MockDatabase,
        recipe: MockDatabase,
    ) -> SubscriptionService {
        SubscriptionService::new(
            SubscriptionRepository::new(Arc::new(subscription.into_connection())),
            UserRepository::new(Arc::new(user.into_connection())),
            RecipeRepository::new(Arc::new(recipe.into_connection())),
        )
    }

    #[tokio::test]
    async fn test_subscribe_to_self_is_rejected() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user("u1")]]),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let result = svc.subscribe("u1", "u1", None).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_subscribe_to_missing_user_is_not_found() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()]),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let result = svc.subscribe("u1", "missing", None).await;
        assert!(matches!(result, Err(AppError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_subscribe_duplicate_is_rejected() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[count_row(1)]]),
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user("u2")]]),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let result = svc.subscribe("u1", "u2", None).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_unsubscribe_when_not_subscribed_is_rejected() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([
                sea_orm::MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                },
            ]),
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user("u2")]]),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let result = svc.unsubscribe("u1", "u2").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}

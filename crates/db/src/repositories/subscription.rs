//! Subscription repository.

use std::sync::Arc;

use crate::entities::{subscription, user, Subscription, User};
use pantry_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};

/// Subscription repository for database operations.
#[derive(Clone)]
pub struct SubscriptionRepository {
    db: Arc<DatabaseConnection>,
}

impl SubscriptionRepository {
    /// Create a new subscription repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Check whether a subscription exists.
    pub async fn exists(&self, follower_id: &str, followee_id: &str) -> AppResult<bool> {
        let count = Subscription::find()
            .filter(subscription::Column::FollowerId.eq(follower_id))
            .filter(subscription::Column::FolloweeId.eq(followee_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(count > 0)
    }

    /// Create a subscription.
    pub async fn create(
        &self,
        id: String,
        follower_id: &str,
        followee_id: &str,
    ) -> AppResult<subscription::Model> {
        subscription::ActiveModel {
            id: Set(id),
            follower_id: Set(follower_id.to_string()),
            followee_id: Set(followee_id.to_string()),
            created_at: Set(chrono::Utc::now().into()),
        }
        .insert(self.db.as_ref())
        .await
        .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a subscription by its pair, returning the number of rows
    /// removed.
    pub async fn delete_by_pair(&self, follower_id: &str, followee_id: &str) -> AppResult<u64> {
        let result = Subscription::delete_many()
            .filter(subscription::Column::FollowerId.eq(follower_id))
            .filter(subscription::Column::FolloweeId.eq(followee_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// The users a follower subscribes to, ordered by email (paginated).
    pub async fn find_followed_users(
        &self,
        follower_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<user::Model>> {
        User::find()
            .join_rev(JoinType::InnerJoin, subscription::Relation::Followee.def())
            .filter(subscription::Column::FollowerId.eq(follower_id))
            .order_by_asc(user::Column::Email)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count the users a follower subscribes to.
    pub async fn count_by_follower(&self, follower_id: &str) -> AppResult<u64> {
        Subscription::find()
            .filter(subscription::Column::FollowerId.eq(follower_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// The followee IDs a follower subscribes to, out of a candidate set.
    pub async fn followed_ids(
        &self,
        follower_id: &str,
        followee_ids: &[String],
    ) -> AppResult<Vec<String>> {
        if followee_ids.is_empty() {
            return Ok(vec![]);
        }

        let rows = Subscription::find()
            .filter(subscription::Column::FollowerId.eq(follower_id))
            .filter(subscription::Column::FolloweeId.is_in(followee_ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(|m| m.followee_id).collect())
    }
}

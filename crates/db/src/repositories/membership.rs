//! Membership repository.
//!
//! Favorites and shopping carts are the same shape of relation (a user marks
//! a recipe) stored in two physical tables. One repository serves both,
//! dispatching on [`RelationKind`].

use std::sync::Arc;

use crate::entities::{favorite, ingredient, recipe, recipe_ingredient, shopping_cart};
use crate::entities::{Favorite, ShoppingCart};
use pantry_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};

/// Which membership relation an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// Recipes the user has favorited.
    Favorite,
    /// Recipes queued for the user's shopping list.
    ShoppingCart,
}

impl RelationKind {
    /// Human-readable relation name used in error messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Favorite => "favorites",
            Self::ShoppingCart => "shopping cart",
        }
    }
}

/// One shopping cart ingredient occurrence, before aggregation.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct CartIngredientRow {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// Membership repository for favorite and shopping cart rows.
#[derive(Clone)]
pub struct MembershipRepository {
    db: Arc<DatabaseConnection>,
}

impl MembershipRepository {
    /// Create a new membership repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Check whether a membership row exists.
    pub async fn exists(
        &self,
        kind: RelationKind,
        user_id: &str,
        recipe_id: &str,
    ) -> AppResult<bool> {
        let count = match kind {
            RelationKind::Favorite => Favorite::find()
                .filter(favorite::Column::UserId.eq(user_id))
                .filter(favorite::Column::RecipeId.eq(recipe_id))
                .count(self.db.as_ref())
                .await,
            RelationKind::ShoppingCart => ShoppingCart::find()
                .filter(shopping_cart::Column::UserId.eq(user_id))
                .filter(shopping_cart::Column::RecipeId.eq(recipe_id))
                .count(self.db.as_ref())
                .await,
        }
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(count > 0)
    }

    /// Insert a membership row.
    pub async fn insert(
        &self,
        kind: RelationKind,
        id: String,
        user_id: &str,
        recipe_id: &str,
    ) -> AppResult<()> {
        let now = chrono::Utc::now().into();
        match kind {
            RelationKind::Favorite => {
                favorite::ActiveModel {
                    id: Set(id),
                    user_id: Set(user_id.to_string()),
                    recipe_id: Set(recipe_id.to_string()),
                    created_at: Set(now),
                }
                .insert(self.db.as_ref())
                .await
                .map(|_| ())
            }
            RelationKind::ShoppingCart => {
                shopping_cart::ActiveModel {
                    id: Set(id),
                    user_id: Set(user_id.to_string()),
                    recipe_id: Set(recipe_id.to_string()),
                    created_at: Set(now),
                }
                .insert(self.db.as_ref())
                .await
                .map(|_| ())
            }
        }
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    /// Delete a membership row, returning the number of rows removed.
    pub async fn delete(
        &self,
        kind: RelationKind,
        user_id: &str,
        recipe_id: &str,
    ) -> AppResult<u64> {
        let result = match kind {
            RelationKind::Favorite => {
                Favorite::delete_many()
                    .filter(favorite::Column::UserId.eq(user_id))
                    .filter(favorite::Column::RecipeId.eq(recipe_id))
                    .exec(self.db.as_ref())
                    .await
            }
            RelationKind::ShoppingCart => {
                ShoppingCart::delete_many()
                    .filter(shopping_cart::Column::UserId.eq(user_id))
                    .filter(shopping_cart::Column::RecipeId.eq(recipe_id))
                    .exec(self.db.as_ref())
                    .await
            }
        }
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// The recipe IDs a user holds in a relation, out of a candidate set.
    /// Used to stamp membership flags onto recipe listings.
    pub async fn member_recipe_ids(
        &self,
        kind: RelationKind,
        user_id: &str,
        recipe_ids: &[String],
    ) -> AppResult<Vec<String>> {
        if recipe_ids.is_empty() {
            return Ok(vec![]);
        }

        let rows = match kind {
            RelationKind::Favorite => {
                Favorite::find()
                    .filter(favorite::Column::UserId.eq(user_id))
                    .filter(favorite::Column::RecipeId.is_in(recipe_ids.to_vec()))
                    .all(self.db.as_ref())
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?
                    .into_iter()
                    .map(|m| m.recipe_id)
                    .collect()
            }
            RelationKind::ShoppingCart => {
                ShoppingCart::find()
                    .filter(shopping_cart::Column::UserId.eq(user_id))
                    .filter(shopping_cart::Column::RecipeId.is_in(recipe_ids.to_vec()))
                    .all(self.db.as_ref())
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?
                    .into_iter()
                    .map(|m| m.recipe_id)
                    .collect()
            }
        };

        Ok(rows)
    }

    /// Check whether a user's shopping cart holds any recipes.
    pub async fn cart_is_empty(&self, user_id: &str) -> AppResult<bool> {
        let count = ShoppingCart::find()
            .filter(shopping_cart::Column::UserId.eq(user_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(count == 0)
    }

    /// Every ingredient occurrence across the recipes in a user's cart,
    /// joined with the catalog. Repeated ingredients come back as separate
    /// rows; summing is left to the caller.
    pub async fn cart_ingredients(&self, user_id: &str) -> AppResult<Vec<CartIngredientRow>> {
        ShoppingCart::find()
            .select_only()
            .column_as(ingredient::Column::Name, "name")
            .column_as(ingredient::Column::MeasurementUnit, "measurement_unit")
            .column_as(recipe_ingredient::Column::Amount, "amount")
            .filter(shopping_cart::Column::UserId.eq(user_id))
            .join(JoinType::InnerJoin, shopping_cart::Relation::Recipe.def())
            .join(
                JoinType::InnerJoin,
                recipe::Relation::RecipeIngredients.def(),
            )
            .join(
                JoinType::InnerJoin,
                recipe_ingredient::Relation::Ingredient.def(),
            )
            .order_by_asc(ingredient::Column::Name)
            .into_model::<CartIngredientRow>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn test_exists_true_when_row_present() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit_count(1)]])
                .into_connection(),
        );

        let repo = MembershipRepository::new(db);
        let exists = repo
            .exists(RelationKind::Favorite, "u1", "r1")
            .await
            .unwrap();

        assert!(exists);
    }

    #[tokio::test]
    async fn test_delete_reports_rows_affected() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = MembershipRepository::new(db);
        let removed = repo
            .delete(RelationKind::ShoppingCart, "u1", "r1")
            .await
            .unwrap();

        assert_eq!(removed, 0);
    }

    #[tokio::test]
    async fn test_cart_ingredients_returns_joined_rows() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![
                    cart_row("flour", "g", 200),
                    cart_row("flour", "g", 100),
                ]])
                .into_connection(),
        );

        let repo = MembershipRepository::new(db);
        let result = repo.cart_ingredients("u1").await.unwrap();

        assert_eq!(
            result,
            vec![
                CartIngredientRow {
                    name: "flour".to_string(),
                    measurement_unit: "g".to_string(),
                    amount: 200,
                },
                CartIngredientRow {
                    name: "flour".to_string(),
                    measurement_unit: "g".to_string(),
                    amount: 100,
                },
            ]
        );
    }

    fn cart_row(
        name: &str,
        unit: &str,
        amount: i32,
    ) -> std::collections::BTreeMap<&'static str, sea_orm::Value> {
        let mut row = std::collections::BTreeMap::new();
        row.insert("name", sea_orm::Value::from(name));
        row.insert("measurement_unit", sea_orm::Value::from(unit));
        row.insert("amount", sea_orm::Value::Int(Some(amount)));
        row
    }

    fn maplit_count(n: i64) -> std::collections::BTreeMap<&'static str, sea_orm::Value> {
        let mut row = std::collections::BTreeMap::new();
        row.insert("num_items", sea_orm::Value::BigInt(Some(n)));
        row
    }
}

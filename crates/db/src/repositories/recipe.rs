//! Recipe repository.
//!
//! Recipe writes that touch the ingredient set run inside a single
//! transaction: either the recipe row and every association row commit, or
//! nothing does.

use std::sync::Arc;

use crate::entities::{ingredient, recipe, recipe_ingredient, Recipe, RecipeIngredient};
use pantry_common::{AppError, AppResult};
use sea_orm::{
    sea_query::Query, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    FromQueryResult, JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, TransactionTrait,
};

/// Membership filter for recipe listings: restrict to recipes a given user
/// has (or has not) placed in one of the membership relations.
#[derive(Debug, Clone)]
pub struct MembershipFilter {
    /// The user whose membership rows are consulted.
    pub user_id: String,
    /// `true` keeps members, `false` excludes them.
    pub members: bool,
}

/// Recipe listing filter.
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    /// Restrict to a single author.
    pub author_id: Option<String>,
    /// Filter by favorite membership.
    pub favorited: Option<MembershipFilter>,
    /// Filter by shopping cart membership.
    pub in_cart: Option<MembershipFilter>,
}

/// One row of a recipe's ingredient list, joined with the catalog.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct RecipeIngredientDetail {
    pub recipe_id: String,
    pub ingredient_id: String,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// Recipe repository for database operations.
#[derive(Clone)]
pub struct RecipeRepository {
    db: Arc<DatabaseConnection>,
}

impl RecipeRepository {
    /// Create a new recipe repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a recipe by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<recipe::Model>> {
        Recipe::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a recipe by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<recipe::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::RecipeNotFound(id.to_string()))
    }

    /// Insert a recipe together with its ingredient associations in one
    /// transaction.
    pub async fn create_with_ingredients(
        &self,
        model: recipe::ActiveModel,
        items: Vec<recipe_ingredient::ActiveModel>,
    ) -> AppResult<recipe::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let recipe = model
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if !items.is_empty() {
            RecipeIngredient::insert_many(items)
                .exec_without_returning(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(recipe)
    }

    /// Update a recipe's scalar fields and, when a replacement set is
    /// supplied, swap out every ingredient association, all in one
    /// transaction.
    pub async fn update_with_ingredients(
        &self,
        recipe_id: &str,
        model: recipe::ActiveModel,
        replacement: Option<Vec<recipe_ingredient::ActiveModel>>,
    ) -> AppResult<recipe::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let recipe = model
            .update(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if let Some(items) = replacement {
            RecipeIngredient::delete_many()
                .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
                .exec(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

            if !items.is_empty() {
                RecipeIngredient::insert_many(items)
                    .exec_without_returning(&txn)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
            }
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(recipe)
    }

    /// Delete a recipe by ID. Association and membership rows cascade.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Recipe::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    fn apply_filter(query: sea_orm::Select<Recipe>, filter: &RecipeFilter) -> sea_orm::Select<Recipe> {
        use crate::entities::{favorite, shopping_cart, Favorite, ShoppingCart};

        let mut query = query;

        if let Some(ref author_id) = filter.author_id {
            query = query.filter(recipe::Column::AuthorId.eq(author_id.clone()));
        }

        if let Some(ref fav) = filter.favorited {
            let subquery = Query::select()
                .column(favorite::Column::RecipeId)
                .from(Favorite)
                .and_where(favorite::Column::UserId.eq(fav.user_id.clone()))
                .to_owned();
            let membership = recipe::Column::Id.in_subquery(subquery);
            query = if fav.members {
                query.filter(membership)
            } else {
                query.filter(Condition::all().add(membership.not()))
            };
        }

        if let Some(ref cart) = filter.in_cart {
            let subquery = Query::select()
                .column(shopping_cart::Column::RecipeId)
                .from(ShoppingCart)
                .and_where(shopping_cart::Column::UserId.eq(cart.user_id.clone()))
                .to_owned();
            let membership = recipe::Column::Id.in_subquery(subquery);
            query = if cart.members {
                query.filter(membership)
            } else {
                query.filter(Condition::all().add(membership.not()))
            };
        }

        query
    }

    /// List recipes, newest first (paginated).
    pub async fn list(
        &self,
        filter: &RecipeFilter,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<recipe::Model>> {
        Self::apply_filter(Recipe::find(), filter)
            .order_by_desc(recipe::Column::CreatedAt)
            .order_by_desc(recipe::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count recipes matching a filter.
    pub async fn count(&self, filter: &RecipeFilter) -> AppResult<u64> {
        Self::apply_filter(Recipe::find(), filter)
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get an author's recipes, newest first, optionally truncated.
    pub async fn find_by_author(
        &self,
        author_id: &str,
        limit: Option<u64>,
    ) -> AppResult<Vec<recipe::Model>> {
        let mut query = Recipe::find()
            .filter(recipe::Column::AuthorId.eq(author_id))
            .order_by_desc(recipe::Column::CreatedAt)
            .order_by_desc(recipe::Column::Id);

        if let Some(limit) = limit {
            query = query.limit(limit);
        }

        query
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count an author's recipes.
    pub async fn count_by_author(&self, author_id: &str) -> AppResult<u64> {
        Recipe::find()
            .filter(recipe::Column::AuthorId.eq(author_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Ingredient rows for a batch of recipes joined with catalog detail,
    /// in stable (recipe, ingredient) order.
    pub async fn find_ingredient_details_for(
        &self,
        recipe_ids: &[String],
    ) -> AppResult<Vec<RecipeIngredientDetail>> {
        if recipe_ids.is_empty() {
            return Ok(vec![]);
        }

        self.ingredient_details_query()
            .filter(recipe_ingredient::Column::RecipeId.is_in(recipe_ids.to_vec()))
            .into_model::<RecipeIngredientDetail>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    fn ingredient_details_query(&self) -> sea_orm::Select<RecipeIngredient> {
        RecipeIngredient::find()
            .select_only()
            .column_as(recipe_ingredient::Column::RecipeId, "recipe_id")
            .column_as(recipe_ingredient::Column::IngredientId, "ingredient_id")
            .column_as(ingredient::Column::Name, "name")
            .column_as(ingredient::Column::MeasurementUnit, "measurement_unit")
            .column_as(recipe_ingredient::Column::Amount, "amount")
            .join(
                JoinType::InnerJoin,
                recipe_ingredient::Relation::Ingredient.def(),
            )
            .order_by_asc(recipe_ingredient::Column::RecipeId)
            .order_by_asc(recipe_ingredient::Column::IngredientId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_recipe(id: &str, author_id: &str, name: &str) -> recipe::Model {
        recipe::Model {
            id: id.to_string(),
            author_id: author_id.to_string(),
            name: name.to_string(),
            image_url: "/media/recipes/test.png".to_string(),
            text: "Mix and bake.".to_string(),
            cooking_time: 30,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<recipe::Model>::new()])
                .into_connection(),
        );

        let repo = RecipeRepository::new(db);
        let result = repo.get_by_id("missing").await;

        assert!(matches!(result, Err(AppError::RecipeNotFound(_))));
    }

    #[tokio::test]
    async fn test_create_with_ingredients_commits() {
        let recipe = create_test_recipe("r1", "u1", "Bread");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[recipe.clone()]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 2,
                }])
                .into_connection(),
        );

        let repo = RecipeRepository::new(db);
        let model = recipe::ActiveModel::from(recipe);
        let items = vec![
            recipe_ingredient::ActiveModel {
                id: sea_orm::Set("ri1".to_string()),
                recipe_id: sea_orm::Set("r1".to_string()),
                ingredient_id: sea_orm::Set("i1".to_string()),
                amount: sea_orm::Set(200),
            },
            recipe_ingredient::ActiveModel {
                id: sea_orm::Set("ri2".to_string()),
                recipe_id: sea_orm::Set("r1".to_string()),
                ingredient_id: sea_orm::Set("i2".to_string()),
                amount: sea_orm::Set(5),
            },
        ];

        let created = repo.create_with_ingredients(model, items).await.unwrap();
        assert_eq!(created.id, "r1");
    }

    #[tokio::test]
    async fn test_find_by_author_respects_limit() {
        let r1 = create_test_recipe("r1", "u1", "Bread");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[r1]])
                .into_connection(),
        );

        let repo = RecipeRepository::new(db);
        let result = repo.find_by_author("u1", Some(1)).await.unwrap();

        assert_eq!(result.len(), 1);
    }
}

//! Recipe service.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use pantry_common::{
    decode_image_payload, generate_storage_key, AppError, AppResult, Config, IdGenerator,
    StorageBackend,
};
use pantry_db::{
    entities::{recipe, recipe_ingredient},
    repositories::{
        IngredientRepository, MembershipFilter, MembershipRepository, RecipeFilter,
        RecipeRepository, RelationKind, SubscriptionRepository, UserRepository,
    },
};
use rand::{distributions::Alphanumeric, Rng};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use crate::views::{RecipeIngredientView, RecipeView, UserView};

/// Length of the code embedded in generated short links.
const SHORT_LINK_CODE_LEN: usize = 6;

/// One ingredient reference inside a recipe write payload.
#[derive(Debug, Clone, Deserialize)]
pub struct IngredientAmount {
    /// Catalog ingredient ID.
    pub id: String,
    pub amount: i32,
}

/// Input for creating a recipe.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRecipeInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,

    #[validate(length(min = 1))]
    pub text: String,

    #[validate(range(min = 1))]
    pub cooking_time: i32,

    /// Base64 data URL.
    pub image: String,

    pub ingredients: Vec<IngredientAmount>,
}

/// Input for updating a recipe. Absent fields keep their current value;
/// an absent ingredient list keeps the current associations.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRecipeInput {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,

    #[validate(length(min = 1))]
    pub text: Option<String>,

    #[validate(range(min = 1))]
    pub cooking_time: Option<i32>,

    /// Base64 data URL.
    pub image: Option<String>,

    pub ingredients: Option<Vec<IngredientAmount>>,
}

/// Listing parameters resolved by the API layer.
#[derive(Debug, Clone, Default)]
pub struct RecipeListParams {
    /// Restrict to one author.
    pub author_id: Option<String>,
    /// Filter by the viewer's favorites. Ignored for anonymous viewers.
    pub favorited: Option<bool>,
    /// Filter by the viewer's shopping cart. Ignored for anonymous viewers.
    pub in_cart: Option<bool>,
    pub limit: u64,
    pub offset: u64,
}

/// Recipe service for the write path and read projection.
#[derive(Clone)]
pub struct RecipeService {
    recipe_repo: RecipeRepository,
    ingredient_repo: IngredientRepository,
    user_repo: UserRepository,
    membership_repo: MembershipRepository,
    subscription_repo: SubscriptionRepository,
    storage: Arc<dyn StorageBackend>,
    id_gen: IdGenerator,
    server_url: String,
}

impl RecipeService {
    /// Create a new recipe service.
    #[must_use]
    pub fn new(
        recipe_repo: RecipeRepository,
        ingredient_repo: IngredientRepository,
        user_repo: UserRepository,
        membership_repo: MembershipRepository,
        subscription_repo: SubscriptionRepository,
        storage: Arc<dyn StorageBackend>,
        config: &Config,
    ) -> Self {
        Self {
            recipe_repo,
            ingredient_repo,
            user_repo,
            membership_repo,
            subscription_repo,
            storage,
            id_gen: IdGenerator::new(),
            server_url: config.server.url.clone(),
        }
    }

    /// Create a recipe with its ingredient associations.
    pub async fn create(&self, author_id: &str, input: CreateRecipeInput) -> AppResult<RecipeView> {
        input.validate()?;
        self.validate_ingredient_set(&input.ingredients).await?;

        let image_url = self.store_image(&input.image).await?;

        let recipe_id = self.id_gen.generate();
        let model = recipe::ActiveModel {
            id: Set(recipe_id.clone()),
            author_id: Set(author_id.to_string()),
            name: Set(input.name),
            image_url: Set(image_url),
            text: Set(input.text),
            cooking_time: Set(input.cooking_time),
            created_at: Set(chrono::Utc::now().into()),
        };
        let items = self.association_models(&recipe_id, &input.ingredients);

        let recipe = self.recipe_repo.create_with_ingredients(model, items).await?;
        self.view_one(recipe, Some(author_id)).await
    }

    /// Update a recipe. Only the author may edit; supplying an ingredient
    /// list atomically replaces every association.
    pub async fn update(
        &self,
        actor_id: &str,
        recipe_id: &str,
        input: UpdateRecipeInput,
    ) -> AppResult<RecipeView> {
        input.validate()?;

        let recipe = self.recipe_repo.get_by_id(recipe_id).await?;
        if recipe.author_id != actor_id {
            return Err(AppError::Forbidden(
                "Only the author can edit this recipe".to_string(),
            ));
        }

        let replacement = match &input.ingredients {
            None => None,
            Some(items) => {
                self.validate_ingredient_set(items).await?;
                Some(self.association_models(recipe_id, items))
            }
        };

        let mut model = recipe::ActiveModel {
            id: Set(recipe.id.clone()),
            ..Default::default()
        };
        if let Some(name) = input.name {
            model.name = Set(name);
        }
        if let Some(text) = input.text {
            model.text = Set(text);
        }
        if let Some(cooking_time) = input.cooking_time {
            model.cooking_time = Set(cooking_time);
        }
        if let Some(ref image) = input.image {
            model.image_url = Set(self.store_image(image).await?);
        }

        let updated = self
            .recipe_repo
            .update_with_ingredients(recipe_id, model, replacement)
            .await?;
        self.view_one(updated, Some(actor_id)).await
    }

    /// Delete a recipe. Only the author may delete.
    pub async fn delete(&self, actor_id: &str, recipe_id: &str) -> AppResult<()> {
        let recipe = self.recipe_repo.get_by_id(recipe_id).await?;
        if recipe.author_id != actor_id {
            return Err(AppError::Forbidden(
                "Only the author can delete this recipe".to_string(),
            ));
        }

        self.recipe_repo.delete(recipe_id).await
    }

    /// Get a recipe projection.
    pub async fn get(&self, recipe_id: &str, viewer_id: Option<&str>) -> AppResult<RecipeView> {
        let recipe = self.recipe_repo.get_by_id(recipe_id).await?;
        self.view_one(recipe, viewer_id).await
    }

    /// List recipes, newest first, with the total count.
    pub async fn list(
        &self,
        params: &RecipeListParams,
        viewer_id: Option<&str>,
    ) -> AppResult<(Vec<RecipeView>, u64)> {
        let filter = RecipeFilter {
            author_id: params.author_id.clone(),
            favorited: membership_filter(params.favorited, viewer_id),
            in_cart: membership_filter(params.in_cart, viewer_id),
        };

        let recipes = self
            .recipe_repo
            .list(&filter, params.limit, params.offset)
            .await?;
        let total = self.recipe_repo.count(&filter).await?;
        let views = self.views(recipes, viewer_id).await?;

        Ok((views, total))
    }

    /// Generate a share link for an existing recipe. Links are cosmetic and
    /// not resolved by the server.
    pub async fn short_link(&self, recipe_id: &str) -> AppResult<String> {
        self.recipe_repo.get_by_id(recipe_id).await?;

        let code: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(SHORT_LINK_CODE_LEN)
            .map(char::from)
            .collect();

        Ok(format!(
            "{}/short/{code}",
            self.server_url.trim_end_matches('/')
        ))
    }

    async fn view_one(&self, recipe: recipe::Model, viewer_id: Option<&str>) -> AppResult<RecipeView> {
        self.views(vec![recipe], viewer_id)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Internal("Recipe projection came back empty".to_string()))
    }

    /// Assemble full projections for a page of recipes with batched lookups.
    async fn views(
        &self,
        recipes: Vec<recipe::Model>,
        viewer_id: Option<&str>,
    ) -> AppResult<Vec<RecipeView>> {
        if recipes.is_empty() {
            return Ok(vec![]);
        }

        let recipe_ids: Vec<String> = recipes.iter().map(|r| r.id.clone()).collect();
        let mut author_ids: Vec<String> = recipes.iter().map(|r| r.author_id.clone()).collect();
        author_ids.sort();
        author_ids.dedup();

        let authors: HashMap<String, _> = self
            .user_repo
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        let mut ingredients: HashMap<String, Vec<RecipeIngredientView>> = HashMap::new();
        for detail in self.recipe_repo.find_ingredient_details_for(&recipe_ids).await? {
            ingredients
                .entry(detail.recipe_id)
                .or_default()
                .push(RecipeIngredientView {
                    id: detail.ingredient_id,
                    name: detail.name,
                    measurement_unit: detail.measurement_unit,
                    amount: detail.amount,
                });
        }

        let (favorited, in_cart, subscribed) = match viewer_id {
            Some(viewer) => (
                self.membership_repo
                    .member_recipe_ids(RelationKind::Favorite, viewer, &recipe_ids)
                    .await?
                    .into_iter()
                    .collect::<HashSet<_>>(),
                self.membership_repo
                    .member_recipe_ids(RelationKind::ShoppingCart, viewer, &recipe_ids)
                    .await?
                    .into_iter()
                    .collect::<HashSet<_>>(),
                self.subscription_repo
                    .followed_ids(viewer, &author_ids)
                    .await?
                    .into_iter()
                    .collect::<HashSet<_>>(),
            ),
            None => (HashSet::new(), HashSet::new(), HashSet::new()),
        };

        recipes
            .into_iter()
            .map(|r| {
                let author = authors.get(&r.author_id).ok_or_else(|| {
                    AppError::Internal(format!("Author {} missing for recipe {}", r.author_id, r.id))
                })?;

                Ok(RecipeView {
                    is_favorited: favorited.contains(&r.id),
                    is_in_shopping_cart: in_cart.contains(&r.id),
                    author: UserView::from_model(author, subscribed.contains(&r.author_id)),
                    ingredients: ingredients.remove(&r.id).unwrap_or_default(),
                    created_at: r.created_at.to_rfc3339(),
                    id: r.id,
                    name: r.name,
                    image: r.image_url,
                    text: r.text,
                    cooking_time: r.cooking_time,
                })
            })
            .collect()
    }

    /// Validate an ingredient reference set: non-empty, positive amounts, no
    /// duplicates, every ID known to the catalog.
    async fn validate_ingredient_set(&self, items: &[IngredientAmount]) -> AppResult<()> {
        if items.is_empty() {
            return Err(AppError::Validation(
                "Recipe must include at least one ingredient".to_string(),
            ));
        }

        if let Some(bad) = items.iter().find(|i| i.amount < 1) {
            return Err(AppError::Validation(format!(
                "Ingredient {} amount must be at least 1",
                bad.id
            )));
        }

        let ids: Vec<String> = items.iter().map(|i| i.id.clone()).collect();
        let mut seen: HashSet<&String> = HashSet::new();
        if let Some(dup) = ids.iter().find(|id| !seen.insert(*id)) {
            return Err(AppError::Validation(format!(
                "Ingredient {dup} is listed more than once"
            )));
        }

        let found: HashSet<String> = self
            .ingredient_repo
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|i| i.id)
            .collect();
        if let Some(missing) = ids.iter().find(|id| !found.contains(*id)) {
            return Err(AppError::Validation(format!(
                "Unknown ingredient: {missing}"
            )));
        }

        Ok(())
    }

    fn association_models(
        &self,
        recipe_id: &str,
        items: &[IngredientAmount],
    ) -> Vec<recipe_ingredient::ActiveModel> {
        items
            .iter()
            .map(|item| recipe_ingredient::ActiveModel {
                id: Set(self.id_gen.generate()),
                recipe_id: Set(recipe_id.to_string()),
                ingredient_id: Set(item.id.clone()),
                amount: Set(item.amount),
            })
            .collect()
    }

    async fn store_image(&self, data_url: &str) -> AppResult<String> {
        let payload = decode_image_payload(data_url)?;
        let key = generate_storage_key("recipes", &payload.extension);
        let stored = self
            .storage
            .store(&key, &payload.data, &payload.content_type)
            .await?;
        Ok(self.storage.public_url(&stored.key))
    }
}

fn membership_filter(flag: Option<bool>, viewer_id: Option<&str>) -> Option<MembershipFilter> {
    match (flag, viewer_id) {
        (Some(members), Some(viewer)) => Some(MembershipFilter {
            user_id: viewer.to_string(),
            members,
        }),
        _ => None,
    }
}

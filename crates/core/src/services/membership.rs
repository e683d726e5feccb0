//! Membership service: favorites and shopping cart.
//!
//! Both relations behave identically, so one service handles either side of
//! the toggle, keyed by [`RelationKind`].

use pantry_common::{AppError, AppResult, IdGenerator};
use pantry_db::repositories::{MembershipRepository, RecipeRepository, RelationKind};

use crate::views::RecipeSummary;

/// Membership service for adding and removing recipes from a user's
/// favorites or shopping cart.
#[derive(Clone)]
pub struct MembershipService {
    membership_repo: MembershipRepository,
    recipe_repo: RecipeRepository,
    id_gen: IdGenerator,
}

impl MembershipService {
    /// Create a new membership service.
    #[must_use]
    pub const fn new(membership_repo: MembershipRepository, recipe_repo: RecipeRepository) -> Self {
        Self {
            membership_repo,
            recipe_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Add a recipe to the relation. Duplicate additions are rejected.
    /// Returns the compact recipe projection for the response body.
    pub async fn add(
        &self,
        kind: RelationKind,
        user_id: &str,
        recipe_id: &str,
    ) -> AppResult<RecipeSummary> {
        let recipe = self.recipe_repo.get_by_id(recipe_id).await?;

        if self.membership_repo.exists(kind, user_id, recipe_id).await? {
            return Err(AppError::Validation(format!(
                "Recipe is already in {}",
                kind.label()
            )));
        }

        self.membership_repo
            .insert(kind, self.id_gen.generate(), user_id, recipe_id)
            .await?;

        Ok(RecipeSummary::from_model(&recipe))
    }

    /// Remove a recipe from the relation. Removing an absent row is an
    /// error, mirroring the duplicate-add rule.
    pub async fn remove(
        &self,
        kind: RelationKind,
        user_id: &str,
        recipe_id: &str,
    ) -> AppResult<()> {
        self.recipe_repo.get_by_id(recipe_id).await?;

        let removed = self.membership_repo.delete(kind, user_id, recipe_id).await?;
        if removed == 0 {
            return Err(AppError::Validation(format!(
                "Recipe is not in {}",
                kind.label()
            )));
        }

        Ok(())
    }
}

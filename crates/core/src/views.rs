//! Read-side projections returned by the API.
//!
//! Views carry viewer-dependent flags (`is_subscribed`, `is_favorited`,
//! `is_in_shopping_cart`) that anonymous requests always see as `false`.

use pantry_db::entities::{recipe, user};
use serde::Serialize;

/// A user as seen by a (possibly anonymous) viewer.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: String,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: Option<String>,
    pub is_subscribed: bool,
}

impl UserView {
    /// Project a user row for a viewer.
    #[must_use]
    pub fn from_model(model: &user::Model, is_subscribed: bool) -> Self {
        Self {
            id: model.id.clone(),
            email: model.email.clone(),
            username: model.username.clone(),
            first_name: model.first_name.clone(),
            last_name: model.last_name.clone(),
            avatar: model.avatar_url.clone(),
            is_subscribed,
        }
    }
}

/// One ingredient line inside a full recipe view.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeIngredientView {
    /// Catalog ingredient ID.
    pub id: String,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// A full recipe projection.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeView {
    pub id: String,
    pub author: UserView,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub ingredients: Vec<RecipeIngredientView>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    /// RFC 3339 timestamp.
    pub created_at: String,
}

/// A compact recipe projection used in membership responses and author
/// listings.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeSummary {
    pub id: String,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl RecipeSummary {
    /// Project a recipe row into its compact form.
    #[must_use]
    pub fn from_model(model: &recipe::Model) -> Self {
        Self {
            id: model.id.clone(),
            name: model.name.clone(),
            image: model.image_url.clone(),
            cooking_time: model.cooking_time,
        }
    }
}

/// An author with a preview of their recipes, returned by subscription
/// endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorView {
    #[serde(flatten)]
    pub user: UserView,
    pub recipes: Vec<RecipeSummary>,
    pub recipes_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_author_view_flattens_user_fields() {
        let user = user::Model {
            id: "u1".to_string(),
            email: "cook@example.com".to_string(),
            username: "cook".to_string(),
            username_lower: "cook".to_string(),
            first_name: "Test".to_string(),
            last_name: "Cook".to_string(),
            avatar_url: None,
            password_hash: "hash".to_string(),
            token: None,
            created_at: Utc::now().into(),
            updated_at: None,
        };

        let view = AuthorView {
            user: UserView::from_model(&user, true),
            recipes: vec![],
            recipes_count: 0,
        };

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["username"], "cook");
        assert_eq!(json["is_subscribed"], true);
        assert_eq!(json["recipes_count"], 0);
    }
}

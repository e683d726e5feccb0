//! Business logic services.
//!
//! Services validate input, enforce domain rules and drive the repositories.
//! They never build queries themselves.

pub mod ingredient;
pub mod membership;
pub mod recipe;
pub mod shopping_list;
pub mod subscription;
pub mod user;

pub use ingredient::IngredientService;
pub use membership::MembershipService;
pub use recipe::{
    CreateRecipeInput, IngredientAmount, RecipeListParams, RecipeService, UpdateRecipeInput,
};
pub use shopping_list::{aggregate, render, ShoppingListLine, ShoppingListService};
pub use subscription::SubscriptionService;
pub use user::{CreateUserInput, SetPasswordInput, UserService};

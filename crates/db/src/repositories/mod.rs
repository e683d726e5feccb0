//! Repository layer.
//!
//! Repositories own all query construction. Services above them never touch
//! the connection directly.

pub mod ingredient;
pub mod membership;
pub mod recipe;
pub mod subscription;
pub mod user;

pub use ingredient::IngredientRepository;
pub use membership::{CartIngredientRow, MembershipRepository, RelationKind};
pub use recipe::{MembershipFilter, RecipeFilter, RecipeIngredientDetail, RecipeRepository};
pub use subscription::SubscriptionRepository;
pub use user::UserRepository;

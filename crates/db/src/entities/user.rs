//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Login identity.
    #[sea_orm(unique)]
    pub email: String,

    pub username: String,

    /// Lowercased username, unique for case-insensitive lookups.
    #[sea_orm(unique)]
    pub username_lower: String,

    pub first_name: String,

    pub last_name: String,

    /// Avatar URL path, relative to the server root.
    #[sea_orm(nullable)]
    pub avatar_url: Option<String>,

    /// Argon2 password hash.
    pub password_hash: String,

    /// Current API token, cleared on logout.
    #[sea_orm(unique, nullable)]
    pub token: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::recipe::Entity")]
    Recipes,
}

impl Related<super::recipe::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Recipes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

//! Ingredient catalog service.

use pantry_common::AppResult;
use pantry_db::{entities::ingredient, repositories::IngredientRepository};

/// Ingredient catalog service: read-only lookups over seeded reference data.
#[derive(Clone)]
pub struct IngredientService {
    ingredient_repo: IngredientRepository,
}

impl IngredientService {
    /// Create a new ingredient service.
    #[must_use]
    pub const fn new(ingredient_repo: IngredientRepository) -> Self {
        Self { ingredient_repo }
    }

    /// Get a catalog entry by ID.
    pub async fn get(&self, id: &str) -> AppResult<ingredient::Model> {
        self.ingredient_repo.get_by_id(id).await
    }

    /// List catalog entries, optionally filtered by a case-insensitive name
    /// prefix. Unpaginated: the catalog is small reference data.
    pub async fn list(&self, name_prefix: Option<&str>) -> AppResult<Vec<ingredient::Model>> {
        self.ingredient_repo
            .search_by_prefix(name_prefix.unwrap_or(""))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pantry_common::AppError;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<ingredient::Model>::new()])
            .into_connection();

        let service = IngredientService::new(IngredientRepository::new(Arc::new(db)));
        let result = service.get("missing").await;

        assert!(matches!(result, Err(AppError::IngredientNotFound(_))));
    }

    #[tokio::test]
    async fn test_list_passes_prefix_through() {
        let flour = ingredient::Model {
            id: "i1".to_string(),
            name: "flour".to_string(),
            measurement_unit: "g".to_string(),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[flour]])
            .into_connection();

        let service = IngredientService::new(IngredientRepository::new(Arc::new(db)));
        let result = service.list(Some("fl")).await.unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "flour");
    }
}

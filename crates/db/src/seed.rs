//! Ingredient catalog seeding.
//!
//! Loads a JSON array of `{name, measurement_unit}` objects into the
//! ingredient table on startup. Re-running is safe: duplicate pairs are
//! skipped.

use std::path::Path;

use crate::repositories::IngredientRepository;
use pantry_common::{AppError, AppResult, IdGenerator};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
struct SeedIngredient {
    name: String,
    measurement_unit: String,
}

/// Load an ingredient seed file and insert its entries, skipping pairs that
/// already exist. Returns the number of entries read from the file.
pub async fn seed_ingredients(repo: &IngredientRepository, path: &Path) -> AppResult<usize> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AppError::Config(format!("failed to read seed file: {e}")))?;

    let entries: Vec<SeedIngredient> = serde_json::from_str(&raw)
        .map_err(|e| AppError::Config(format!("invalid seed file: {e}")))?;

    let id_gen = IdGenerator::new();
    let count = entries.len();
    let models = entries
        .into_iter()
        .map(|entry| crate::entities::ingredient::ActiveModel {
            id: sea_orm::Set(id_gen.generate()),
            name: sea_orm::Set(entry.name),
            measurement_unit: sea_orm::Set(entry.measurement_unit),
        })
        .collect::<Vec<_>>();

    repo.insert_many(models).await?;

    info!(count, path = %path.display(), "Seeded ingredient catalog");
    Ok(count)
}

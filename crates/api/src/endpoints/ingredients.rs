//! Ingredient catalog endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use pantry_common::AppResult;
use pantry_db::entities::ingredient;
use serde::Deserialize;

use crate::middleware::AppState;

/// Catalog filter.
#[derive(Debug, Default, Deserialize)]
pub struct IngredientQuery {
    /// Case-insensitive name prefix.
    pub name: Option<String>,
}

/// List catalog entries, optionally prefix-filtered. Unpaginated.
async fn list(
    State(state): State<AppState>,
    Query(query): Query<IngredientQuery>,
) -> AppResult<Json<Vec<ingredient::Model>>> {
    let items = state.ingredient_service.list(query.name.as_deref()).await?;
    Ok(Json(items))
}

/// A single catalog entry.
async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ingredient::Model>> {
    let item = state.ingredient_service.get(&id).await?;
    Ok(Json(item))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/{id}", get(get_one))
}

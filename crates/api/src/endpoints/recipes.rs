//! Recipe endpoints, including membership toggles and the shopping list
//! download.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::Response,
    routing::{get, post},
};
use pantry_common::AppResult;
use pantry_core::{CreateRecipeInput, RecipeListParams, RecipeView, UpdateRecipeInput};
use pantry_db::repositories::RelationKind;
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::{Page, Paginated, created, no_content, text_attachment},
};

/// Listing filters. Membership flags arrive as `0`/`1` and only apply to
/// authenticated viewers; anything else is ignored.
#[derive(Debug, Default, Deserialize)]
pub struct RecipeFilterQuery {
    pub author: Option<String>,
    pub is_favorited: Option<String>,
    pub is_in_shopping_cart: Option<String>,
}

fn parse_flag(value: Option<&str>) -> Option<bool> {
    match value {
        Some("1" | "true") => Some(true),
        Some("0" | "false") => Some(false),
        _ => None,
    }
}

/// Short link response.
#[derive(Serialize)]
pub struct ShortLinkResponse {
    #[serde(rename = "short-link")]
    pub short_link: String,
}

/// List recipes, newest first.
async fn list(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Query(page): Page,
    Query(filter): Query<RecipeFilterQuery>,
) -> AppResult<Paginated<RecipeView>> {
    let (limit, offset) = page.resolve(&state.config);
    let params = RecipeListParams {
        author_id: filter.author,
        favorited: parse_flag(filter.is_favorited.as_deref()),
        in_cart: parse_flag(filter.is_in_shopping_cart.as_deref()),
        limit,
        offset,
    };

    let (results, count) = state
        .recipe_service
        .list(&params, viewer.as_ref().map(|u| u.id.as_str()))
        .await?;

    Ok(Paginated::new(count, results))
}

/// Create a recipe.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateRecipeInput>,
) -> AppResult<Response> {
    let view = state.recipe_service.create(&user.id, input).await?;
    Ok(created(view))
}

/// Download the caller's aggregated shopping list.
async fn download_shopping_cart(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<Response> {
    let text = state.shopping_list_service.export(&user.id).await?;
    Ok(text_attachment("ingredients.txt", text))
}

/// A single recipe.
async fn get_one(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<RecipeView>> {
    let view = state
        .recipe_service
        .get(&id, viewer.as_ref().map(|u| u.id.as_str()))
        .await?;

    Ok(Json(view))
}

/// Update a recipe (author only).
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateRecipeInput>,
) -> AppResult<Json<RecipeView>> {
    let view = state.recipe_service.update(&user.id, &id, input).await?;
    Ok(Json(view))
}

/// Delete a recipe (author only).
async fn delete_one(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    state.recipe_service.delete(&user.id, &id).await?;
    Ok(no_content())
}

/// Generate a share link.
async fn get_link(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ShortLinkResponse>> {
    let short_link = state.recipe_service.short_link(&id).await?;
    Ok(Json(ShortLinkResponse { short_link }))
}

/// Add a recipe to the caller's favorites.
async fn favorite(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let summary = state
        .membership_service
        .add(RelationKind::Favorite, &user.id, &id)
        .await?;

    Ok(created(summary))
}

/// Remove a recipe from the caller's favorites.
async fn unfavorite(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    state
        .membership_service
        .remove(RelationKind::Favorite, &user.id, &id)
        .await?;

    Ok(no_content())
}

/// Add a recipe to the caller's shopping cart.
async fn add_to_cart(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let summary = state
        .membership_service
        .add(RelationKind::ShoppingCart, &user.id, &id)
        .await?;

    Ok(created(summary))
}

/// Remove a recipe from the caller's shopping cart.
async fn remove_from_cart(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    state
        .membership_service
        .remove(RelationKind::ShoppingCart, &user.id, &id)
        .await?;

    Ok(no_content())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/download_shopping_cart", get(download_shopping_cart))
        .route(
            "/{id}",
            get(get_one).put(update).patch(update).delete(delete_one),
        )
        .route("/{id}/get-link", get(get_link))
        .route("/{id}/favorite", post(favorite).delete(unfavorite))
        .route(
            "/{id}/shopping_cart",
            post(add_to_cart).delete(remove_from_cart),
        )
}

//! User and subscription endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::Response,
    routing::{get, post, put},
};
use pantry_common::AppResult;
use pantry_core::{AuthorView, CreateUserInput, SetPasswordInput, UserView};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::{Page, Paginated, created, no_content},
};

/// Registration response: the created account without viewer-dependent
/// fields.
#[derive(Serialize)]
pub struct RegisterResponse {
    pub id: String,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

/// Avatar update request.
#[derive(Debug, Deserialize)]
pub struct AvatarRequest {
    /// Base64 data URL.
    pub avatar: String,
}

/// Avatar update response.
#[derive(Serialize)]
pub struct AvatarResponse {
    pub avatar: String,
}

/// Recipe preview truncation for subscription payloads. Carried as a raw
/// string so that a non-numeric value is ignored rather than rejected.
#[derive(Debug, Default, Deserialize)]
pub struct RecipesLimitQuery {
    pub recipes_limit: Option<String>,
}

impl RecipesLimitQuery {
    fn parse(&self) -> Option<u64> {
        self.recipes_limit.as_deref().and_then(|v| v.parse().ok())
    }
}

/// List users, ordered by email.
async fn list(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Query(page): Page,
) -> AppResult<Paginated<UserView>> {
    let (limit, offset) = page.resolve(&state.config);
    let (users, count) = state.user_service.list(limit, offset).await?;
    let results = state
        .user_service
        .views(&users, viewer.as_ref().map(|u| u.id.as_str()))
        .await?;

    Ok(Paginated::new(count, results))
}

/// Register a new user.
async fn register(
    State(state): State<AppState>,
    Json(input): Json<CreateUserInput>,
) -> AppResult<Response> {
    let user = state.user_service.register(input).await?;

    Ok(created(RegisterResponse {
        id: user.id,
        email: user.email,
        username: user.username,
        first_name: user.first_name,
        last_name: user.last_name,
    }))
}

/// The caller's own profile.
async fn me(AuthUser(user): AuthUser, State(state): State<AppState>) -> AppResult<Json<UserView>> {
    let view = state.user_service.view(&user, Some(&user.id)).await?;
    Ok(Json(view))
}

/// Change the caller's password.
async fn set_password(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<SetPasswordInput>,
) -> AppResult<Response> {
    state.user_service.set_password(&user.id, input).await?;
    Ok(no_content())
}

/// Set the caller's avatar.
async fn set_avatar(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<AvatarRequest>,
) -> AppResult<Json<AvatarResponse>> {
    let avatar = state.user_service.set_avatar(&user.id, &req.avatar).await?;
    Ok(Json(AvatarResponse { avatar }))
}

/// Remove the caller's avatar.
async fn delete_avatar(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<Response> {
    state.user_service.delete_avatar(&user.id).await?;
    Ok(no_content())
}

/// The authors the caller subscribes to, each with a recipe preview.
async fn subscriptions(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(page): Page,
    Query(recipes_limit): Query<RecipesLimitQuery>,
) -> AppResult<Paginated<AuthorView>> {
    let (limit, offset) = page.resolve(&state.config);
    let (results, count) = state
        .subscription_service
        .subscriptions(&user.id, limit, offset, recipes_limit.parse())
        .await?;

    Ok(Paginated::new(count, results))
}

/// A user's public profile.
async fn get_one(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<UserView>> {
    let user = state.user_service.get(&id).await?;
    let view = state
        .user_service
        .view(&user, viewer.as_ref().map(|u| u.id.as_str()))
        .await?;

    Ok(Json(view))
}

/// Subscribe to an author.
async fn subscribe(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(recipes_limit): Query<RecipesLimitQuery>,
) -> AppResult<Response> {
    let author = state
        .subscription_service
        .subscribe(&user.id, &id, recipes_limit.parse())
        .await?;

    Ok(created(author))
}

/// Unsubscribe from an author.
async fn unsubscribe(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    state.subscription_service.unsubscribe(&user.id, &id).await?;
    Ok(no_content())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(register))
        .route("/me", get(me))
        .route("/set_password", post(set_password))
        .route("/me/avatar", put(set_avatar).delete(delete_avatar))
        .route("/subscriptions", get(subscriptions))
        .route("/{id}", get(get_one))
        .route("/{id}/subscribe", post(subscribe).delete(unsubscribe))
}

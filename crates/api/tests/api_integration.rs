//! API integration tests.
//!
//! These tests exercise the router against mock-backed state: routing shape,
//! authentication requirements and error statuses.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use pantry_api::{AppState, auth_middleware, router as api_router};
use pantry_common::{Config, LocalStorage, StorageBackend};
use pantry_core::{
    IngredientService, MembershipService, RecipeService, ShoppingListService, SubscriptionService,
    UserService,
};
use pantry_db::repositories::{
    IngredientRepository, MembershipRepository, RecipeRepository, SubscriptionRepository,
    UserRepository,
};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
use std::sync::Arc;
use tower::{Layer, ServiceExt};
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Create a mock database connection.
fn create_mock_db() -> DatabaseConnection {
    MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        .into_connection()
}

/// Create test app state with mock database.
fn create_test_state() -> AppState {
    let db = Arc::new(create_mock_db());
    let config = Arc::new(Config::for_tests());

    let storage: Arc<dyn StorageBackend> = Arc::new(LocalStorage::new(
        std::env::temp_dir().join("pantry-api-tests"),
        format!("{}/media", config.server.url),
    ));

    let user_repo = UserRepository::new(Arc::clone(&db));
    let ingredient_repo = IngredientRepository::new(Arc::clone(&db));
    let recipe_repo = RecipeRepository::new(Arc::clone(&db));
    let membership_repo = MembershipRepository::new(Arc::clone(&db));
    let subscription_repo = SubscriptionRepository::new(Arc::clone(&db));

    let user_service = UserService::new(
        user_repo.clone(),
        subscription_repo.clone(),
        Arc::clone(&storage),
    );
    let recipe_service = RecipeService::new(
        recipe_repo.clone(),
        ingredient_repo.clone(),
        user_repo.clone(),
        membership_repo.clone(),
        subscription_repo.clone(),
        Arc::clone(&storage),
        &config,
    );
    let ingredient_service = IngredientService::new(ingredient_repo);
    let membership_service = MembershipService::new(membership_repo.clone(), recipe_repo.clone());
    let subscription_service =
        SubscriptionService::new(subscription_repo, user_repo, recipe_repo);
    let shopping_list_service = ShoppingListService::new(membership_repo);

    AppState {
        config,
        user_service,
        recipe_service,
        ingredient_service,
        membership_service,
        subscription_service,
        shopping_list_service,
    }
}

fn create_test_router() -> NormalizePath<Router> {
    let state = create_test_state();
    let router = api_router()
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state);

    // Same trailing-slash normalization the server wraps the router with
    NormalizePathLayer::trim_trailing_slash().layer(router)
}

async fn send(app: NormalizePath<Router>, method: &str, uri: &str, body: Option<&str>) -> StatusCode {
    let mut builder = Request::builder().uri(uri).method(method);
    let body = match body {
        Some(json) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    app.oneshot(builder.body(body).unwrap())
        .await
        .unwrap()
        .status()
}

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let status = send(create_test_router(), "GET", "/nonexistent", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_me_requires_auth() {
    let status = send(create_test_router(), "GET", "/users/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_recipe_requires_auth() {
    let status = send(
        create_test_router(),
        "POST",
        "/recipes/",
        Some(r#"{"name":"x","text":"y","cooking_time":1,"image":"","ingredients":[]}"#),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_favorite_requires_auth() {
    let status = send(create_test_router(), "POST", "/recipes/r1/favorite", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_shopping_cart_download_requires_auth() {
    let status = send(
        create_test_router(),
        "GET",
        "/recipes/download_shopping_cart",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_subscriptions_require_auth() {
    let status = send(create_test_router(), "GET", "/users/subscriptions", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let status = send(create_test_router(), "POST", "/users/u1/subscribe", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_requires_auth() {
    let status = send(create_test_router(), "POST", "/auth/token/logout", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_invalid_token_is_anonymous() {
    let state = create_test_state();
    let app = api_router()
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/users/me")
                .method("GET")
                .header("Authorization", "Token bogus")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // The mock DB resolves no user, so the request stays anonymous
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_with_invalid_json_returns_error() {
    let status = send(
        create_test_router(),
        "POST",
        "/auth/token/login",
        Some("invalid json"),
    )
    .await;

    assert!(
        status == StatusCode::BAD_REQUEST || status == StatusCode::UNPROCESSABLE_ENTITY
    );
}

#[tokio::test]
async fn test_ingredients_list_is_public() {
    let status = send(create_test_router(), "GET", "/ingredients/", None).await;
    // Mock DB returns no rows prepared for this query; anything but 401 shows
    // the route is reachable anonymously
    assert_ne!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_recipe_list_is_public() {
    let status = send(create_test_router(), "GET", "/recipes/", None).await;
    assert_ne!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_trailing_slash_routes_match() {
    let status = send(create_test_router(), "GET", "/users/", None).await;
    assert_ne!(status, StatusCode::NOT_FOUND);

    let status = send(create_test_router(), "GET", "/ingredients/", None).await;
    assert_ne!(status, StatusCode::NOT_FOUND);

    let status = send(
        create_test_router(),
        "POST",
        "/recipes/r1/favorite/",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let status = send(
        create_test_router(),
        "GET",
        "/recipes/download_shopping_cart/",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

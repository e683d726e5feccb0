//! API middleware.

use std::sync::Arc;

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use pantry_common::Config;
use pantry_core::{
    IngredientService, MembershipService, RecipeService, ShoppingListService, SubscriptionService,
    UserService,
};

/// Application state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub user_service: UserService,
    pub recipe_service: RecipeService,
    pub ingredient_service: IngredientService,
    pub membership_service: MembershipService,
    pub subscription_service: SubscriptionService,
    pub shopping_list_service: ShoppingListService,
}

/// Authentication middleware.
///
/// Accepts `Authorization: Token <token>` and `Authorization: Bearer <token>`
/// and stows the resolved user in request extensions. Requests without a
/// valid token proceed anonymously; handlers that need an identity reject
/// them through the `AuthUser` extractor.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str
            .strip_prefix("Token ")
            .or_else(|| auth_str.strip_prefix("Bearer "))
        && let Ok(user) = state.user_service.authenticate_by_token(token).await
    {
        req.extensions_mut().insert(user);
    }

    next.run(req).await
}

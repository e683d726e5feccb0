//! API endpoints.

mod auth;
mod ingredients;
mod recipes;
mod users;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router. The server nests this under `/api`.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/recipes", recipes::router())
        .nest("/ingredients", ingredients::router())
}

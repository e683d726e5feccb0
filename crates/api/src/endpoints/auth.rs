//! Token authentication endpoints.

use axum::{Json, Router, extract::State, response::Response, routing::post};
use pantry_common::AppResult;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::no_content};

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response.
#[derive(Serialize)]
pub struct LoginResponse {
    pub auth_token: String,
}

/// Exchange credentials for an API token.
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let auth_token = state.user_service.login(&req.email, &req.password).await?;
    Ok(Json(LoginResponse { auth_token }))
}

/// Invalidate the caller's token.
async fn logout(AuthUser(user): AuthUser, State(state): State<AppState>) -> AppResult<Response> {
    state.user_service.logout(&user.id).await?;
    Ok(no_content())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/token/login", post(login))
        .route("/token/logout", post(logout))
}

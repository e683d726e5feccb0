//! HTTP API layer for pantry.
//!
//! This crate provides the REST API:
//!
//! - **Endpoints**: users, auth, recipes, ingredients, subscriptions
//! - **Extractors**: required and optional token authentication
//! - **Middleware**: token resolution, shared application state
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{auth_middleware, AppState};

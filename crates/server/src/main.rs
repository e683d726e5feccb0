//! Pantry server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, ServiceExt, extract::Request, middleware};
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
use tokio::signal;
use tower::Layer;
use tower_http::{
    cors::{Any, CorsLayer},
    normalize_path::NormalizePathLayer,
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pantry=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting pantry server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = pantry_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    pantry_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let ingredient_repo = IngredientRepository::new(Arc::clone(&db));
    let recipe_repo = RecipeRepository::new(Arc::clone(&db));
    let membership_repo = MembershipRepository::new(Arc::clone(&db));
    let subscription_repo = SubscriptionRepository::new(Arc::clone(&db));

    // Seed the ingredient catalog on first start
    if let Some(ref seed_path) = config.database.ingredient_seed {
        pantry_db::seed::seed_ingredients(&ingredient_repo, seed_path).await?;
    }

    // Media storage serves uploaded images as absolute URLs
    let media_base_url = format!(
        "{}{}",
        config.server.url.trim_end_matches('/'),
        config.storage.base_url
    );
    let storage: Arc<dyn StorageBackend> = Arc::new(LocalStorage::new(
        config.storage.base_path.clone(),
        media_base_url,
    ));

    // Initialize services
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
    let subscription_service = SubscriptionService::new(subscription_repo, user_repo, recipe_repo);
    let shopping_list_service = ShoppingListService::new(membership_repo);

    let media_dir = config.storage.base_path.clone();
    let media_route = config.storage.base_url.clone();

    // Create app state
    let state = AppState {
        config: Arc::new(config.clone()),
        user_service,
        recipe_service,
        ingredient_service,
        membership_service,
        subscription_service,
        shopping_list_service,
    };

    // Build router
    let app = Router::new()
        .nest("/api", api_router())
        .nest_service(&media_route, ServeDir::new(media_dir))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Clients may send collection URLs with a trailing slash
    let app = NormalizePathLayer::trim_trailing_slash().layer(app);

    // Start server with graceful shutdown
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

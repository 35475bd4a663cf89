mod handlers;

use std::path::Path;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::db::Database;

pub fn create_router(db: Database) -> Router {
    let api = Router::new()
        // Dashboard
        .route("/dashboard", get(handlers::dashboard))
        // Exercises
        .route(
            "/exercises",
            get(handlers::list_exercises).post(handlers::create_exercise),
        )
        .route(
            "/exercises/{id}",
            get(handlers::get_exercise)
                .put(handlers::update_exercise)
                .delete(handlers::delete_exercise),
        )
        .route("/exercises/{id}/review", post(handlers::review_exercise))
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(db)
}

/// Serve files under `dir` for any path the API does not handle.
pub fn with_static_dir(router: Router, dir: &Path) -> Router {
    router.fallback_service(ServeDir::new(dir))
}

use std::sync::Arc;

use axum::{routing::get, Router};

use gamification_cell::router::progress_routes;
use scheduling_cell::router::schedule_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "NutriCoach API is running!" }))
        .nest("/schedule", schedule_routes(state.clone()))
        .nest("/progress", progress_routes(state.clone()))
}

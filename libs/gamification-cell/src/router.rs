// libs/gamification-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn progress_routes(state: Arc<AppConfig>) -> Router {
    // All progress operations require authentication
    let protected_routes = Router::new()
        .route("/hydration", get(handlers::get_hydration))
        .route("/hydration", post(handlers::record_hydration))
        .route("/daily-tasks", post(handlers::record_daily_tasks))
        .route("/pins", get(handlers::get_pins))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new().merge(protected_routes).with_state(state)
}

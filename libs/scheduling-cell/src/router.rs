// libs/scheduling-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn schedule_routes(state: Arc<AppConfig>) -> Router {
    // All scheduling operations require authentication
    let protected_routes = Router::new()
        .route("/availability", get(handlers::list_availability))
        .route("/availability/{date}", put(handlers::upsert_availability))
        .route("/slots", get(handlers::get_bookable_slots))
        .route("/month", get(handlers::get_month_overview))
        .route("/appointments", post(handlers::book_slot))
        .route("/appointments", get(handlers::list_appointments))
        .route("/appointments/{appointment_id}", delete(handlers::cancel_appointment))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new().merge(protected_routes).with_state(state)
}

// libs/gamification-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use chrono::NaiveDate;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{ProgressError, RecordDailyTasksRequest, RecordHydrationRequest};
use crate::services::progress::ProgressService;
use crate::services::tiers::TierTable;

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct HydrationQuery {
    pub day: NaiveDate,
    /// Admin-only override to inspect another patient's state.
    pub patient_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct PinsQuery {
    pub patient_id: Option<Uuid>,
}

fn map_progress_error(e: ProgressError) -> AppError {
    match e {
        ProgressError::StateFetchFailed(_) => {
            AppError::ExternalService("Could not load progress, please retry".to_string())
        }
        ProgressError::ValidationError(msg) => AppError::BadRequest(msg),
        ProgressError::DatabaseError(msg) => AppError::Database(msg),
    }
}

/// Resolve which patient the caller may act on: patients act on themselves,
/// the nutritionist may name any patient.
fn resolve_patient(user: &User, requested: Option<Uuid>) -> Result<Uuid, AppError> {
    let own_id = Uuid::parse_str(&user.id)
        .map_err(|_| AppError::Auth("Invalid user id in session".to_string()))?;

    match requested {
        None => Ok(own_id),
        Some(id) if id == own_id || user.is_admin() => Ok(id),
        Some(_) => Err(AppError::Auth(
            "Not authorized to access this patient's progress".to_string(),
        )),
    }
}

// ==============================================================================
// HYDRATION HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_hydration(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<HydrationQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let patient_id = resolve_patient(&user, query.patient_id)?;

    let service = ProgressService::new(&state);
    let hydration = service
        .get_hydration_state(patient_id, query.day, auth.token())
        .await
        .map_err(map_progress_error)?;

    Ok(Json(json!({ "hydration": hydration })))
}

#[axum::debug_handler]
pub async fn record_hydration(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<RecordHydrationRequest>,
) -> Result<Json<Value>, AppError> {
    resolve_patient(&user, Some(request.patient_id))?;

    let service = ProgressService::new(&state);
    let response = service
        .record_intake(request, auth.token())
        .await
        .map_err(map_progress_error)?;

    Ok(Json(json!({
        "success": true,
        "hydration": response,
    })))
}

// ==============================================================================
// DAILY TASK HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn record_daily_tasks(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<RecordDailyTasksRequest>,
) -> Result<Json<Value>, AppError> {
    resolve_patient(&user, Some(request.patient_id))?;

    let service = ProgressService::new(&state);
    let response = service
        .record_daily_tasks(request, auth.token())
        .await
        .map_err(map_progress_error)?;

    Ok(Json(json!({
        "success": true,
        "daily_tasks": response,
    })))
}

// ==============================================================================
// PIN HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_pins(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<PinsQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let patient_id = resolve_patient(&user, query.patient_id)?;

    let service = ProgressService::new(&state);
    let counters = service
        .get_counters(patient_id, auth.token())
        .await
        .map_err(map_progress_error)?;

    let hydration_tier = TierTable::hydration().highest_for(counters.total_goal_met_days);
    let task_tier = TierTable::tasks().highest_for(counters.total_task_tiers_completed);

    Ok(Json(json!({
        "counters": counters,
        "current_hydration_tier": {
            "name": hydration_tier.name,
            "image": hydration_tier.image,
        },
        "current_task_tier": {
            "name": task_tier.name,
            "image": task_tier.image,
        },
    })))
}

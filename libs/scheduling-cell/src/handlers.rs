// libs/scheduling-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use chrono::{NaiveDate, Utc};
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    AvailabilityWindow, BookSlotRequest, ScheduleError, UpsertAvailabilityRequest,
};
use crate::services::availability::AvailabilityService;
use crate::services::booking::BookingService;

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    pub year: i32,
    pub month: u32,
}

fn map_schedule_error(e: ScheduleError) -> AppError {
    match e {
        ScheduleError::SlotAlreadyBooked => {
            AppError::Conflict("This slot has just been booked by someone else".to_string())
        }
        ScheduleError::InvalidSlotSelection => {
            AppError::Conflict("This slot is no longer available".to_string())
        }
        ScheduleError::AvailabilityFetchFailed(_) | ScheduleError::AppointmentFetchFailed(_) => {
            AppError::ExternalService("Could not load schedule, please retry".to_string())
        }
        ScheduleError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        ScheduleError::InvalidTime(msg) => AppError::BadRequest(msg),
        ScheduleError::ValidationError(msg) => AppError::BadRequest(msg),
        ScheduleError::DatabaseError(msg) => AppError::Database(msg),
    }
}

// ==============================================================================
// AVAILABILITY HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_availability(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let service = AvailabilityService::new(&state);

    let windows = service
        .list_availability(auth.token())
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(json!({ "availability": windows })))
}

/// Nutritionist upsert of the declared time set for one date. An empty time
/// set clears the date.
#[axum::debug_handler]
pub async fn upsert_availability(
    State(state): State<Arc<AppConfig>>,
    Path(date): Path<NaiveDate>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpsertAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    if !user.is_admin() {
        return Err(AppError::Auth(
            "Only the nutritionist can manage availability".to_string(),
        ));
    }

    let service = AvailabilityService::new(&state);
    let window = service
        .upsert_availability(
            AvailabilityWindow {
                date,
                times: request.times,
            },
            auth.token(),
        )
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(json!({
        "success": true,
        "availability": window,
    })))
}

// ==============================================================================
// SLOT AND MONTH HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_bookable_slots(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<SlotsQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&state);

    let slots = service
        .bookable_slots(query.date, Utc::now(), auth.token())
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(json!({
        "date": query.date,
        "slots": slots,
    })))
}

#[axum::debug_handler]
pub async fn get_month_overview(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<MonthQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&state);

    let days = service
        .month_overview(query.year, query.month, Utc::now(), auth.token())
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(json!({
        "year": query.year,
        "month": query.month,
        "days": days,
    })))
}

// ==============================================================================
// APPOINTMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_slot(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<BookSlotRequest>,
) -> Result<Json<Value>, AppError> {
    // A patient can only book for themselves; the nutritionist can book on
    // a patient's behalf.
    if !user.is_patient(&request.patient_id) && !user.is_admin() {
        return Err(AppError::Auth(
            "Not authorized to book for this patient".to_string(),
        ));
    }

    let service = BookingService::new(&state);
    let appointment = service
        .confirm_booking(request, Utc::now(), auth.token())
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment booked successfully",
    })))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&state);

    // Patients see their own bookings; the nutritionist sees everything.
    let patient_filter = if user.is_admin() {
        None
    } else {
        let id = Uuid::parse_str(&user.id)
            .map_err(|_| AppError::Auth("Invalid user id in session".to_string()))?;
        Some(id)
    };

    let appointments = service
        .list_appointments(patient_filter, None, None, auth.token())
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(json!({ "appointments": appointments })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    if !user.is_admin() {
        return Err(AppError::Auth(
            "Only the nutritionist can cancel appointments".to_string(),
        ));
    }

    let service = BookingService::new(&state);
    service
        .cancel_appointment(appointment_id, auth.token())
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment cancelled",
    })))
}

// libs/scheduling-cell/src/services/booking.rs
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{Appointment, AppointmentStatus, BookSlotRequest, MonthDay, ScheduleError};
use crate::services::availability::AvailabilityService;
use crate::services::slots;

pub struct BookingService {
    supabase: SupabaseClient,
    availability_service: AvailabilityService,
    slot_duration_minutes: i32,
}

impl BookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            availability_service: AvailabilityService::new(config),
            slot_duration_minutes: config.slot_duration_minutes,
        }
    }

    /// All confirmed appointments, ascending by start time. Cancelled rows
    /// are deleted by the nutritionist and never show up here.
    pub async fn list_appointments(
        &self,
        patient_id: Option<Uuid>,
        from_date: Option<DateTime<Utc>>,
        to_date: Option<DateTime<Utc>>,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, ScheduleError> {
        debug!("Fetching appointments (patient filter: {:?})", patient_id);

        let mut path =
            "/rest/v1/appointments?status=eq.confirmed&order=start_time.asc".to_string();
        if let Some(patient_id) = patient_id {
            path.push_str(&format!("&patient_id=eq.{}", patient_id));
        }
        if let Some(from_date) = from_date {
            // URL-encoded RFC3339 format for PostgREST comparison filters
            let date_str = from_date.to_rfc3339();
            path.push_str(&format!("&start_time=gte.{}", urlencoding::encode(&date_str)));
        }
        if let Some(to_date) = to_date {
            let date_str = to_date.to_rfc3339();
            path.push_str(&format!("&start_time=lte.{}", urlencoding::encode(&date_str)));
        }

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| ScheduleError::AppointmentFetchFailed(e.to_string()))?;

        let appointments: Vec<Appointment> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Appointment>, _>>()
            .map_err(|e| {
                ScheduleError::AppointmentFetchFailed(format!(
                    "Failed to parse appointments: {}",
                    e
                ))
            })?;

        Ok(appointments)
    }

    /// Bookable start times for one date, computed fresh from the latest
    /// availability and booking state.
    pub async fn bookable_slots(
        &self,
        date: NaiveDate,
        now: DateTime<Utc>,
        auth_token: &str,
    ) -> Result<Vec<chrono::NaiveTime>, ScheduleError> {
        let windows = self.availability_service.list_availability(auth_token).await?;

        let day_start = date.and_hms_opt(0, 0, 0).map(|t| t.and_utc());
        let day_end = date.and_hms_opt(23, 59, 59).map(|t| t.and_utc());
        let appointments = self
            .list_appointments(None, day_start, day_end, auth_token)
            .await?;

        Ok(slots::compute_bookable_slots(
            date,
            &windows,
            &appointments,
            now,
        ))
    }

    /// Month grid classification for the scheduling screen.
    pub async fn month_overview(
        &self,
        year: i32,
        month: u32,
        now: DateTime<Utc>,
        auth_token: &str,
    ) -> Result<Vec<MonthDay>, ScheduleError> {
        let windows = self.availability_service.list_availability(auth_token).await?;
        let appointments = self.list_appointments(None, None, None, auth_token).await?;

        slots::month_overview(year, month, &windows, &appointments, now)
    }

    /// Book a slot for a patient.
    ///
    /// The local bookable-set check is an optimistic pre-filter for UX; the
    /// store's unique constraint on confirmed start times is the final
    /// arbiter. A lost race surfaces as `SlotAlreadyBooked`, after which the
    /// caller re-fetches slots and re-prompts.
    pub async fn confirm_booking(
        &self,
        request: BookSlotRequest,
        now: DateTime<Utc>,
        auth_token: &str,
    ) -> Result<Appointment, ScheduleError> {
        info!(
            "Booking slot {} for patient {}",
            request.start_time, request.patient_id
        );

        if request.start_time <= now {
            return Err(ScheduleError::InvalidTime(
                "Slot start time must be in the future".to_string(),
            ));
        }
        if request.patient_name.trim().is_empty() {
            return Err(ScheduleError::ValidationError(
                "Patient name is required".to_string(),
            ));
        }

        // Optimistic pre-check against the latest known state.
        let windows = self.availability_service.list_availability(auth_token).await?;
        let appointments = self.list_appointments(None, None, None, auth_token).await?;

        let date = request.start_time.date_naive();
        let bookable = slots::compute_bookable_slots(date, &windows, &appointments, now);

        let requested_time = request.start_time.time();
        let is_bookable = bookable.iter().any(|slot| {
            use chrono::Timelike;
            slot.hour() == requested_time.hour() && slot.minute() == requested_time.minute()
        });

        if !is_bookable {
            warn!(
                "Stale slot selection: {} not in bookable set for {}",
                request.start_time, date
            );
            return Err(ScheduleError::InvalidSlotSelection);
        }

        self.insert_appointment(request, auth_token).await
    }

    /// Nutritionist-initiated cancellation. Deleting the row frees the slot
    /// for subsequent bookable-slot computations.
    pub async fn cancel_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<(), ScheduleError> {
        debug!("Cancelling appointment {}", appointment_id);

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        self.supabase
            .delete(&path, Some(auth_token))
            .await
            .map_err(|e| ScheduleError::DatabaseError(e.to_string()))?;

        info!("Appointment {} cancelled", appointment_id);
        Ok(())
    }

    /// Submit the insert. The appointments table carries a unique constraint
    /// on `start_time` among confirmed rows; a 409 from the store means
    /// another patient won the race.
    async fn insert_appointment(
        &self,
        request: BookSlotRequest,
        auth_token: &str,
    ) -> Result<Appointment, ScheduleError> {
        let appointment_data = json!({
            "patient_id": request.patient_id,
            "patient_name": request.patient_name,
            "patient_email": request.patient_email,
            "start_time": request.start_time.to_rfc3339(),
            "duration_minutes": self.slot_duration_minutes,
            "status": AppointmentStatus::Confirmed.to_string(),
            "created_at": Utc::now().to_rfc3339(),
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                Some(auth_token),
                Some(appointment_data),
                Some(headers),
            )
            .await
            .map_err(|e| {
                if e.is_conflict() {
                    warn!("Slot race lost at {}", request.start_time);
                    ScheduleError::SlotAlreadyBooked
                } else {
                    ScheduleError::DatabaseError(e.to_string())
                }
            })?;

        if result.is_empty() {
            return Err(ScheduleError::DatabaseError(
                "Failed to create appointment".to_string(),
            ));
        }

        let appointment: Appointment = serde_json::from_value(result[0].clone())
            .map_err(|e| {
                ScheduleError::DatabaseError(format!("Failed to parse created appointment: {}", e))
            })?;

        info!(
            "Appointment {} booked at {}",
            appointment.id, appointment.start_time
        );
        Ok(appointment)
    }
}
